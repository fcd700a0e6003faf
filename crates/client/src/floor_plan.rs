//! Floor-plan zone map.
//!
//! Draws nothing itself: it hands out overlay rectangles for the host to
//! place over the floor-plan image and routes clicks into the cabinet
//! drill-down.

use std::sync::Mutex;

use serde::Serialize;

use pharmloc_core::{DomainError, DomainResult, SectionCode};
use pharmloc_inventory::{FloorPlan, ZoneRect};

use crate::cabinet::CabinetDrillDown;
use crate::lock;

/// One clickable rectangle over the floor-plan image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneOverlay {
    pub id: SectionCode,
    pub rect: ZoneRect,
    /// Hover tooltip.
    pub title: String,
    pub selected: bool,
}

#[derive(Debug)]
pub struct FloorPlanController {
    plan: FloorPlan,
    selected: Mutex<Option<SectionCode>>,
    cabinet: CabinetDrillDown,
}

impl FloorPlanController {
    pub fn new(plan: FloorPlan, cabinet: CabinetDrillDown) -> Self {
        Self {
            plan,
            selected: Mutex::new(None),
            cabinet,
        }
    }

    pub fn plan(&self) -> &FloorPlan {
        &self.plan
    }

    pub fn cabinet(&self) -> &CabinetDrillDown {
        &self.cabinet
    }

    pub fn selected(&self) -> Option<SectionCode> {
        lock(&self.selected).clone()
    }

    /// Select a zone and open its cabinet.
    pub async fn select_zone(&self, id: &SectionCode) -> DomainResult<()> {
        let zone = self
            .plan
            .zone(id)
            .ok_or_else(|| DomainError::not_found(format!("zone {id} is not on the floor plan")))?;

        *lock(&self.selected) = Some(zone.id.clone());
        tracing::info!(zone = %zone.id, group = zone.group.label(), "zone selected");
        self.cabinet.open(zone.id.clone()).await;
        Ok(())
    }

    /// Click at a point given in percentages of the image.
    ///
    /// Returns the zone that was hit, if any. A miss changes nothing.
    pub async fn select_at(&self, x: f32, y: f32) -> DomainResult<Option<SectionCode>> {
        let Some(id) = self.plan.zone_at(x, y).map(|z| z.id.clone()) else {
            return Ok(None);
        };
        self.select_zone(&id).await?;
        Ok(Some(id))
    }

    /// Dismiss the cabinet modal.
    pub fn close(&self) {
        *lock(&self.selected) = None;
        self.cabinet.close();
    }

    pub fn overlays(&self) -> Vec<ZoneOverlay> {
        let selected = self.selected();
        self.plan
            .zones()
            .iter()
            .map(|zone| ZoneOverlay {
                id: zone.id.clone(),
                rect: zone.rect,
                title: zone.title(),
                selected: selected.as_ref() == Some(&zone.id),
            })
            .collect()
    }
}
