//! Cabinet drill-down: zone → shelf row → items on that shelf.
//!
//! State machine:
//!
//! ```text
//! Closed ──open(zone)──▶ Open { row: default, phase: Loading | Idle }
//! Open ──select_row(r)──▶ Open { row: r, phase: Loading }
//! Loading ──ok, rows──▶ Loaded      Loading ──ok, none──▶ Empty
//! Loading ──err──▶ Failed (logged + notice, no retry)
//! any ──close()──▶ Closed (row and items discarded)
//! ```
//!
//! Every transition that issues a query bumps a generation counter; a reply
//! that comes back under an older generation (row changed, zone changed,
//! modal closed) is dropped.

use std::sync::{Arc, Mutex};

use pharmloc_core::{DomainError, DomainResult, ItemId, SectionCode, ShelfRow, find_by_id};
use pharmloc_gateway::{InventoryGateway, SelectQuery};
use pharmloc_inventory::InventoryRecord;

use crate::config::DrillDownConfig;
use crate::lock;
use crate::modal::RecordModal;
use crate::notify::Notifier;
use crate::view::{CabinetBody, CabinetView, GridCard, empty_row_message, row_options};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load items";
pub const PICK_ROW_MESSAGE: &str = "Select a row to view items";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillDownPhase {
    /// Open but no row chosen yet.
    Idle,
    Loading,
    Loaded(Vec<InventoryRecord>),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillDownState {
    Closed,
    Open {
        zone: SectionCode,
        row: Option<ShelfRow>,
        phase: DrillDownPhase,
    },
}

#[derive(Debug)]
struct Inner {
    state: DrillDownState,
    generation: u64,
    detail: RecordModal,
}

pub struct CabinetDrillDown {
    gateway: Arc<dyn InventoryGateway>,
    notifier: Arc<dyn Notifier>,
    config: DrillDownConfig,
    inner: Mutex<Inner>,
}

impl core::fmt::Debug for CabinetDrillDown {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CabinetDrillDown")
            .field("config", &self.config)
            .field("inner", &*lock(&self.inner))
            .finish_non_exhaustive()
    }
}

impl CabinetDrillDown {
    pub fn new(
        gateway: Arc<dyn InventoryGateway>,
        notifier: Arc<dyn Notifier>,
        config: DrillDownConfig,
    ) -> Self {
        Self {
            gateway,
            notifier,
            config,
            inner: Mutex::new(Inner {
                state: DrillDownState::Closed,
                generation: 0,
                detail: RecordModal::default(),
            }),
        }
    }

    pub fn state(&self) -> DrillDownState {
        lock(&self.inner).state.clone()
    }

    pub fn is_open(&self) -> bool {
        !matches!(lock(&self.inner).state, DrillDownState::Closed)
    }

    pub fn zone(&self) -> Option<SectionCode> {
        match &lock(&self.inner).state {
            DrillDownState::Open { zone, .. } => Some(zone.clone()),
            DrillDownState::Closed => None,
        }
    }

    pub fn selected_row(&self) -> Option<ShelfRow> {
        match &lock(&self.inner).state {
            DrillDownState::Open { row, .. } => *row,
            DrillDownState::Closed => None,
        }
    }

    /// Items of the loaded shelf; empty in every other phase.
    pub fn items(&self) -> Vec<InventoryRecord> {
        match &lock(&self.inner).state {
            DrillDownState::Open {
                phase: DrillDownPhase::Loaded(items),
                ..
            } => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Open on `zone`. Re-opening the zone already shown is a no-op.
    pub async fn open(&self, zone: SectionCode) {
        let request = {
            let mut inner = lock(&self.inner);
            if let DrillDownState::Open { zone: current, .. } = &inner.state {
                if *current == zone {
                    return;
                }
            }

            let row = self.config.default_row;
            inner.generation += 1;
            inner.detail = RecordModal::default();
            inner.state = DrillDownState::Open {
                zone: zone.clone(),
                row,
                phase: if row.is_some() {
                    DrillDownPhase::Loading
                } else {
                    DrillDownPhase::Idle
                },
            };
            tracing::debug!(zone = %zone, row = ?row, "cabinet opened");
            row.map(|row| (inner.generation, zone, row))
        };

        if let Some((generation, zone, row)) = request {
            self.fetch(generation, zone, row).await;
        }
    }

    /// Pick a shelf row and load it.
    ///
    /// Choosing the row that is already loaded (or loading) does nothing;
    /// choosing it again after a failure retries.
    pub async fn select_row(&self, row: ShelfRow) -> DomainResult<()> {
        let request = {
            let mut guard = lock(&self.inner);
            let inner = &mut *guard;
            let generation = inner.generation + 1;
            match &mut inner.state {
                DrillDownState::Closed => {
                    return Err(DomainError::validation("no cabinet is open"));
                }
                DrillDownState::Open {
                    zone,
                    row: current,
                    phase,
                } => {
                    let settled = matches!(
                        phase,
                        DrillDownPhase::Loading | DrillDownPhase::Loaded(_) | DrillDownPhase::Empty
                    );
                    if *current == Some(row) && settled {
                        return Ok(());
                    }
                    *current = Some(row);
                    *phase = DrillDownPhase::Loading;
                    let zone = zone.clone();
                    inner.generation = generation;
                    tracing::debug!(zone = %zone, row = %row, "cabinet row selected");
                    (generation, zone, row)
                }
            }
        };

        let (generation, zone, row) = request;
        self.fetch(generation, zone, row).await;
        Ok(())
    }

    /// Close the modal; the next open starts from scratch.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.state = DrillDownState::Closed;
        inner.detail = RecordModal::default();
        tracing::debug!("cabinet closed");
    }

    /// Show the read-only detail view for one loaded item.
    pub fn open_detail(&self, id: &ItemId) -> DomainResult<()> {
        let mut inner = lock(&self.inner);
        let record = match &inner.state {
            DrillDownState::Open {
                phase: DrillDownPhase::Loaded(items),
                ..
            } => find_by_id(items, id).cloned(),
            _ => None,
        };
        let record = record.ok_or_else(|| DomainError::not_found(format!("item {id} is not on this shelf")))?;
        inner.detail.open(record);
        Ok(())
    }

    pub fn close_detail(&self) {
        lock(&self.inner).detail.close();
    }

    pub fn detail(&self) -> RecordModal {
        lock(&self.inner).detail.clone()
    }

    /// The modal as it should be drawn. `None` while closed.
    pub fn view(&self) -> Option<CabinetView> {
        let inner = lock(&self.inner);
        let DrillDownState::Open { zone, row, phase } = &inner.state else {
            return None;
        };

        let body = match (phase, row) {
            (DrillDownPhase::Idle, _) | (_, None) => CabinetBody::Prompt {
                message: PICK_ROW_MESSAGE.to_string(),
            },
            (DrillDownPhase::Loading, _) => CabinetBody::Loading,
            (DrillDownPhase::Loaded(items), _) => CabinetBody::Items {
                cards: items.iter().map(GridCard::from).collect(),
            },
            (DrillDownPhase::Empty | DrillDownPhase::Failed(_), Some(row)) => CabinetBody::Empty {
                message: empty_row_message(*row),
            },
        };

        Some(CabinetView {
            title: format!("Cabinet {zone}"),
            rows: row_options(*row),
            body,
        })
    }

    async fn fetch(&self, generation: u64, zone: SectionCode, row: ShelfRow) {
        let query = SelectQuery::shelf(&self.config.table, &zone, row);
        let result = self.gateway.select(&query).await;

        let failed = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                tracing::debug!(zone = %zone, row = %row, "discarding stale shelf response");
                return;
            }
            let DrillDownState::Open { phase, .. } = &mut inner.state else {
                return;
            };

            match result {
                Ok(items) if items.is_empty() => {
                    *phase = DrillDownPhase::Empty;
                    false
                }
                Ok(items) => {
                    tracing::debug!(zone = %zone, row = %row, count = items.len(), "shelf loaded");
                    *phase = DrillDownPhase::Loaded(items);
                    false
                }
                Err(err) => {
                    tracing::error!(zone = %zone, row = %row, error = %err, "failed to load shelf");
                    *phase = DrillDownPhase::Failed(err.to_string());
                    true
                }
            }
        };

        if failed {
            self.notifier.error(LOAD_FAILED_MESSAGE);
        }
    }
}
