//! Floor-plan zones: named rectangles over the pharmacy floor-plan image.

use serde::Serialize;

use pharmloc_core::SectionCode;

/// Background image the zone rectangles are measured against.
pub const FLOOR_PLAN_IMAGE_URL: &str = "https://pfredz-hsgt.github.io/imgres/floor/floorplan.png";

/// Rectangle in percentages of the background image (0.0..=100.0).
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ZoneRect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl ZoneRect {
    pub const fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Hit-test a point given in percentages (`x` from the left, `y` from the top).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

/// Physical grouping of cabinets on the floor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneGroup {
    FrontCounter,
    ControlledDrugs,
    InjectionRack,
    OutpatientRack,
    Fridge,
}

impl ZoneGroup {
    pub fn label(self) -> &'static str {
        match self {
            ZoneGroup::FrontCounter => "Kaunter Depan",
            ZoneGroup::ControlledDrugs => "DDA Cabinet",
            ZoneGroup::InjectionRack => "Rak Ubat Injection",
            ZoneGroup::OutpatientRack => "Rak Ubat OPD",
            ZoneGroup::Fridge => "Fridge Pharmaceutical",
        }
    }
}

/// A clickable region of the floor plan. Immutable once the plan is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDefinition {
    pub id: SectionCode,
    pub group: ZoneGroup,
    pub rect: ZoneRect,
}

impl ZoneDefinition {
    /// Hover tooltip.
    pub fn title(&self) -> String {
        format!("Cabinet {}", self.id)
    }
}

const PHARMACY_ZONES: &[(&str, ZoneGroup, ZoneRect)] = &[
    ("A", ZoneGroup::FrontCounter, ZoneRect::new(24.0, 54.0, 25.5, 5.5)),
    ("B", ZoneGroup::FrontCounter, ZoneRect::new(29.5, 54.0, 25.5, 5.5)),
    ("C", ZoneGroup::FrontCounter, ZoneRect::new(42.8, 50.5, 29.3, 8.5)),
    ("DD", ZoneGroup::ControlledDrugs, ZoneRect::new(53.0, 77.0, 4.0, 10.0)),
    ("H", ZoneGroup::InjectionRack, ZoneRect::new(53.0, 1.5, 13.5, 8.5)),
    ("I", ZoneGroup::InjectionRack, ZoneRect::new(53.0, 15.0, 14.0, 8.5)),
    ("J", ZoneGroup::InjectionRack, ZoneRect::new(53.0, 29.0, 14.0, 8.5)),
    ("K", ZoneGroup::OutpatientRack, ZoneRect::new(90.0, 18.0, 8.5, 8.3)),
    ("G", ZoneGroup::OutpatientRack, ZoneRect::new(90.0, 30.0, 14.5, 8.3)),
    ("F", ZoneGroup::OutpatientRack, ZoneRect::new(90.0, 44.5, 14.5, 8.3)),
    ("E", ZoneGroup::OutpatientRack, ZoneRect::new(90.0, 59.0, 14.5, 8.3)),
    ("D", ZoneGroup::OutpatientRack, ZoneRect::new(90.0, 73.5, 14.0, 8.3)),
    ("Fr", ZoneGroup::Fridge, ZoneRect::new(75.0, 4.5, 7.0, 9.0)),
];

/// The set of zones drawn over one background image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorPlan {
    image_url: String,
    zones: Vec<ZoneDefinition>,
}

impl FloorPlan {
    pub fn new(image_url: impl Into<String>, zones: Vec<ZoneDefinition>) -> Self {
        Self {
            image_url: image_url.into(),
            zones,
        }
    }

    /// The emergency pharmacy floor ("Farmasi Kecemasan").
    pub fn pharmacy() -> Self {
        let zones = PHARMACY_ZONES
            .iter()
            .filter_map(|(code, group, rect)| {
                SectionCode::new(*code).ok().map(|id| ZoneDefinition {
                    id,
                    group: *group,
                    rect: *rect,
                })
            })
            .collect();
        Self::new(FLOOR_PLAN_IMAGE_URL, zones)
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn zones(&self) -> &[ZoneDefinition] {
        &self.zones
    }

    pub fn zone(&self, id: &SectionCode) -> Option<&ZoneDefinition> {
        self.zones.iter().find(|z| &z.id == id)
    }

    /// First zone whose rectangle contains the point.
    pub fn zone_at(&self, x: f32, y: f32) -> Option<&ZoneDefinition> {
        self.zones.iter().find(|z| z.rect.contains(x, y))
    }
}

impl Default for FloorPlan {
    fn default() -> Self {
        Self::pharmacy()
    }
}
