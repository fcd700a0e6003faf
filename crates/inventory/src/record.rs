use serde::{Deserialize, Serialize};

use pharmloc_core::{Entity, ItemId, SectionCode};

/// One row of the remote `inventory_items` table.
///
/// `(section, row)` identifies a physical shelf; several records may share a
/// shelf and the client enforces no uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: ItemId,
    pub section: SectionCode,
    pub row: i32,
    #[serde(default)]
    pub bin: Option<String>,
    #[serde(default)]
    pub location_code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    /// Category tag (tablet, injection, ...).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub indent_source: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub quantity: i64,
}

impl InventoryRecord {
    pub fn new(id: ItemId, section: SectionCode, row: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            section,
            row,
            bin: None,
            location_code: None,
            name: name.into(),
            generic_name: None,
            kind: None,
            indent_source: None,
            remarks: None,
            image_url: None,
            quantity: 0,
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = Some(bin.into());
        self
    }

    pub fn with_location_code(mut self, code: impl Into<String>) -> Self {
        self.location_code = Some(code.into());
        self
    }

    pub fn with_generic_name(mut self, generic: impl Into<String>) -> Self {
        self.generic_name = Some(generic.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_indent_source(mut self, source: impl Into<String>) -> Self {
        self.indent_source = Some(source.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// The physical shelf this record sits on.
    pub fn shelf(&self) -> (&SectionCode, i32) {
        (&self.section, self.row)
    }

    /// Category and source tags, in display order, skipping absent ones.
    pub fn tags(&self) -> Vec<&str> {
        self.kind
            .as_deref()
            .into_iter()
            .chain(self.indent_source.as_deref())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl Entity for InventoryRecord {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
