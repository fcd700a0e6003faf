//! Render-ready view models.
//!
//! Grid and list are two presentations of the same page: both are built from
//! one `Page` of records, so they always agree on count, order and ids.

use serde::Serialize;

use pharmloc_core::{ItemId, SectionCode, ShelfRow};
use pharmloc_inventory::{InventoryRecord, PAGE_SIZE_OPTIONS, Page, SectionFilter, ViewMode};

/// Skeleton cards shown while the listing loads.
pub const LOADING_PLACEHOLDERS: usize = 6;

pub const EMPTY_SECTION_MESSAGE: &str = "No drugs in this section";

/// A card in the grid (also used inside the cabinet drill-down).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCard {
    pub id: ItemId,
    pub name: String,
    pub generic_name: Option<String>,
    pub location_code: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub quantity: i64,
}

impl From<&InventoryRecord> for GridCard {
    fn from(r: &InventoryRecord) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            generic_name: r.generic_name.clone(),
            location_code: r.location_code.clone(),
            tags: r.tags().into_iter().map(str::to_string).collect(),
            image_url: r.image_url.clone(),
            quantity: r.quantity,
        }
    }
}

/// A dense list entry: name, tags, location, remarks and a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub id: ItemId,
    pub name: String,
    pub tags: Vec<String>,
    pub location_code: Option<String>,
    pub remarks: Option<String>,
    pub image_url: Option<String>,
}

impl From<&InventoryRecord> for ListRow {
    fn from(r: &InventoryRecord) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            tags: r.tags().into_iter().map(str::to_string).collect(),
            location_code: r.location_code.clone(),
            remarks: r.remarks.clone().filter(|s| !s.is_empty()),
            image_url: r.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListingBody {
    Loading { placeholders: usize },
    Empty { message: String },
    Grid { cards: Vec<GridCard> },
    List { rows: Vec<ListRow> },
}

impl ListingBody {
    pub fn build(mode: ViewMode, page: &Page<&InventoryRecord>) -> Self {
        if page.total == 0 {
            return ListingBody::Empty {
                message: EMPTY_SECTION_MESSAGE.to_string(),
            };
        }
        match mode {
            ViewMode::Grid => ListingBody::Grid {
                cards: page.items.iter().map(|r| GridCard::from(*r)).collect(),
            },
            ViewMode::List => ListingBody::List {
                rows: page.items.iter().map(|r| ListRow::from(*r)).collect(),
            },
        }
    }

    /// Ids rendered, in order. Empty for loading/empty states.
    pub fn ids(&self) -> Vec<&ItemId> {
        match self {
            ListingBody::Grid { cards } => cards.iter().map(|c| &c.id).collect(),
            ListingBody::List { rows } => rows.iter().map(|r| &r.id).collect(),
            ListingBody::Loading { .. } | ListingBody::Empty { .. } => Vec::new(),
        }
    }
}

/// Everything the listing page draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    pub loading: bool,
    pub sections: Vec<SectionCode>,
    pub section: SectionFilter,
    pub search: String,
    pub mode: ViewMode,
    /// Size of the filtered set.
    pub total: usize,
    /// Hidden while loading.
    pub count_label: Option<String>,
    pub body: ListingBody,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_label: String,
    pub page_size_options: Vec<usize>,
}

impl ListingView {
    pub fn build(
        loading: bool,
        sections: Vec<SectionCode>,
        section: &SectionFilter,
        search: &str,
        mode: ViewMode,
        page: &Page<&InventoryRecord>,
    ) -> Self {
        let body = if loading {
            ListingBody::Loading {
                placeholders: LOADING_PLACEHOLDERS,
            }
        } else {
            ListingBody::build(mode, page)
        };

        Self {
            loading,
            sections,
            section: section.clone(),
            search: search.to_string(),
            mode,
            total: page.total,
            count_label: (!loading).then(|| count_label(page.total, section)),
            body,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages(),
            total_label: format!("Total {} items", page.total),
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
        }
    }
}

/// `"1 item"`, `"12 items in Section B"`.
pub fn count_label(total: usize, section: &SectionFilter) -> String {
    let noun = if total == 1 { "item" } else { "items" };
    match section {
        SectionFilter::All => format!("{total} {noun}"),
        SectionFilter::Section(code) => format!("{total} {noun} in Section {code}"),
    }
}

/// Label of a section filter button.
pub fn section_button_label(section: &SectionFilter) -> String {
    match section {
        SectionFilter::All => "All Sections".to_string(),
        SectionFilter::Section(code) => format!("Section {code}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CabinetBody {
    /// No row chosen yet.
    Prompt { message: String },
    Loading,
    Items { cards: Vec<GridCard> },
    /// Zero rows, or a failed load (which falls back to an empty list).
    Empty { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOption {
    pub row: ShelfRow,
    pub label: String,
    pub selected: bool,
}

/// The cabinet modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CabinetView {
    pub title: String,
    pub rows: Vec<RowOption>,
    pub body: CabinetBody,
}

pub fn row_options(selected: Option<ShelfRow>) -> Vec<RowOption> {
    ShelfRow::ALL
        .iter()
        .map(|row| RowOption {
            row: *row,
            label: row.label(),
            selected: Some(*row) == selected,
        })
        .collect()
}

pub fn empty_row_message(row: ShelfRow) -> String {
    format!("No items found in Row {row}")
}
