//! Inventory domain for the pharmacy locator.
//!
//! Pure data and derivations (no IO, no async): the record shape served by
//! the remote store, the hard-coded floor plan, and the listing pipeline
//! (section filter, text search, pagination).

pub mod listing;
pub mod record;
pub mod zone;

pub use listing::{
    DEFAULT_PAGE_SIZE, ListingViewState, PAGE_SIZE_OPTIONS, Page, SectionFilter, ViewMode,
    distinct_sections, filter_records, matches_search, paginate,
};
pub use record::InventoryRecord;
pub use zone::{FloorPlan, ZoneDefinition, ZoneGroup, ZoneRect};
