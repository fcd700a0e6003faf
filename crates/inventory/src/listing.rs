//! Listing derivations: section filter, text search and pagination.
//!
//! Everything here is a pure function of the loaded records and the view
//! state, so the listing controller can recompute it after every change
//! without caring what triggered the change.

use serde::{Deserialize, Serialize};

use pharmloc_core::{DomainError, DomainResult, SectionCode};

use crate::record::InventoryRecord;

/// Page sizes offered by the pagination control.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [12, 24, 48, 96];

pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Section filter: everything, or one zone code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionFilter {
    #[default]
    All,
    Section(SectionCode),
}

impl SectionFilter {
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        match self {
            SectionFilter::All => true,
            SectionFilter::Section(code) => &record.section == code,
        }
    }
}

/// Presentation of the listing. Purely cosmetic: both modes show the same page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// Case-insensitive substring match over name, generic name and location code.
///
/// An empty query matches everything.
pub fn matches_search(record: &InventoryRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let hit = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&needle));

    hit(Some(record.name.as_str()))
        || hit(record.generic_name.as_deref())
        || hit(record.location_code.as_deref())
}

/// Apply the section filter, then the search query. Order of `records` is kept.
pub fn filter_records<'a>(
    records: &'a [InventoryRecord],
    section: &SectionFilter,
    query: &str,
) -> Vec<&'a InventoryRecord> {
    records
        .iter()
        .filter(|r| section.matches(r))
        .filter(|r| matches_search(r, query))
        .collect()
}

/// Distinct section codes present in `records`, sorted ascending.
pub fn distinct_sections(records: &[InventoryRecord]) -> Vec<SectionCode> {
    let mut sections: Vec<SectionCode> = records.iter().map(|r| r.section.clone()).collect();
    sections.sort();
    sections.dedup();
    sections
}

/// One page of a (filtered) result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole result set, not of this page.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages()
    }
}

/// Slice `[(page-1)*page_size, page*page_size)` out of `items`.
///
/// The last page may be short; pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(items.len());
    let slice = if start < end { &items[start..end] } else { &[][..] };

    Page {
        items: slice.to_vec(),
        total: items.len(),
        page,
        page_size,
    }
}

/// Client-side listing state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingViewState {
    section: SectionFilter,
    search: String,
    mode: ViewMode,
    page: usize,
    page_size: usize,
}

impl Default for ListingViewState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl ListingViewState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            section: SectionFilter::All,
            search: String::new(),
            mode: ViewMode::Grid,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn section(&self) -> &SectionFilter {
        &self.section
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the section filter; a real change sends the user back to page 1.
    pub fn set_section(&mut self, section: SectionFilter) {
        if self.section != section {
            self.section = section;
            self.page = 1;
        }
    }

    /// Change the search text; a real change sends the user back to page 1.
    pub fn set_search(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.search != query {
            self.search = query;
            self.page = 1;
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Pagination control callback: the control supplies both values.
    pub fn set_page(&mut self, page: usize, page_size: usize) -> DomainResult<()> {
        if page == 0 {
            return Err(DomainError::validation("page is 1-based"));
        }
        if page_size == 0 {
            return Err(DomainError::validation("page size must be positive"));
        }
        self.page = page;
        self.page_size = page_size;
        Ok(())
    }

    /// Filter then paginate `records` according to this state.
    pub fn apply<'a>(&self, records: &'a [InventoryRecord]) -> Page<&'a InventoryRecord> {
        let filtered = filter_records(records, &self.section, &self.search);
        paginate(&filtered, self.page, self.page_size)
    }
}
