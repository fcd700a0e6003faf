//! Controller settings.

use pharmloc_core::{DomainError, DomainResult, ShelfRow};
use pharmloc_gateway::{GatewayConfig, INVENTORY_TABLE};
use pharmloc_inventory::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    /// Initial page size; must be one of `PAGE_SIZE_OPTIONS`.
    pub page_size: usize,
    /// Table loaded and watched for changes.
    pub table: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            table: INVENTORY_TABLE.to_string(),
        }
    }
}

impl ListingConfig {
    /// Defaults, reading the table the gateway was configured with.
    pub fn for_gateway(gateway: &GatewayConfig) -> Self {
        Self {
            table: gateway.table.clone(),
            ..Self::default()
        }
    }

    pub fn with_page_size(page_size: usize) -> DomainResult<Self> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(DomainError::validation(format!(
                "page size {page_size} is not one of {PAGE_SIZE_OPTIONS:?}"
            )));
        }
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDownConfig {
    /// Row preselected when a cabinet opens. `None` waits for the user to pick.
    pub default_row: Option<ShelfRow>,
    /// Table shelf queries run against.
    pub table: String,
}

impl Default for DrillDownConfig {
    fn default() -> Self {
        Self {
            default_row: Some(ShelfRow::FIRST),
            table: INVENTORY_TABLE.to_string(),
        }
    }
}

impl DrillDownConfig {
    pub fn for_gateway(gateway: &GatewayConfig) -> Self {
        Self {
            table: gateway.table.clone(),
            ..Self::default()
        }
    }

    /// Open cabinets with no row selected.
    pub fn no_default_row(self) -> Self {
        Self {
            default_row: None,
            ..self
        }
    }
}
