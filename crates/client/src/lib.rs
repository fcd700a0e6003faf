//! `pharmloc-client`
//!
//! **Responsibility:** presentation state for the pharmacy locator.
//!
//! This crate provides:
//! - The floor-plan zone map and its cabinet/row drill-down
//! - The inventory listing page (section filter, search, pagination, live refresh)
//! - The indent (restock request) trigger and the read-only detail view
//! - Render-ready view models for whichever UI shell hosts them
//!
//! The client is a **thin shell** around the gateway: every controller gets
//! its gateway and notifier injected, and the remote store stays the authority.

pub mod cabinet;
pub mod config;
pub mod floor_plan;
pub mod listing;
pub mod modal;
pub mod notify;
pub mod view;

pub use cabinet::{CabinetDrillDown, DrillDownPhase, DrillDownState};
pub use config::{DrillDownConfig, ListingConfig};
pub use floor_plan::{FloorPlanController, ZoneOverlay};
pub use listing::InventoryListingController;
pub use modal::{IndentTrigger, ModalProps, RecordModal};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use view::{CabinetBody, CabinetView, GridCard, ListRow, ListingBody, ListingView};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Controller state is only mutated by the controller's own callbacks, so a
/// poisoned lock still holds consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
