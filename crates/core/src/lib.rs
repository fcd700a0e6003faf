//! `pharmloc-core`: shared building blocks for the pharmacy locator.
//!
//! Identifiers and the domain error model. No IO, no async.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, find_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{ItemId, SectionCode, ShelfRow};
