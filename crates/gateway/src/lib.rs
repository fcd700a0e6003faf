//! `pharmloc-gateway`
//!
//! **Responsibility:** the boundary to the remote relational store that owns
//! the inventory.
//!
//! This crate provides:
//! - A small select/filter/order query model (`SelectQuery`)
//! - The `InventoryGateway` trait controllers are written against
//! - A per-table change feed (insert/update/delete notifications)
//! - `InMemoryGateway` for tests/dev and `PostgrestGateway` over HTTP
//!
//! The store is the authority; clients only read and refetch.

pub mod change;
pub mod config;
pub mod error;
pub mod gateway;
pub mod in_memory;
pub mod poll;
pub mod postgrest;
pub mod query;

pub use change::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription};
pub use config::GatewayConfig;
pub use error::{FeedError, GatewayError};
pub use gateway::InventoryGateway;
pub use in_memory::InMemoryGateway;
pub use poll::PollingChangeFeed;
pub use postgrest::PostgrestGateway;
pub use query::{Direction, Filter, FilterValue, INVENTORY_TABLE, OrderBy, SelectQuery};
