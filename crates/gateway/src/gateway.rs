//! The seam between controllers and the remote store.

use std::sync::Arc;

use pharmloc_inventory::InventoryRecord;

use crate::change::ChangeSubscription;
use crate::error::GatewayError;
use crate::query::SelectQuery;

/// Queryable table store with per-table change notifications.
///
/// Controllers receive a gateway explicitly (no process-wide client), which
/// is what lets tests substitute `InMemoryGateway` or a scripted fake.
///
/// ## Consistency
///
/// The gateway owns the authoritative record set. Callers hold a read-only,
/// eventually-consistent copy and refresh it wholesale when a change
/// notification arrives.
#[async_trait::async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Run a select. Zero matching rows is `Ok(vec![])`, not an error.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<InventoryRecord>, GatewayError>;

    /// Subscribe to insert/update/delete notifications on `table`.
    ///
    /// The subscription lives until dropped.
    fn subscribe(&self, table: &str) -> Result<ChangeSubscription, GatewayError>;
}

#[async_trait::async_trait]
impl<G> InventoryGateway for Arc<G>
where
    G: InventoryGateway + ?Sized,
{
    async fn select(&self, query: &SelectQuery) -> Result<Vec<InventoryRecord>, GatewayError> {
        (**self).select(query).await
    }

    fn subscribe(&self, table: &str) -> Result<ChangeSubscription, GatewayError> {
        (**self).subscribe(table)
    }
}
