//! In-memory gateway for tests/dev.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use pharmloc_core::ItemId;
use pharmloc_inventory::InventoryRecord;

use crate::change::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription};
use crate::error::GatewayError;
use crate::gateway::InventoryGateway;
use crate::query::{INVENTORY_TABLE, SelectQuery};

/// In-memory inventory table with a live change feed.
///
/// - No IO
/// - Mutations publish insert/update/delete notifications like the remote store
/// - `fail_next` injects query failures for error-path tests
#[derive(Debug)]
pub struct InMemoryGateway {
    table: String,
    rows: RwLock<Vec<InventoryRecord>>,
    feed: ChangeFeed,
    pending_failures: AtomicUsize,
    select_calls: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let gateway = Self::new();
        if let Ok(mut rows) = gateway.rows.write() {
            rows.extend(records);
        }
        gateway
    }

    /// Serve `table` instead of the default inventory table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add a record and notify subscribers.
    pub fn insert(&self, record: InventoryRecord) {
        let payload = json!({ "new": record });
        if let Ok(mut rows) = self.rows.write() {
            rows.push(record);
        }
        self.feed
            .publish(ChangeEvent::new(ChangeKind::Insert, self.table.clone(), payload));
    }

    /// Replace the record with the same id. Returns `false` when absent.
    pub fn update(&self, record: InventoryRecord) -> bool {
        let payload = json!({ "new": record });
        let replaced = match self.rows.write() {
            Ok(mut rows) => match rows.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => {
                    *slot = record;
                    true
                }
                None => false,
            },
            Err(_) => false,
        };
        if replaced {
            self.feed
                .publish(ChangeEvent::new(ChangeKind::Update, self.table.clone(), payload));
        }
        replaced
    }

    /// Remove the record with `id`. Returns `false` when absent.
    pub fn delete(&self, id: &ItemId) -> bool {
        let removed = match self.rows.write() {
            Ok(mut rows) => rows
                .iter()
                .position(|r| &r.id == id)
                .map(|idx| rows.remove(idx)),
            Err(_) => None,
        };
        match removed {
            Some(old) => {
                self.feed.publish(ChangeEvent::new(
                    ChangeKind::Delete,
                    self.table.clone(),
                    json!({ "old": old }),
                ));
                true
            }
            None => false,
        }
    }

    /// Make the next `n` selects fail with `GatewayError::Unavailable`.
    pub fn fail_next(&self, n: usize) {
        self.pending_failures.store(n, Ordering::SeqCst);
    }

    /// Number of selects issued so far (including failed ones).
    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self {
            table: INVENTORY_TABLE.to_string(),
            rows: RwLock::new(Vec::new()),
            feed: ChangeFeed::default(),
            pending_failures: AtomicUsize::new(0),
            select_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl InventoryGateway for InMemoryGateway {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<InventoryRecord>, GatewayError> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);

        if self.take_failure() {
            return Err(GatewayError::Unavailable("injected failure".to_string()));
        }
        if query.table != self.table {
            return Err(GatewayError::UnknownTable(query.table.clone()));
        }

        let rows = self
            .rows
            .read()
            .map_err(|_| GatewayError::Unavailable("table lock poisoned".to_string()))?;
        query.evaluate(&rows)
    }

    fn subscribe(&self, table: &str) -> Result<ChangeSubscription, GatewayError> {
        if table != self.table {
            return Err(GatewayError::UnknownTable(table.to_string()));
        }
        Ok(self.feed.subscribe(table))
    }
}
