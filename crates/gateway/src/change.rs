//! Change notifications for gateway tables (pub/sub mechanics only).
//!
//! A feed fans each notification out to every live subscription (broadcast
//! semantics). Notifications carry the affected row as an opaque JSON
//! payload; locator controllers use them purely as "refetch now" triggers.
//!
//! Delivery is lossy under pressure: a subscriber that falls more than the
//! channel capacity behind gets `FeedError::Lagged` and should treat it like
//! any other change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

use crate::error::FeedError;

/// Default per-subscriber buffer.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One insert/update/delete on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    pub payload: JsonValue,
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, table: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            kind,
            table: table.into(),
            payload,
            observed_at: Utc::now(),
        }
    }
}

/// Publishing side of a change feed.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every live subscription. Returns how many received it.
    ///
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(table = %event.table, kind = ?event.kind, "publishing change");
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to changes on `table`. Events for other tables are skipped.
    pub fn subscribe(&self, table: impl Into<String>) -> ChangeSubscription {
        ChangeSubscription {
            table: table.into(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Receiving side of a change feed, scoped to one table.
///
/// Dropping the subscription unsubscribes; nothing else needs tearing down.
#[derive(Debug)]
pub struct ChangeSubscription {
    table: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Wait for the next change on this subscription's table.
    pub async fn recv(&mut self) -> Result<ChangeEvent, FeedError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.table == self.table => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => return Err(FeedError::Lagged(n)),
                Err(broadcast::error::RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }

    /// Non-blocking variant of `recv`. `Ok(None)` when nothing is pending.
    pub fn try_recv(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.table == self.table => return Ok(Some(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => return Err(FeedError::Lagged(n)),
                Err(broadcast::error::TryRecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}
