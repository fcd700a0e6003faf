//! Change feed for stores that cannot push notifications.
//!
//! A background task re-reads the whole table every `interval`, diffs the
//! rows by `id` against the previous snapshot and publishes one
//! insert/update/delete per difference. The first read only establishes the
//! baseline. The task stops on the first tick after the last subscription
//! is dropped and is restarted by the next `subscribe`.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value as JsonValue, json};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::change::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription};
use crate::error::GatewayError;

/// Rows of one table keyed by their `id` column.
pub type Snapshot = BTreeMap<String, JsonValue>;

/// Poller bookkeeping. The poller clears `running` and exits while holding
/// this lock, and `subscribe` checks it under the same lock, so a subscriber
/// that arrives as the poller winds down always gets a fresh one.
#[derive(Debug, Default)]
struct PollerState {
    running: bool,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct PollingChangeFeed {
    feed: ChangeFeed,
    interval: Duration,
    state: Arc<Mutex<PollerState>>,
}

impl PollingChangeFeed {
    pub fn new(interval: Duration) -> Self {
        Self {
            feed: ChangeFeed::default(),
            interval,
            state: Arc::new(Mutex::new(PollerState::default())),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().map(|s| s.running).unwrap_or(false)
    }

    /// Subscribe to `table`, starting the poller if it is not running.
    ///
    /// `fetch` must return every row of the table as raw JSON objects.
    pub fn subscribe<F, Fut>(&self, table: &str, fetch: F) -> Result<ChangeSubscription, GatewayError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<JsonValue>, GatewayError>> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| GatewayError::Unavailable("change polling needs a tokio runtime".to_string()))?;

        // Subscribe before taking the lock: a poller deciding to stop either
        // sees this subscriber or has already cleared `running`.
        let subscription = self.feed.subscribe(table);

        let mut state = self
            .state
            .lock()
            .map_err(|_| GatewayError::Unavailable("poller lock poisoned".to_string()))?;
        if !state.running {
            tracing::info!(table, interval_ms = self.interval.as_millis() as u64, "starting change poller");
            state.running = true;
            let poller = Poller {
                feed: self.feed.clone(),
                state: self.state.clone(),
                table: table.to_string(),
                interval: self.interval,
            };
            if let Some(previous) = state.task.replace(handle.spawn(poller.run(fetch))) {
                previous.abort();
            }
        }

        Ok(subscription)
    }
}

impl Drop for PollingChangeFeed {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.running = false;
            if let Some(task) = state.task.take() {
                task.abort();
            }
        }
    }
}

struct Poller {
    feed: ChangeFeed,
    state: Arc<Mutex<PollerState>>,
    table: String,
    interval: Duration,
}

impl Poller {
    /// Stop if nobody is listening. Decided under the state lock.
    fn should_stop(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return true;
        };
        if self.feed.subscriber_count() == 0 {
            state.running = false;
            return true;
        }
        false
    }

    async fn run<F, Fut>(self, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<JsonValue>, GatewayError>> + Send + 'static,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut snapshot: Option<Snapshot> = None;

        loop {
            ticker.tick().await;

            if self.should_stop() {
                tracing::debug!(table = %self.table, "no subscribers left; stopping change poller");
                break;
            }

            match fetch().await {
                Ok(rows) => {
                    let next = index_rows(rows);
                    if let Some(prev) = &snapshot {
                        for (kind, payload) in diff_snapshots(prev, &next) {
                            self.feed.publish(ChangeEvent::new(kind, self.table.clone(), payload));
                        }
                    }
                    snapshot = Some(next);
                }
                Err(err) => {
                    tracing::warn!(table = %self.table, error = %err, "change poll failed");
                }
            }
        }
    }
}

/// Key raw rows by their `id` column. Rows without an id are ignored.
pub fn index_rows(rows: Vec<JsonValue>) -> Snapshot {
    rows.into_iter()
        .filter_map(|row| {
            let key = match row.get("id")? {
                JsonValue::String(s) => s.clone(),
                JsonValue::Null => return None,
                other => other.to_string(),
            };
            Some((key, row))
        })
        .collect()
}

/// Changes that turn `prev` into `next`, ordered by id within each kind
/// (inserts and updates first, then deletes).
pub fn diff_snapshots(prev: &Snapshot, next: &Snapshot) -> Vec<(ChangeKind, JsonValue)> {
    let mut changes = Vec::new();

    for (id, row) in next {
        match prev.get(id) {
            None => changes.push((ChangeKind::Insert, json!({ "new": row }))),
            Some(old) if old != row => {
                changes.push((ChangeKind::Update, json!({ "new": row, "old": old })))
            }
            Some(_) => {}
        }
    }

    for (id, row) in prev {
        if !next.contains_key(id) {
            changes.push((ChangeKind::Delete, json!({ "old": row })));
        }
    }

    changes
}
