//! Inventory listing page controller.
//!
//! Loads the whole table once on mount, then keeps it fresh by re-running
//! the same query whenever the gateway reports an insert, update or delete.
//! Section filter, search and pagination are derived locally from the loaded
//! set (see `pharmloc_inventory::listing`).
//!
//! Every fetch takes a ticket from a generation counter. Only the reply
//! holding the newest ticket is applied, and `unmount` bumps the counter so
//! replies that land after teardown are dropped.

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use pharmloc_core::{DomainError, DomainResult, ItemId, SectionCode, find_by_id};
use pharmloc_gateway::{ChangeSubscription, FeedError, InventoryGateway, SelectQuery};
use pharmloc_inventory::{InventoryRecord, ListingViewState, Page, SectionFilter, ViewMode, distinct_sections};

use crate::config::ListingConfig;
use crate::lock;
use crate::modal::IndentTrigger;
use crate::notify::Notifier;
use crate::view::ListingView;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load inventory items";
pub const INDENT_SUCCESS_MESSAGE: &str = "Item added to cart successfully!";

#[derive(Debug)]
struct Inner {
    records: Vec<InventoryRecord>,
    sections: Vec<SectionCode>,
    loading: bool,
    view: ListingViewState,
    indent: IndentTrigger,
    generation: u64,
    mounted: bool,
    last_loaded_at: Option<DateTime<Utc>>,
}

pub struct InventoryListingController {
    gateway: Arc<dyn InventoryGateway>,
    notifier: Arc<dyn Notifier>,
    config: ListingConfig,
    inner: Mutex<Inner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl core::fmt::Debug for InventoryListingController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryListingController")
            .field("config", &self.config)
            .field("inner", &*lock(&self.inner))
            .finish_non_exhaustive()
    }
}

impl InventoryListingController {
    pub fn new(
        gateway: Arc<dyn InventoryGateway>,
        notifier: Arc<dyn Notifier>,
        config: ListingConfig,
    ) -> Arc<Self> {
        let view = ListingViewState::with_page_size(config.page_size);
        Arc::new(Self {
            gateway,
            notifier,
            config,
            inner: Mutex::new(Inner {
                records: Vec::new(),
                sections: Vec::new(),
                loading: true,
                view,
                indent: IndentTrigger::default(),
                generation: 0,
                mounted: false,
                last_loaded_at: None,
            }),
            listener: Mutex::new(None),
        })
    }

    /// Subscribe to table changes and run the initial load.
    ///
    /// Must be called inside a tokio runtime. Mounting twice is a no-op.
    pub async fn mount(self: &Arc<Self>) {
        {
            let mut inner = lock(&self.inner);
            if inner.mounted {
                return;
            }
            inner.mounted = true;
        }

        match self.gateway.subscribe(&self.config.table) {
            Ok(subscription) => {
                let handle = tokio::spawn(listen(Arc::downgrade(self), subscription));
                if let Some(previous) = lock(&self.listener).replace(handle) {
                    previous.abort();
                }
            }
            // The page still works, it just won't refresh by itself.
            Err(err) => {
                tracing::warn!(table = %self.config.table, error = %err, "change subscription failed");
            }
        }

        tracing::info!(table = %self.config.table, "inventory listing mounted");
        self.refresh().await;
    }

    /// Tear down the change subscription. Replies still in flight are dropped.
    pub fn unmount(&self) {
        {
            let mut inner = lock(&self.inner);
            inner.mounted = false;
            inner.generation += 1;
        }
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
        tracing::info!(table = %self.config.table, "inventory listing unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.inner).mounted
    }

    /// Re-run the full query. The newest call wins.
    pub async fn refresh(&self) {
        let generation = {
            let mut inner = lock(&self.inner);
            if !inner.mounted {
                tracing::debug!("refresh skipped: listing not mounted");
                return;
            }
            inner.generation += 1;
            // Background refetches keep showing the current page.
            if inner.last_loaded_at.is_none() {
                inner.loading = true;
            }
            inner.generation
        };

        let query = SelectQuery::all_inventory(&self.config.table);
        let result = self.gateway.select(&query).await;

        let failed = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                tracing::debug!(generation, current = inner.generation, "discarding stale inventory response");
                return;
            }
            inner.loading = false;

            match result {
                Ok(records) => {
                    tracing::debug!(count = records.len(), "inventory loaded");
                    inner.sections = distinct_sections(&records);
                    inner.records = records;
                    inner.last_loaded_at = Some(Utc::now());
                    false
                }
                Err(err) => {
                    tracing::error!(table = %self.config.table, error = %err, "failed to load inventory");
                    true
                }
            }
        };

        if failed {
            self.notifier.error(LOAD_FAILED_MESSAGE);
        }
    }

    /// A row changed somewhere in the table.
    pub async fn on_records_invalidated(&self) {
        self.refresh().await;
    }

    pub fn records(&self) -> Vec<InventoryRecord> {
        lock(&self.inner).records.clone()
    }

    /// Filter buttons: distinct section codes of the loaded set, sorted.
    pub fn sections(&self) -> Vec<SectionCode> {
        lock(&self.inner).sections.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.inner).loading
    }

    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.inner).last_loaded_at
    }

    pub fn view_state(&self) -> ListingViewState {
        lock(&self.inner).view.clone()
    }

    pub fn set_section_filter(&self, section: SectionFilter) {
        lock(&self.inner).view.set_section(section);
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        lock(&self.inner).view.set_search(query);
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        lock(&self.inner).view.set_mode(mode);
    }

    /// Pagination control callback.
    pub fn change_page(&self, page: usize, page_size: usize) -> DomainResult<()> {
        lock(&self.inner).view.set_page(page, page_size)
    }

    /// The page currently on screen.
    pub fn current_page(&self) -> Page<InventoryRecord> {
        let inner = lock(&self.inner);
        let page = inner.view.apply(&inner.records);
        Page {
            items: page.items.into_iter().cloned().collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }

    pub fn view(&self) -> ListingView {
        let inner = lock(&self.inner);
        let page = inner.view.apply(&inner.records);
        ListingView::build(
            inner.loading,
            inner.sections.clone(),
            inner.view.section(),
            inner.view.search(),
            inner.view.mode(),
            &page,
        )
    }

    /// Open the indent trigger for a loaded record.
    pub fn select_record(&self, id: &ItemId) -> DomainResult<()> {
        let mut inner = lock(&self.inner);
        let record = find_by_id(&inner.records, id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("inventory item {id}")))?;
        tracing::debug!(item = %record.id, "indent requested");
        inner.indent.open(record);
        Ok(())
    }

    pub fn indent(&self) -> IndentTrigger {
        lock(&self.inner).indent.clone()
    }

    /// The external indent form submitted successfully.
    pub fn indent_succeeded(&self) {
        let record = lock(&self.inner).indent.succeed();
        if let Some(record) = record {
            tracing::info!(item = %record.id, "item added to indent cart");
            self.notifier.success(INDENT_SUCCESS_MESSAGE);
        }
    }

    /// The external indent form was dismissed.
    pub fn indent_closed(&self) {
        lock(&self.inner).indent.close();
    }
}

impl Drop for InventoryListingController {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }
}

async fn listen(controller: Weak<InventoryListingController>, mut subscription: ChangeSubscription) {
    loop {
        let outcome = subscription.recv().await;
        let Some(ctl) = controller.upgrade() else {
            break;
        };

        match outcome {
            Ok(event) => {
                tracing::debug!(table = %event.table, kind = ?event.kind, "inventory changed");
            }
            Err(FeedError::Lagged(missed)) => {
                tracing::warn!(missed, "change feed lagged; refetching");
            }
            Err(FeedError::Closed) => {
                tracing::debug!(table = subscription.table(), "change feed closed");
                break;
            }
        }

        tokio::spawn(async move {
            ctl.on_records_invalidated().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmloc_gateway::{ChangeEvent, ChangeFeed, ChangeKind, GatewayError, INVENTORY_TABLE, InMemoryGateway};

    use crate::notify::RecordingNotifier;
    use crate::view::ListingBody;

    fn record(id: usize, section: &str, name: &str) -> InventoryRecord {
        InventoryRecord::new(
            ItemId::new(id.to_string()).unwrap(),
            SectionCode::new(section).unwrap(),
            1,
            name,
        )
    }

    fn setup(records: Vec<InventoryRecord>) -> (Arc<InMemoryGateway>, Arc<RecordingNotifier>, Arc<InventoryListingController>) {
        let gateway = Arc::new(InMemoryGateway::with_records(records));
        let notifier = Arc::new(RecordingNotifier::new());
        let ctl = InventoryListingController::new(gateway.clone(), notifier.clone(), ListingConfig::default());
        (gateway, notifier, ctl)
    }

    #[tokio::test]
    async fn mount_loads_and_derives_sections() {
        let (gateway, _, ctl) = setup(vec![
            record(1, "C", "Cetirizine"),
            record(2, "A", "Amlodipine"),
            record(3, "C", "Chlorpheniramine"),
        ]);
        assert!(ctl.is_loading());

        ctl.mount().await;
        ctl.mount().await;

        assert!(!ctl.is_loading());
        assert_eq!(gateway.select_calls(), 1);
        assert_eq!(gateway.subscriber_count(), 1);
        let sections: Vec<_> = ctl.sections().iter().map(|s| s.to_string()).collect();
        assert_eq!(sections, vec!["A", "C"]);
        // Ordered by section on load.
        assert_eq!(ctl.records()[0].name, "Amlodipine");
        assert!(ctl.last_loaded_at().is_some());
    }

    #[tokio::test]
    async fn filter_and_search_reset_the_page() {
        let records = (0..30).map(|i| record(i, "A", &format!("Drug {i}"))).collect();
        let (_, _, ctl) = setup(records);
        ctl.mount().await;

        ctl.change_page(2, 12).unwrap();
        assert_eq!(ctl.view_state().page(), 2);

        ctl.set_search_query("drug 1");
        assert_eq!(ctl.view_state().page(), 1);
        // "Drug 1" and "Drug 10".."Drug 19".
        assert_eq!(ctl.current_page().total, 11);

        ctl.change_page(2, 12).unwrap();
        ctl.set_section_filter(SectionFilter::Section(SectionCode::new("A").unwrap()));
        assert_eq!(ctl.view_state().page(), 1);

        assert!(ctl.change_page(0, 12).is_err());
    }

    #[tokio::test]
    async fn view_shows_placeholder_for_an_empty_section() {
        let (_, _, ctl) = setup(vec![record(1, "A", "Amlodipine")]);
        ctl.mount().await;
        ctl.set_section_filter(SectionFilter::Section(SectionCode::new("B").unwrap()));

        let view = ctl.view();
        assert_eq!(view.total, 0);
        assert_eq!(view.count_label.as_deref(), Some("0 items in Section B"));
        assert!(matches!(view.body, ListingBody::Empty { .. }));
        assert_eq!(view.total_label, "Total 0 items");
    }

    #[tokio::test]
    async fn unmounted_refresh_is_ignored() {
        let (gateway, _, ctl) = setup(vec![record(1, "A", "Amlodipine")]);
        ctl.refresh().await;
        assert_eq!(gateway.select_calls(), 0);
        assert!(ctl.records().is_empty());
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_records() {
        let (gateway, notifier, ctl) = setup(vec![record(1, "A", "Amlodipine")]);
        ctl.mount().await;

        gateway.fail_next(1);
        ctl.refresh().await;

        assert_eq!(ctl.records().len(), 1);
        assert!(!ctl.is_loading());
        assert_eq!(notifier.errors(), vec![LOAD_FAILED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn indent_flow_notifies_only_on_success() {
        let (_, notifier, ctl) = setup(vec![record(1, "A", "Amlodipine")]);
        ctl.mount().await;
        let id = ItemId::new("1").unwrap();

        assert!(ctl.select_record(&ItemId::new("9").unwrap()).is_err());

        ctl.select_record(&id).unwrap();
        assert!(ctl.indent().is_visible());
        ctl.indent_closed();
        assert!(!ctl.indent().is_visible());
        assert!(notifier.notices().is_empty());

        ctl.select_record(&id).unwrap();
        ctl.indent_succeeded();
        assert!(!ctl.indent().is_visible());
        let notices = notifier.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, INDENT_SUCCESS_MESSAGE);

        // A second success for an already closed form says nothing.
        ctl.indent_succeeded();
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn unmount_drops_the_subscription() {
        let (gateway, _, ctl) = setup(vec![record(1, "A", "Amlodipine")]);
        ctl.mount().await;
        assert_eq!(gateway.subscriber_count(), 1);

        ctl.unmount();
        assert!(!ctl.is_mounted());
        // Aborting drops the task's receiver once the runtime reaps it.
        for _ in 0..10 {
            if gateway.subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(gateway.subscriber_count(), 0);
    }

    /// Serves selects from an in-memory table but hands out subscriptions
    /// on a separate, tiny change feed.
    struct TinyFeedGateway {
        table: InMemoryGateway,
        feed: ChangeFeed,
    }

    #[async_trait::async_trait]
    impl InventoryGateway for TinyFeedGateway {
        async fn select(&self, query: &SelectQuery) -> Result<Vec<InventoryRecord>, GatewayError> {
            self.table.select(query).await
        }

        fn subscribe(&self, table: &str) -> Result<ChangeSubscription, GatewayError> {
            Ok(self.feed.subscribe(table))
        }
    }

    #[tokio::test]
    async fn lagged_feed_still_triggers_a_refetch() {
        let gateway = Arc::new(TinyFeedGateway {
            table: InMemoryGateway::with_records(vec![record(1, "A", "Amlodipine")]),
            feed: ChangeFeed::new(1),
        });
        let ctl = InventoryListingController::new(
            gateway.clone(),
            Arc::new(RecordingNotifier::new()),
            ListingConfig::default(),
        );
        ctl.mount().await;
        assert_eq!(gateway.table.select_calls(), 1);

        // Three changes into a one-slot feed before the listener runs: it sees
        // `Lagged` and then only the newest change.
        for _ in 0..3 {
            gateway
                .feed
                .publish(ChangeEvent::new(ChangeKind::Update, INVENTORY_TABLE, serde_json::Value::Null));
        }

        for _ in 0..100 {
            if gateway.table.select_calls() >= 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(gateway.table.select_calls(), 3);
    }
}
