use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pharmloc_client::{
    CabinetBody, CabinetDrillDown, DrillDownConfig, DrillDownPhase, DrillDownState,
    FloorPlanController, InventoryListingController, ListingBody, ListingConfig, NoticeLevel,
    RecordingNotifier,
};
use pharmloc_core::{ItemId, SectionCode, ShelfRow};
use pharmloc_gateway::{
    ChangeFeed, ChangeSubscription, GatewayConfig, GatewayError, InMemoryGateway, InventoryGateway,
    SelectQuery,
};
use pharmloc_inventory::{FloorPlan, InventoryRecord, SectionFilter, ViewMode};
use tokio::sync::Notify;

fn code(s: &str) -> SectionCode {
    SectionCode::new(s).unwrap()
}

fn record(id: usize, section: &str, row: i32, name: &str) -> InventoryRecord {
    InventoryRecord::new(ItemId::new(id.to_string()).unwrap(), code(section), row, name)
        .with_location_code(format!("{section}{row}-{id:02}"))
}

/// 50 records spread round-robin across sections A, B and C.
fn fifty_records() -> Vec<InventoryRecord> {
    (0..50)
        .map(|i| record(i, ["A", "B", "C"][i % 3], 1 + (i % 6) as i32, &format!("Drug {i}")))
        .collect()
}

fn listing(
    gateway: Arc<dyn InventoryGateway>,
    notifier: Arc<RecordingNotifier>,
) -> Arc<InventoryListingController> {
    InventoryListingController::new(gateway, notifier, ListingConfig::default())
}

/// Wait until `cond` holds. Refetches run on spawned tasks, so they land a
/// few scheduler turns after the change that triggered them.
async fn eventually(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{what} did not happen within timeout");
}

#[tokio::test]
async fn section_filter_over_fifty_records_fits_one_page() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let notifier = Arc::new(RecordingNotifier::new());
    let ctl = listing(gateway.clone(), notifier.clone());
    ctl.mount().await;

    let sections: Vec<_> = ctl.sections().iter().map(|s| s.to_string()).collect();
    assert_eq!(sections, vec!["A", "B", "C"]);

    ctl.set_section_filter(SectionFilter::Section(code("B")));
    let view = ctl.view();

    assert_eq!(view.total, 17);
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.page_size, 24);
    assert_eq!(view.count_label.as_deref(), Some("17 items in Section B"));
    assert_eq!(view.body.ids().len(), 17);
    assert!(ctl.current_page().items.iter().all(|r| r.section.as_str() == "B"));
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn search_composes_with_section_filter() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(vec![
        record(1, "A", 1, "Paracetamol 500mg").with_generic_name("Acetaminophen"),
        record(2, "A", 2, "Panadol Actifast").with_generic_name("Paracetamol"),
        record(3, "B", 1, "Paracetamol syrup"),
        record(4, "A", 3, "Ibuprofen"),
    ]));
    let ctl = listing(gateway, Arc::new(RecordingNotifier::new()));
    ctl.mount().await;

    ctl.set_search_query("PARACETAMOL");
    assert_eq!(ctl.view().total, 3);

    ctl.set_section_filter(SectionFilter::Section(code("A")));
    let ids: Vec<_> = ctl.view().body.ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["1", "2"]);

    // Location codes are searchable too.
    ctl.set_search_query("a3-04");
    assert_eq!(ctl.view().total, 1);
}

#[tokio::test]
async fn grid_and_list_agree_on_the_same_page() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let ctl = listing(gateway, Arc::new(RecordingNotifier::new()));
    ctl.mount().await;
    ctl.change_page(2, 12).unwrap();

    ctl.set_view_mode(ViewMode::Grid);
    let grid = ctl.view();
    ctl.set_view_mode(ViewMode::List);
    let list = ctl.view();

    assert!(matches!(grid.body, ListingBody::Grid { .. }));
    assert!(matches!(list.body, ListingBody::List { .. }));
    assert_eq!(grid.body.ids(), list.body.ids());
    assert_eq!(grid.body.ids().len(), 12);
    assert_eq!((grid.total, grid.page), (list.total, list.page));
}

#[tokio::test]
async fn change_notification_refetches_and_keeps_view_state() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let ctl = listing(gateway.clone(), Arc::new(RecordingNotifier::new()));
    ctl.mount().await;

    ctl.set_section_filter(SectionFilter::Section(code("A")));
    ctl.set_search_query("drug");
    ctl.change_page(2, 12).unwrap();
    let before = ctl.view_state();

    gateway.insert(record(50, "A", 1, "Drug 50"));
    eventually("refetch after insert", || ctl.records().len() == 51).await;

    assert_eq!(gateway.select_calls(), 2);
    assert_eq!(ctl.view_state(), before);
    assert_eq!(ctl.view().total, 18);

    let mut updated = record(0, "D", 1, "Drug 0");
    updated.quantity = 3;
    assert!(gateway.update(updated));
    eventually("refetch after update", || {
        ctl.sections().iter().any(|s| s.as_str() == "D")
    })
    .await;

    assert!(gateway.delete(&ItemId::new("50").unwrap()));
    eventually("refetch after delete", || ctl.records().len() == 50).await;
}

#[tokio::test]
async fn failed_refetch_keeps_data_and_notifies() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let notifier = Arc::new(RecordingNotifier::new());
    let ctl = listing(gateway.clone(), notifier.clone());
    ctl.mount().await;

    gateway.fail_next(1);
    gateway.insert(record(50, "A", 1, "Drug 50"));
    eventually("failure notice", || !notifier.errors().is_empty()).await;

    assert_eq!(ctl.records().len(), 50);
    assert_eq!(notifier.errors(), vec!["Failed to load inventory items".to_string()]);
    assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn failed_initial_load_renders_empty_not_loading() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    gateway.fail_next(1);
    let notifier = Arc::new(RecordingNotifier::new());
    let ctl = listing(gateway, notifier.clone());
    ctl.mount().await;

    let view = ctl.view();
    assert!(!view.loading);
    assert!(matches!(view.body, ListingBody::Empty { .. }));
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn unmount_tears_down_the_subscription() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let ctl = listing(gateway.clone(), Arc::new(RecordingNotifier::new()));
    ctl.mount().await;
    assert_eq!(gateway.subscriber_count(), 1);

    ctl.unmount();
    eventually("listener teardown", || gateway.subscriber_count() == 0).await;

    gateway.insert(record(50, "A", 1, "Drug 50"));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.select_calls(), 1);
    assert_eq!(ctl.records().len(), 50);
}

#[tokio::test]
async fn dropping_the_controller_stops_listening() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let ctl = listing(gateway.clone(), Arc::new(RecordingNotifier::new()));
    ctl.mount().await;

    drop(ctl);
    eventually("listener teardown", || gateway.subscriber_count() == 0).await;
}

#[tokio::test]
async fn indent_success_closes_and_confirms() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()));
    let notifier = Arc::new(RecordingNotifier::new());
    let ctl = listing(gateway, notifier.clone());
    ctl.mount().await;

    ctl.select_record(&ItemId::new("7").unwrap()).unwrap();
    let indent = ctl.indent();
    let props = indent.props();
    assert!(props.visible);
    assert_eq!(props.drug.map(|d| d.name.as_str()), Some("Drug 7"));

    ctl.indent_succeeded();
    assert!(!ctl.indent().is_visible());
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Item added to cart successfully!");
}

#[tokio::test]
async fn empty_cabinet_row_shows_explicit_empty_state() {
    pharmloc_observability::init();

    let gateway = Arc::new(InMemoryGateway::with_records(vec![
        record(1, "H", 1, "Ceftriaxone 1g"),
        record(2, "H", 2, "Gentamicin 80mg"),
    ]));
    let notifier = Arc::new(RecordingNotifier::new());
    let cabinet = CabinetDrillDown::new(gateway.clone(), notifier.clone(), DrillDownConfig::default());
    let map = FloorPlanController::new(FloorPlan::pharmacy(), cabinet);

    map.select_zone(&code("H")).await.unwrap();
    map.cabinet().select_row(ShelfRow::new(3).unwrap()).await.unwrap();

    let view = map.cabinet().view().unwrap();
    assert_eq!(view.title, "Cabinet H");
    assert_eq!(
        view.body,
        CabinetBody::Empty {
            message: "No items found in Row 3".to_string()
        }
    );
    assert!(view.rows.iter().any(|r| r.selected && r.row.get() == 3));
    assert!(notifier.notices().is_empty());

    map.close();
    assert_eq!(map.cabinet().state(), DrillDownState::Closed);
    assert_eq!(gateway.select_calls(), 2);
}

/// Gateway whose first select blocks until released; later selects answer
/// immediately.
struct ScriptedGateway {
    calls: AtomicUsize,
    release: Notify,
    first: Vec<InventoryRecord>,
    rest: Vec<InventoryRecord>,
    feed: ChangeFeed,
}

impl ScriptedGateway {
    fn new(first: Vec<InventoryRecord>, rest: Vec<InventoryRecord>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
            first,
            rest,
            feed: ChangeFeed::default(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InventoryGateway for ScriptedGateway {
    async fn select(&self, _query: &SelectQuery) -> Result<Vec<InventoryRecord>, GatewayError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.release.notified().await;
            return Ok(self.first.clone());
        }
        Ok(self.rest.clone())
    }

    fn subscribe(&self, table: &str) -> Result<ChangeSubscription, GatewayError> {
        Ok(self.feed.subscribe(table))
    }
}

#[tokio::test]
async fn superseded_response_is_discarded() {
    pharmloc_observability::init();

    let stale = vec![record(1, "A", 1, "Stale")];
    let fresh = vec![record(1, "A", 1, "Fresh"), record(2, "B", 1, "Fresh too")];
    let gateway = Arc::new(ScriptedGateway::new(stale, fresh));
    let ctl = listing(gateway.clone(), Arc::new(RecordingNotifier::new()));

    let mounting = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.mount().await }
    });
    eventually("first select in flight", || gateway.calls() == 1).await;

    ctl.refresh().await;
    assert_eq!(ctl.records().len(), 2);

    gateway.release.notify_one();
    mounting.await.unwrap();

    let names: Vec<_> = ctl.records().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Fresh", "Fresh too"]);
}

#[tokio::test]
async fn response_after_unmount_is_discarded() {
    pharmloc_observability::init();

    let gateway = Arc::new(ScriptedGateway::new(vec![record(1, "A", 1, "Late")], Vec::new()));
    let ctl = listing(gateway.clone(), Arc::new(RecordingNotifier::new()));

    let mounting = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.mount().await }
    });
    eventually("first select in flight", || gateway.calls() == 1).await;

    ctl.unmount();
    gateway.release.notify_one();
    mounting.await.unwrap();

    assert!(ctl.records().is_empty());
    assert!(ctl.view().loading);
}

#[tokio::test]
async fn superseded_shelf_response_is_discarded() {
    pharmloc_observability::init();

    let gateway = Arc::new(ScriptedGateway::new(
        vec![record(1, "H", 1, "Row one")],
        vec![record(2, "H", 2, "Row two")],
    ));
    let cabinet = Arc::new(CabinetDrillDown::new(
        gateway.clone(),
        Arc::new(RecordingNotifier::new()),
        DrillDownConfig::default(),
    ));

    let opening = tokio::spawn({
        let cabinet = cabinet.clone();
        async move { cabinet.open(code("H")).await }
    });
    eventually("row 1 select in flight", || gateway.calls() == 1).await;

    cabinet.select_row(ShelfRow::new(2).unwrap()).await.unwrap();
    gateway.release.notify_one();
    opening.await.unwrap();

    match cabinet.state() {
        DrillDownState::Open {
            row,
            phase: DrillDownPhase::Loaded(items),
            ..
        } => {
            assert_eq!(row, ShelfRow::new(2).ok());
            assert_eq!(items[0].name, "Row two");
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn switching_zone_discards_the_previous_zone_reply() {
    pharmloc_observability::init();

    let gateway = Arc::new(ScriptedGateway::new(
        vec![record(1, "H", 1, "Ceftriaxone 1g")],
        vec![record(2, "I", 1, "Ampicillin 500mg")],
    ));
    let cabinet = Arc::new(CabinetDrillDown::new(
        gateway.clone(),
        Arc::new(RecordingNotifier::new()),
        DrillDownConfig::default(),
    ));

    let opening_h = tokio::spawn({
        let cabinet = cabinet.clone();
        async move { cabinet.open(code("H")).await }
    });
    eventually("cabinet H select in flight", || gateway.calls() == 1).await;

    cabinet.open(code("I")).await;
    gateway.release.notify_one();
    opening_h.await.unwrap();

    assert_eq!(gateway.calls(), 2);
    assert_eq!(cabinet.zone(), Some(code("I")));
    assert_eq!(cabinet.selected_row(), Some(ShelfRow::FIRST));
    let names: Vec<_> = cabinet.items().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Ampicillin 500mg"]);
}

#[tokio::test]
async fn renamed_table_flows_from_gateway_config_to_both_controllers() {
    pharmloc_observability::init();

    let config = GatewayConfig::from_lookup(|key| match key {
        "PHARMLOC_GATEWAY_URL" => Some("http://localhost:54321".to_string()),
        "PHARMLOC_GATEWAY_KEY" => Some("anon".to_string()),
        "PHARMLOC_TABLE" => Some("inventory_items_staging".to_string()),
        _ => None,
    })
    .unwrap();
    let gateway = Arc::new(InMemoryGateway::with_records(fifty_records()).with_table(config.table.clone()));
    let notifier = Arc::new(RecordingNotifier::new());

    let ctl = InventoryListingController::new(gateway.clone(), notifier.clone(), ListingConfig::for_gateway(&config));
    ctl.mount().await;
    assert_eq!(ctl.records().len(), 50);
    assert_eq!(gateway.subscriber_count(), 1);

    let cabinet = CabinetDrillDown::new(gateway.clone(), notifier.clone(), DrillDownConfig::for_gateway(&config));
    cabinet.open(code("A")).await;
    assert!(matches!(
        cabinet.state(),
        DrillDownState::Open { phase: DrillDownPhase::Loaded(_), .. }
    ));
    assert!(notifier.errors().is_empty());
}
