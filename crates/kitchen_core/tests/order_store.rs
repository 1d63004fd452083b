use kitchen_core::{
    Clock, NewOrder, OrderEvent, OrderEventKind, OrderItem, OrderStatus, OrderStore, RepoError,
    SqliteOrderStore,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

fn stepping_clock(start: i64, step: i64) -> Clock {
    let next = Arc::new(AtomicI64::new(start));
    Arc::new(move || next.fetch_add(step, Ordering::SeqCst))
}

fn store() -> SqliteOrderStore {
    SqliteOrderStore::open_in_memory()
        .unwrap()
        .with_clock(stepping_clock(1_000, 10))
}

fn new_order(context: &str) -> NewOrder {
    NewOrder::new(context, vec![OrderItem::new("Mofongo", 1)])
}

#[test]
fn create_assigns_sequential_numbers_and_defaults() {
    let store = store();

    let first = store.create_order(&new_order("ctx-a")).unwrap();
    let second = store.create_order(&new_order("ctx-b")).unwrap();

    assert_eq!(first.order_number, "ORDER-0001");
    assert_eq!(second.order_number, "ORDER-0002");
    assert_eq!(first.status, OrderStatus::ReceivedUnconfirmed);
    assert_eq!(first.total_amount, 0.0);
    assert_eq!(first.customer_name, None);
    assert_eq!(first.phone_e164, None);
    assert_eq!(first.received_at, 1_000);
    assert_eq!(first.confirmed_at, None);
    assert_eq!(first.ready_at, None);
    assert_eq!(first.cancelled_at, None);
}

#[test]
fn create_is_idempotent_per_client_context_id() {
    let store = store();

    let mut original = new_order("abc");
    original.customer_name = Some("Ana".to_string());
    let created = store.create_order(&original).unwrap();

    let mut retry = new_order("abc");
    retry.customer_name = Some("Someone Else".to_string());
    retry.items = vec![OrderItem::new("Tostones", 3)];
    retry.total_amount = 99.0;
    let repeated = store.create_order(&retry).unwrap();

    assert_eq!(repeated, created);
    assert_eq!(repeated.customer_name.as_deref(), Some("Ana"));

    let events = store.list_events(&created.order_number).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, OrderEventKind::OrderCreated);
    assert_eq!(events[0].from_status, None);
    assert_eq!(events[0].to_status, OrderStatus::ReceivedUnconfirmed);
    assert_eq!(events[0].actor_id, "system");
    assert_eq!(events[0].occurred_at, created.received_at);

    let next = store.create_order(&new_order("def")).unwrap();
    assert_eq!(next.order_number, "ORDER-0002");
}

#[test]
fn create_rejects_invalid_input_before_writing() {
    let store = store();
    let err = store
        .create_order(&NewOrder::new("ctx", Vec::new()))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.get_order_by_id("ORDER-0001").unwrap().is_none());
}

#[test]
fn items_and_optional_fields_survive_persistence() {
    let store = store();
    let mut order = new_order("ctx-items");
    order.items = vec![
        OrderItem {
            name: "Pollo guisado".to_string(),
            quantity: 2,
            notes: Some("no onions".to_string()),
            price: Some(12.5),
        },
        OrderItem::new("Arroz", 1),
    ];
    order.phone_e164 = Some("+19393415337".to_string());
    order.notes = Some("pickup at 6".to_string());
    order.total_amount = 25.0;

    let created = store.create_order(&order).unwrap();
    let loaded = store
        .get_order_by_id(&created.order_number)
        .unwrap()
        .unwrap();

    assert_eq!(loaded.items, order.items);
    assert_eq!(loaded.phone_e164.as_deref(), Some("+19393415337"));
    assert_eq!(loaded.notes.as_deref(), Some("pickup at 6"));
    assert_eq!(loaded.total_amount, 25.0);
}

#[test]
fn update_sets_status_timestamp_and_appends_event() {
    let store = store();
    let created = store.create_order(&new_order("ctx")).unwrap();

    let confirmed = store
        .update_order_status(
            &created.order_number,
            OrderStatus::Confirmed,
            Some("cook-1"),
            Some("on it"),
        )
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.confirmed_at, Some(1_010));
    assert_eq!(confirmed.received_at, created.received_at);
    assert_eq!(confirmed.preparing_at, None);

    let events = store.list_events(&created.order_number).unwrap();
    assert_eq!(events.len(), 2);
    let change = &events[1];
    assert_eq!(change.kind, OrderEventKind::StatusChange);
    assert_eq!(change.from_status, Some(OrderStatus::ReceivedUnconfirmed));
    assert_eq!(change.to_status, OrderStatus::Confirmed);
    assert_eq!(change.actor_id, "cook-1");
    assert_eq!(change.notes.as_deref(), Some("on it"));
    assert_eq!(change.occurred_at, 1_010);
}

#[test]
fn update_without_actor_records_unknown() {
    let store = store();
    let created = store.create_order(&new_order("ctx")).unwrap();
    store
        .update_order_status(&created.order_number, OrderStatus::Cancelled, None, None)
        .unwrap();

    let events = store.list_events(&created.order_number).unwrap();
    assert_eq!(events[1].actor_id, "unknown");
    assert_eq!(events[1].notes, None);
}

#[test]
fn status_timestamps_are_never_overwritten() {
    let store = store();
    let created = store.create_order(&new_order("ctx")).unwrap();

    let first = store
        .update_order_status(&created.order_number, OrderStatus::Confirmed, None, None)
        .unwrap();
    // The store itself does not validate transitions, so re-entering a status
    // is possible here; the first timestamp must still win.
    store
        .update_order_status(&created.order_number, OrderStatus::ReceivedUnconfirmed, None, None)
        .unwrap();
    let again = store
        .update_order_status(&created.order_number, OrderStatus::Confirmed, None, None)
        .unwrap();

    assert_eq!(again.confirmed_at, first.confirmed_at);
    assert_eq!(again.received_at, created.received_at);
    assert_eq!(store.list_events(&created.order_number).unwrap().len(), 4);
}

#[test]
fn update_unknown_order_returns_not_found() {
    let store = store();
    let err = store
        .update_order_status("ORDER-0404", OrderStatus::Confirmed, None, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(ref id) if id == "ORDER-0404"));
    assert!(store.list_events("ORDER-0404").unwrap().is_empty());
}

#[test]
fn conditional_transition_rejects_stale_expectation() {
    let store = store();
    let created = store.create_order(&new_order("ctx")).unwrap();
    store
        .update_order_status(&created.order_number, OrderStatus::Confirmed, None, None)
        .unwrap();

    let err = store
        .transition_order_status(
            &created.order_number,
            OrderStatus::ReceivedUnconfirmed,
            OrderStatus::Cancelled,
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::StatusConflict {
            expected: OrderStatus::ReceivedUnconfirmed,
            actual: OrderStatus::Confirmed,
            ..
        }
    ));

    let unchanged = store
        .get_order_by_id(&created.order_number)
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, OrderStatus::Confirmed);
    assert_eq!(unchanged.cancelled_at, None);
    assert_eq!(store.list_events(&created.order_number).unwrap().len(), 2);
}

#[test]
fn active_orders_exclude_terminal_and_sort_by_received_at() {
    let store = store();
    let first = store.create_order(&new_order("one")).unwrap();
    let second = store.create_order(&new_order("two")).unwrap();
    let third = store.create_order(&new_order("three")).unwrap();
    let fourth = store.create_order(&new_order("four")).unwrap();

    store
        .update_order_status(&first.order_number, OrderStatus::Cancelled, None, None)
        .unwrap();
    store
        .update_order_status(&third.order_number, OrderStatus::Completed, None, None)
        .unwrap();
    store
        .update_order_status(&fourth.order_number, OrderStatus::Ready, None, None)
        .unwrap();

    let active = store.get_active_orders().unwrap();
    let numbers: Vec<_> = active.iter().map(|order| order.order_number.as_str()).collect();
    assert_eq!(numbers, vec![second.order_number.as_str(), fourth.order_number.as_str()]);
    assert!(active.iter().all(|order| order.status.is_active()));
    assert!(active
        .windows(2)
        .all(|pair| pair[0].received_at <= pair[1].received_at));
}

#[test]
fn active_orders_follow_received_at_not_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db");
    SqliteOrderStore::open(&path)
        .unwrap()
        .with_clock(Arc::new(|| 5_000))
        .create_order(&new_order("late"))
        .unwrap();
    SqliteOrderStore::open(&path)
        .unwrap()
        .with_clock(Arc::new(|| 1_000))
        .create_order(&new_order("early"))
        .unwrap();

    let reopened = SqliteOrderStore::open(&path).unwrap();
    let active = reopened.get_active_orders().unwrap();
    let contexts: Vec<_> = active
        .iter()
        .map(|order| order.client_context_id.as_str())
        .collect();
    assert_eq!(contexts, vec!["early", "late"]);
}

#[test]
fn get_order_by_id_returns_none_for_unknown() {
    let store = store();
    assert!(store.get_order_by_id("ORDER-9999").unwrap().is_none());
}

#[test]
fn log_event_appends_without_referential_checks() {
    let store = store();
    let event = OrderEvent::status_change(
        "ORDER-0777",
        OrderStatus::Preparing,
        OrderStatus::Ready,
        42,
        Some("audit-import"),
        Some("backfilled"),
    );
    let followup = OrderEvent::status_change(
        "ORDER-0777",
        OrderStatus::Ready,
        OrderStatus::Completed,
        43,
        None,
        None,
    );
    store.log_event(&event).unwrap();
    store.log_event(&followup).unwrap();

    let events = store.list_events("ORDER-0777").unwrap();
    assert_eq!(events, vec![event, followup]);
    assert!(store.get_order_by_id("ORDER-0777").unwrap().is_none());
}
