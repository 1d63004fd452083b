//! Dashboard client against a live loopback server.

use kitchen_cli::commands::{advance, ensure_allowed, AdvanceArgs};
use kitchen_cli::{ApiClient, CliError, Config};
use kitchen_core::{KitchenService, NotifyOutcome, OrderStatus, OrderStore, ReadyNotifier, SqliteOrderStore};
use kitchen_server::{build_router, AppState};
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;

const API_KEY: &str = "cli-test-key";

struct NoopNotifier;

impl ReadyNotifier for NoopNotifier {
    fn notify_ready(
        &self,
        _notification: &kitchen_core::ReadyNotification,
    ) -> Result<NotifyOutcome, kitchen_core::NotifyError> {
        Ok(NotifyOutcome::Skipped)
    }
}

/// Serves a fresh in-memory kitchen on a loopback port for the rest of the
/// test process.
fn spawn_server() -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("runtime should build");
        runtime.block_on(async move {
            let store: Box<dyn OrderStore> =
                Box::new(SqliteOrderStore::open_in_memory().expect("store should open"));
            let notifier: Box<dyn ReadyNotifier> = Box::new(NoopNotifier);
            let state = AppState::new(
                KitchenService::new(store, notifier),
                Some(API_KEY.to_string()),
            );
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("listener should bind");
            tx.send(listener.local_addr().expect("local addr"))
                .expect("address should be sent");
            axum::serve(listener, build_router(state))
                .await
                .expect("server should run");
        });
    });
    rx.recv().expect("server should report its address")
}

fn config(addr: SocketAddr, user_id: Option<&str>, role: &str) -> Config {
    Config {
        base_url: format!("http://{addr}"),
        user_id: user_id.map(str::to_string),
        role: role.to_string(),
        timeout_ms: 5_000,
    }
}

fn create_order(addr: SocketAddr, context: &str, customer: &str) {
    ureq::post(&format!("http://{addr}/api/orders"))
        .set("x-api-key", API_KEY)
        .send_json(serde_json::json!({
            "client_context_id": context,
            "customer_name": customer,
            "items": [{ "name": "Tacos", "quantity": 2 }]
        }))
        .expect("intake should accept order");
}

#[test]
fn board_detail_and_advance_round_trip() {
    let addr = spawn_server();
    create_order(addr, "ctx-1", "Ana");
    create_order(addr, "ctx-2", "Luis");
    let client = ApiClient::new(&config(addr, Some("cook-1"), "KITCHEN"));

    let board = client.active_orders().unwrap();
    let numbers: Vec<_> = board.iter().map(|order| order.order_number.as_str()).collect();
    assert_eq!(numbers, vec!["ORDER-0001", "ORDER-0002"]);

    let next = client.next_statuses("ORDER-0001").unwrap();
    assert_eq!(next.status, OrderStatus::ReceivedUnconfirmed);
    assert_eq!(
        next.next_statuses,
        vec![OrderStatus::Confirmed, OrderStatus::Cancelled]
    );

    advance(
        &client,
        &AdvanceArgs {
            order_number: "ORDER-0001".to_string(),
            to_status: "confirmed".to_string(),
            notes: Some("seen".to_string()),
        },
    )
    .unwrap();

    let order = client.order("ORDER-0001").unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(order.confirmed_at.is_some());

    let events = client.order_events("ORDER-0001").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].actor_id, "cook-1");
    assert_eq!(events[1].notes.as_deref(), Some("seen"));
}

#[test]
fn advance_refuses_targets_not_served_by_core() {
    let addr = spawn_server();
    create_order(addr, "ctx-1", "Ana");
    let client = ApiClient::new(&config(addr, Some("cook-1"), "KITCHEN"));

    let err = advance(
        &client,
        &AdvanceArgs {
            order_number: "ORDER-0001".to_string(),
            to_status: "READY".to_string(),
            notes: None,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CliError::TransitionRefused {
            from: OrderStatus::ReceivedUnconfirmed,
            to: OrderStatus::Ready,
            ..
        }
    ));
    assert_eq!(
        client.order("ORDER-0001").unwrap().status,
        OrderStatus::ReceivedUnconfirmed
    );

    let next = client.next_statuses("ORDER-0001").unwrap();
    assert!(ensure_allowed(&next, OrderStatus::Cancelled).is_ok());
}

#[test]
fn status_table_is_served_by_core() {
    let addr = spawn_server();
    let client = ApiClient::new(&config(addr, Some("cook-1"), "ADMIN"));

    let rows = client.status_table().unwrap();
    assert_eq!(rows.len(), OrderStatus::ALL.len());
    for row in rows {
        assert_eq!(row.next_statuses, row.status.allowed_next().to_vec());
        assert_eq!(row.terminal, row.status.is_terminal());
    }
}

#[test]
fn server_errors_surface_with_status_and_message() {
    let addr = spawn_server();

    let anonymous = ApiClient::new(&config(addr, None, "KITCHEN"));
    match anonymous.active_orders() {
        Err(CliError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication required");
        }
        other => panic!("expected 401, got {other:?}"),
    }

    let client = ApiClient::new(&config(addr, Some("cook-1"), "KITCHEN"));
    match client.order("ORDER-0404") {
        Err(CliError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Order not found");
        }
        other => panic!("expected 404, got {other:?}"),
    }
}
