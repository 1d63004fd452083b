//! SQLite-backed order store.
//!
//! # Responsibility
//! - Persist orders and append-only events in the `orders` / `order_events`
//!   tables.
//! - Make idempotent creation and status changes atomic per call.
//!
//! # Invariants
//! - Each mutating call runs inside one IMMEDIATE transaction, so lookup,
//!   write and event append commit together.
//! - Status timestamps are first-write-wins; an existing value is never
//!   overwritten.
//! - Read paths reject malformed persisted rows instead of masking them.

use super::{system_clock, Clock, OrderStore, RepoError, RepoResult};
use crate::db::migrations::{apply_migrations, current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use crate::model::event::{OrderEvent, OrderEventKind};
use crate::model::order::{NewOrder, Order, OrderItem};
use crate::model::status::OrderStatus;
use crate::util::order_number::generate_order_number;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const ORDER_SELECT_SQL: &str = "SELECT
    order_number,
    client_context_id,
    status,
    items_json,
    customer_name,
    phone_e164,
    notes,
    total_amount,
    received_at,
    confirmed_at,
    preparing_at,
    ready_at,
    completed_at,
    cancelled_at
FROM orders";

const EVENT_SELECT_SQL: &str = "SELECT
    event_id,
    order_number,
    event_type,
    from_status,
    to_status,
    occurred_at,
    actor_id,
    notes
FROM order_events";

const REQUIRED_TABLES: [&str; 2] = ["orders", "order_events"];

/// Order store over one SQLite connection.
///
/// The connection sits behind a mutex, which serializes all calls made
/// through the same store.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
    clock: Clock,
}

impl SqliteOrderStore {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_schema_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock: system_clock(),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Replaces the time source used for `received_at`, status timestamps
    /// and event times.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    fn change_status(
        &self,
        order_number: &str,
        expected_from: Option<OrderStatus>,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = load_order(&tx, order_number)?
            .ok_or_else(|| RepoError::NotFound(order_number.to_string()))?;
        if let Some(expected) = expected_from {
            if current.status != expected {
                return Err(RepoError::StatusConflict {
                    order_number: current.order_number,
                    expected,
                    actual: current.status,
                });
            }
        }

        let now = self.now();
        match reached_at_column(to_status) {
            Some(column) => tx.execute(
                &format!(
                    "UPDATE orders
                     SET status = ?1, {column} = COALESCE({column}, ?2)
                     WHERE order_number = ?3;"
                ),
                params![to_status.as_str(), now, order_number],
            )?,
            None => tx.execute(
                "UPDATE orders SET status = ?1 WHERE order_number = ?2;",
                params![to_status.as_str(), order_number],
            )?,
        };

        let event = OrderEvent::status_change(
            order_number,
            current.status,
            to_status,
            now,
            actor_id,
            notes,
        );
        insert_event(&tx, &event)?;

        let updated = load_order(&tx, order_number)?.ok_or_else(|| {
            RepoError::InvalidData(format!("order {order_number} missing after status update"))
        })?;
        tx.commit()?;

        info!(
            "event=order_status module=repo status=ok order_number={} from={} to={}",
            updated.order_number, current.status, to_status
        );
        Ok(updated)
    }
}

impl OrderStore for SqliteOrderStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn initialize(&self) -> RepoResult<()> {
        let mut conn = self.lock()?;
        apply_migrations(&mut conn)?;
        ensure_schema_ready(&conn)
    }

    fn create_order(&self, order: &NewOrder) -> RepoResult<Order> {
        order.validate()?;
        let items_json = serde_json::to_string(&order.items)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(existing) = load_order_by_context(&tx, &order.client_context_id)? {
            info!(
                "event=order_create module=repo status=ok outcome=existing order_number={}",
                existing.order_number
            );
            return Ok(existing);
        }

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM orders;", [], |row| row.get(0))?;
        let order_number = generate_order_number(u64::try_from(count).unwrap_or(0));
        let received_at = self.now();

        tx.execute(
            "INSERT INTO orders (
                order_number,
                client_context_id,
                status,
                items_json,
                customer_name,
                phone_e164,
                notes,
                total_amount,
                received_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                order_number.as_str(),
                order.client_context_id.as_str(),
                OrderStatus::ReceivedUnconfirmed.as_str(),
                items_json,
                order.customer_name.as_deref(),
                order.phone_e164.as_deref(),
                order.notes.as_deref(),
                order.total_amount,
                received_at,
            ],
        )?;
        insert_event(&tx, &OrderEvent::created(order_number.as_str(), received_at))?;

        let created = load_order(&tx, &order_number)?.ok_or_else(|| {
            RepoError::InvalidData(format!("order {order_number} missing after insert"))
        })?;
        tx.commit()?;

        info!(
            "event=order_create module=repo status=ok outcome=created order_number={} item_count={}",
            created.order_number,
            created.items.len()
        );
        Ok(created)
    }

    fn update_order_status(
        &self,
        order_number: &str,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        self.change_status(order_number, None, to_status, actor_id, notes)
    }

    fn transition_order_status(
        &self,
        order_number: &str,
        expected_from: OrderStatus,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        self.change_status(order_number, Some(expected_from), to_status, actor_id, notes)
    }

    fn get_active_orders(&self) -> RepoResult<Vec<Order>> {
        let conn = self.lock()?;
        let placeholders = vec!["?"; OrderStatus::ACTIVE.len()].join(", ");
        let sql = format!(
            "{ORDER_SELECT_SQL}
             WHERE status IN ({placeholders})
             ORDER BY received_at ASC, rowid ASC;"
        );
        let bind_values = OrderStatus::ACTIVE
            .iter()
            .map(|status| Value::Text(status.as_str().to_string()));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(parse_order_row(row)?);
        }
        Ok(orders)
    }

    fn get_order_by_id(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let conn = self.lock()?;
        load_order(&conn, order_number)
    }

    fn log_event(&self, event: &OrderEvent) -> RepoResult<()> {
        let conn = self.lock()?;
        insert_event(&conn, event)
    }

    fn list_events(&self, order_number: &str) -> RepoResult<Vec<OrderEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{EVENT_SELECT_SQL} WHERE order_number = ?1 ORDER BY seq ASC;"
        ))?;
        let mut rows = stmt.query([order_number])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

fn load_order(conn: &Connection, order_number: &str) -> RepoResult<Option<Order>> {
    let mut stmt = conn.prepare(&format!("{ORDER_SELECT_SQL} WHERE order_number = ?1;"))?;
    let mut rows = stmt.query([order_number])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_order_row(row)?)),
        None => Ok(None),
    }
}

fn load_order_by_context(conn: &Connection, client_context_id: &str) -> RepoResult<Option<Order>> {
    let order_number: Option<String> = conn
        .query_row(
            "SELECT order_number FROM orders WHERE client_context_id = ?1;",
            [client_context_id],
            |row| row.get(0),
        )
        .optional()?;
    match order_number {
        Some(order_number) => load_order(conn, &order_number),
        None => Ok(None),
    }
}

fn insert_event(conn: &Connection, event: &OrderEvent) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO order_events (
            event_id,
            order_number,
            event_type,
            from_status,
            to_status,
            occurred_at,
            actor_id,
            notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            event.event_id.to_string(),
            event.order_number.as_str(),
            event.kind.as_str(),
            event.from_status.map(OrderStatus::as_str),
            event.to_status.as_str(),
            event.occurred_at,
            event.actor_id.as_str(),
            event.notes.as_deref(),
        ],
    )?;
    Ok(())
}

fn parse_order_row(row: &Row<'_>) -> RepoResult<Order> {
    let order_number: String = row.get("order_number")?;
    let status = parse_status_column(row.get("status")?, "orders.status")?;

    let items_json: String = row.get("items_json")?;
    let items: Vec<OrderItem> = serde_json::from_str(&items_json).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid items_json for order {order_number}: {err}"
        ))
    })?;

    Ok(Order {
        order_number,
        client_context_id: row.get("client_context_id")?,
        status,
        items,
        customer_name: row.get("customer_name")?,
        phone_e164: row.get("phone_e164")?,
        notes: row.get("notes")?,
        total_amount: row.get("total_amount")?,
        received_at: row.get("received_at")?,
        confirmed_at: row.get("confirmed_at")?,
        preparing_at: row.get("preparing_at")?,
        ready_at: row.get("ready_at")?,
        completed_at: row.get("completed_at")?,
        cancelled_at: row.get("cancelled_at")?,
    })
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<OrderEvent> {
    let event_id_text: String = row.get("event_id")?;
    let event_id = Uuid::parse_str(&event_id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{event_id_text}` in order_events.event_id"
        ))
    })?;

    let kind_text: String = row.get("event_type")?;
    let kind = OrderEventKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid event type `{kind_text}` in order_events.event_type"
        ))
    })?;

    let from_status = match row.get::<_, Option<String>>("from_status")? {
        Some(value) if !value.is_empty() => {
            Some(parse_status_column(value, "order_events.from_status")?)
        }
        _ => None,
    };

    Ok(OrderEvent {
        event_id,
        order_number: row.get("order_number")?,
        kind,
        from_status,
        to_status: parse_status_column(row.get("to_status")?, "order_events.to_status")?,
        occurred_at: row.get("occurred_at")?,
        actor_id: row.get("actor_id")?,
        notes: row.get("notes")?,
    })
}

fn parse_status_column(value: String, column: &str) -> RepoResult<OrderStatus> {
    value
        .parse::<OrderStatus>()
        .map_err(|_| RepoError::InvalidData(format!("invalid status `{value}` in {column}")))
}

/// Column recording when `status` was first entered.
fn reached_at_column(status: OrderStatus) -> Option<&'static str> {
    match status {
        OrderStatus::ReceivedUnconfirmed => None,
        OrderStatus::Confirmed => Some("confirmed_at"),
        OrderStatus::Preparing => Some("preparing_at"),
        OrderStatus::Ready => Some("ready_at"),
        OrderStatus::Completed => Some("completed_at"),
        OrderStatus::Cancelled => Some("cancelled_at"),
    }
}

fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
