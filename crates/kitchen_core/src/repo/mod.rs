//! Persistence adapter contracts and backing-store implementations.
//!
//! # Responsibility
//! - Define the `OrderStore` capability set used by the kitchen service.
//! - Keep SQL and row-mapping details inside the persistence boundary.
//! - Resolve the configured backend once, through an explicit factory.
//!
//! # Invariants
//! - Stores own the canonical order record; callers re-read before mutating.
//! - Every order mutation appends exactly one event in the same transaction.
//! - Stores perform no transition validation; that lives in the service.

use crate::config::{StoreBackend, StoreConfig};
use crate::db::DbError;
use crate::model::event::OrderEvent;
use crate::model::order::{NewOrder, Order, OrderNumber, OrderValidationError};
use crate::model::status::OrderStatus;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod order_store;

pub use order_store::SqliteOrderStore;

pub type RepoResult<T> = Result<T, RepoError>;

/// Source of "now" in Unix epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Persistence error for order and event operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(OrderValidationError),
    Db(DbError),
    NotFound(OrderNumber),
    /// Persisted status no longer matches the caller's expectation.
    StatusConflict {
        order_number: OrderNumber,
        expected: OrderStatus,
        actual: OrderStatus,
    },
    InvalidData(String),
    Serialization(serde_json::Error),
    LockPoisoned,
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(order_number) => write!(f, "order {order_number} not found"),
            Self::StatusConflict {
                order_number,
                expected,
                actual,
            } => write!(
                f,
                "order {order_number} changed concurrently: expected status {expected}, found {actual}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted order data: {message}"),
            Self::Serialization(err) => write!(f, "order serialization failed: {err}"),
            Self::LockPoisoned => write!(f, "order store connection lock poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "order store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "order store requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrderValidationError> for RepoError {
    fn from(value: OrderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence capability set for orders and their audit events.
pub trait OrderStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Prepares the backing store. Safe to call repeatedly.
    fn initialize(&self) -> RepoResult<()>;

    /// Creates an order, or returns the existing one for the same
    /// `client_context_id` without appending an event.
    fn create_order(&self, order: &NewOrder) -> RepoResult<Order>;

    /// Unconditionally moves an order to `to_status` and appends a
    /// `STATUS_CHANGE` event.
    fn update_order_status(
        &self,
        order_number: &str,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order>;

    /// Like `update_order_status`, but only applies while the persisted status
    /// still equals `expected_from`.
    fn transition_order_status(
        &self,
        order_number: &str,
        expected_from: OrderStatus,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order>;

    /// Non-terminal orders, oldest `received_at` first.
    fn get_active_orders(&self) -> RepoResult<Vec<Order>>;

    /// Returns `Ok(None)` for an unknown order number.
    fn get_order_by_id(&self, order_number: &str) -> RepoResult<Option<Order>>;

    /// Appends one event as given.
    fn log_event(&self, event: &OrderEvent) -> RepoResult<()>;

    /// Events for one order in append order.
    fn list_events(&self, order_number: &str) -> RepoResult<Vec<OrderEvent>>;
}

impl<T: OrderStore + ?Sized> OrderStore for Box<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn initialize(&self) -> RepoResult<()> {
        (**self).initialize()
    }

    fn create_order(&self, order: &NewOrder) -> RepoResult<Order> {
        (**self).create_order(order)
    }

    fn update_order_status(
        &self,
        order_number: &str,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        (**self).update_order_status(order_number, to_status, actor_id, notes)
    }

    fn transition_order_status(
        &self,
        order_number: &str,
        expected_from: OrderStatus,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        (**self).transition_order_status(order_number, expected_from, to_status, actor_id, notes)
    }

    fn get_active_orders(&self) -> RepoResult<Vec<Order>> {
        (**self).get_active_orders()
    }

    fn get_order_by_id(&self, order_number: &str) -> RepoResult<Option<Order>> {
        (**self).get_order_by_id(order_number)
    }

    fn log_event(&self, event: &OrderEvent) -> RepoResult<()> {
        (**self).log_event(event)
    }

    fn list_events(&self, order_number: &str) -> RepoResult<Vec<OrderEvent>> {
        (**self).list_events(order_number)
    }
}

impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn initialize(&self) -> RepoResult<()> {
        (**self).initialize()
    }

    fn create_order(&self, order: &NewOrder) -> RepoResult<Order> {
        (**self).create_order(order)
    }

    fn update_order_status(
        &self,
        order_number: &str,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        (**self).update_order_status(order_number, to_status, actor_id, notes)
    }

    fn transition_order_status(
        &self,
        order_number: &str,
        expected_from: OrderStatus,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<Order> {
        (**self).transition_order_status(order_number, expected_from, to_status, actor_id, notes)
    }

    fn get_active_orders(&self) -> RepoResult<Vec<Order>> {
        (**self).get_active_orders()
    }

    fn get_order_by_id(&self, order_number: &str) -> RepoResult<Option<Order>> {
        (**self).get_order_by_id(order_number)
    }

    fn log_event(&self, event: &OrderEvent) -> RepoResult<()> {
        (**self).log_event(event)
    }

    fn list_events(&self, order_number: &str) -> RepoResult<Vec<OrderEvent>> {
        (**self).list_events(order_number)
    }
}

/// Opens and initializes the configured order store.
pub fn open_order_store(config: &StoreConfig) -> RepoResult<Box<dyn OrderStore>> {
    let store: Box<dyn OrderStore> = match &config.backend {
        StoreBackend::Sqlite { path } => Box::new(SqliteOrderStore::open(path)?),
        StoreBackend::Memory => Box::new(SqliteOrderStore::open_in_memory()?),
    };
    store.initialize()?;

    info!(
        "event=store_open module=repo status=ok backend={} mode={}",
        store.backend_name(),
        config.backend.as_str()
    );
    Ok(store)
}

/// Wall-clock time source.
pub fn system_clock() -> Clock {
    Arc::new(now_epoch_ms)
}

/// Current Unix time in milliseconds; `0` if the clock is before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
