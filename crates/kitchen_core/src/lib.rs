//! Core domain logic for the kitchen order system.
//! This crate is the single source of truth for order lifecycle invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod util;

pub use config::{ConfigError, KitchenConfig, NotifierConfig, StoreBackend, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{OrderEvent, OrderEventKind};
pub use model::order::{
    NewOrder, NewOrderRequest, Order, OrderItem, OrderNumber, OrderValidationError,
};
pub use model::status::{is_valid_transition, OrderStatus, UnknownStatusError};
pub use notify::{
    build_notifier, NotifyError, NotifyOutcome, ReadyNotification, ReadyNotifier,
    WebhookNotifier,
};
pub use repo::{
    now_epoch_ms, open_order_store, system_clock, Clock, OrderStore, RepoError, RepoResult,
    SqliteOrderStore,
};
pub use service::kitchen_service::{
    KitchenService, KitchenServiceError, NextStatuses, ServiceResult,
};
pub use util::order_number::generate_order_number;
pub use util::phone::normalize_phone_to_e164;
