//! Outbound ready-order notifications.
//!
//! # Responsibility
//! - Define the `ReadyNotifier` seam used by the kitchen service.
//! - Provide the webhook sender configured at startup.
//!
//! # Invariants
//! - Delivery is at-most-once and best-effort; nothing here retries.
//! - Notification failures are reported to the caller as values and never
//!   affect order state.

use crate::config::NotifierConfig;
use crate::model::order::{Order, OrderItem, OrderNumber};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod webhook;

pub use webhook::WebhookNotifier;

/// Fixed-shape payload posted when an order becomes ready.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyNotification {
    pub order_number: OrderNumber,
    pub customer_name: Option<String>,
    pub phone_e164: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    /// Unix epoch milliseconds.
    pub ready_at: Option<i64>,
}

impl ReadyNotification {
    /// Builds the payload for a ready order; `None` when the order has no
    /// usable phone.
    pub fn from_order(order: &Order) -> Option<Self> {
        let phone = order.notification_phone()?;
        Some(Self {
            order_number: order.order_number.clone(),
            customer_name: order.customer_name.clone(),
            phone_e164: phone.to_string(),
            items: order.items.clone(),
            total_amount: order.total_amount,
            ready_at: order.ready_at,
        })
    }
}

/// Result of a delivery attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No destination configured.
    Skipped,
}

/// Delivery failure.
#[derive(Debug)]
pub enum NotifyError {
    /// Network-level failure, classified as
    /// `timeout|connection|dns|tls|transport`.
    Transport { kind: &'static str, message: String },
    /// Webhook answered with a non-success status.
    HttpStatus(u16),
    Serialization(serde_json::Error),
}

impl NotifyError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { kind, .. } => *kind,
            Self::HttpStatus(_) => "http_status",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { kind, message } => write!(f, "webhook {kind} error: {message}"),
            Self::HttpStatus(status) => write!(f, "webhook responded with HTTP {status}"),
            Self::Serialization(err) => write!(f, "webhook payload serialization failed: {err}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

/// Sends ready-order notifications.
pub trait ReadyNotifier: Send + Sync {
    fn notify_ready(&self, notification: &ReadyNotification) -> Result<NotifyOutcome, NotifyError>;
}

impl<T: ReadyNotifier + ?Sized> ReadyNotifier for Box<T> {
    fn notify_ready(&self, notification: &ReadyNotification) -> Result<NotifyOutcome, NotifyError> {
        (**self).notify_ready(notification)
    }
}

impl<T: ReadyNotifier + ?Sized> ReadyNotifier for Arc<T> {
    fn notify_ready(&self, notification: &ReadyNotification) -> Result<NotifyOutcome, NotifyError> {
        (**self).notify_ready(notification)
    }
}

/// Builds the notifier described by `config`.
pub fn build_notifier(config: &NotifierConfig) -> Box<dyn ReadyNotifier> {
    Box::new(WebhookNotifier::new(
        config.webhook_url.clone(),
        config.timeout_ms,
    ))
}
