//! Append-only order audit events.
//!
//! # Invariants
//! - Events are never mutated or deleted once appended.
//! - Exactly one event is appended per order creation or status change.

use crate::model::order::OrderNumber;
use crate::model::status::OrderStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actor recorded for events produced by the intake path.
pub const SYSTEM_ACTOR: &str = "system";
/// Actor recorded when a status change carries no identity.
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Kind of audited mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventKind {
    OrderCreated,
    StatusChange,
}

impl OrderEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderCreated => "ORDER_CREATED",
            Self::StatusChange => "STATUS_CHANGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ORDER_CREATED" => Some(Self::OrderCreated),
            "STATUS_CHANGE" => Some(Self::StatusChange),
            _ => None,
        }
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_id: Uuid,
    pub order_number: OrderNumber,
    #[serde(rename = "event_type")]
    pub kind: OrderEventKind,
    /// `None` for creation events.
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    /// Unix epoch milliseconds.
    pub occurred_at: i64,
    pub actor_id: String,
    pub notes: Option<String>,
}

impl OrderEvent {
    /// Builds the creation event for a freshly persisted order.
    pub fn created(order_number: impl Into<OrderNumber>, occurred_at: i64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_number: order_number.into(),
            kind: OrderEventKind::OrderCreated,
            from_status: None,
            to_status: OrderStatus::ReceivedUnconfirmed,
            occurred_at,
            actor_id: SYSTEM_ACTOR.to_string(),
            notes: Some("order created via intake webhook".to_string()),
        }
    }

    /// Builds a status-change event.
    pub fn status_change(
        order_number: impl Into<OrderNumber>,
        from: OrderStatus,
        to: OrderStatus,
        occurred_at: i64,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> Self {
        let actor_id = actor_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(UNKNOWN_ACTOR);
        Self {
            event_id: Uuid::new_v4(),
            order_number: order_number.into(),
            kind: OrderEventKind::StatusChange,
            from_status: Some(from),
            to_status: to,
            occurred_at,
            actor_id: actor_id.to_string(),
            notes: notes
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }
}
