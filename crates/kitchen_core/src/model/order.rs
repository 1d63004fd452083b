//! Order domain model.
//!
//! # Responsibility
//! - Define the canonical order record owned by the persistence adapter.
//! - Validate caller input before it reaches persistence.
//!
//! # Invariants
//! - `order_number` is immutable once assigned.
//! - `client_context_id` is unique across all orders.
//! - `items` is never empty and `total_amount` is never negative.
//! - A status timestamp is set the first time its status is entered and is
//!   never overwritten; timestamps for statuses not yet reached are `None`.

use crate::model::status::OrderStatus;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Human-readable order identifier, e.g. `ORDER-0042`.
pub type OrderNumber = String;

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            notes: None,
            price: None,
        }
    }
}

/// Canonical order record.
///
/// Timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_number: OrderNumber,
    /// Caller-supplied idempotency key.
    pub client_context_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub customer_name: Option<String>,
    /// Normalized E.164 phone, absent when missing or unparseable.
    pub phone_e164: Option<String>,
    pub notes: Option<String>,
    pub total_amount: f64,
    pub received_at: i64,
    pub confirmed_at: Option<i64>,
    pub preparing_at: Option<i64>,
    pub ready_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub cancelled_at: Option<i64>,
}

impl Order {
    /// Returns when `status` was first entered, if it has been.
    pub fn reached_at(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::ReceivedUnconfirmed => Some(self.received_at),
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.preparing_at,
            OrderStatus::Ready => self.ready_at,
            OrderStatus::Completed => self.completed_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    /// Phone usable for outbound notification.
    pub fn notification_phone(&self) -> Option<&str> {
        self.phone_e164
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }
}

/// Raw create-order input as received from the intake caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    #[serde(default)]
    pub client_context_id: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Free-form phone; normalized by the service before persistence.
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
}

/// Validated create-order input handed to the persistence adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub client_context_id: String,
    pub items: Vec<OrderItem>,
    pub customer_name: Option<String>,
    pub phone_e164: Option<String>,
    pub notes: Option<String>,
    pub total_amount: f64,
}

impl NewOrder {
    /// Creates a minimal order input with default optional fields.
    pub fn new(client_context_id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            client_context_id: client_context_id.into(),
            items,
            customer_name: None,
            phone_e164: None,
            notes: None,
            total_amount: 0.0,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.client_context_id.trim().is_empty() {
            return Err(OrderValidationError::MissingClientContextId);
        }
        if self.items.is_empty() {
            return Err(OrderValidationError::EmptyItems);
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(OrderValidationError::BlankItemName { index });
            }
            if item.quantity == 0 {
                return Err(OrderValidationError::ZeroQuantity { index });
            }
            if let Some(price) = item.price {
                if !price.is_finite() || price < 0.0 {
                    return Err(OrderValidationError::InvalidItemPrice { index });
                }
            }
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err(OrderValidationError::InvalidTotalAmount);
        }
        Ok(())
    }
}

impl NewOrderRequest {
    /// Converts raw input into validated form, attaching an already
    /// normalized phone.
    ///
    /// Blank optional strings collapse to `None`.
    pub fn into_new_order(
        self,
        phone_e164: Option<String>,
    ) -> Result<NewOrder, OrderValidationError> {
        let client_context_id = non_blank(self.client_context_id)
            .ok_or(OrderValidationError::MissingClientContextId)?;
        let items = self.items.ok_or(OrderValidationError::EmptyItems)?;
        let order = NewOrder {
            client_context_id,
            items: items.into_iter().map(normalize_item).collect(),
            customer_name: non_blank(self.customer_name),
            phone_e164,
            notes: non_blank(self.notes),
            total_amount: self.total_amount.unwrap_or(0.0),
        };
        order.validate()?;
        Ok(order)
    }
}

fn normalize_item(item: OrderItem) -> OrderItem {
    OrderItem {
        name: item.name.trim().to_string(),
        quantity: item.quantity,
        notes: non_blank(item.notes),
        price: item.price,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Create-order validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    MissingClientContextId,
    EmptyItems,
    BlankItemName { index: usize },
    ZeroQuantity { index: usize },
    InvalidItemPrice { index: usize },
    InvalidTotalAmount,
    /// Request body could not be decoded at all.
    MalformedBody(String),
}

impl Display for OrderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClientContextId => write!(f, "client_context_id is required"),
            Self::EmptyItems => write!(f, "items array is required and cannot be empty"),
            Self::BlankItemName { index } => write!(f, "items[{index}].name must not be blank"),
            Self::ZeroQuantity { index } => {
                write!(f, "items[{index}].quantity must be at least 1")
            }
            Self::InvalidItemPrice { index } => {
                write!(f, "items[{index}].price must be a non-negative number")
            }
            Self::InvalidTotalAmount => write!(f, "total_amount must be a non-negative number"),
            Self::MalformedBody(details) => write!(f, "malformed request body: {details}"),
        }
    }
}

impl Error for OrderValidationError {}
