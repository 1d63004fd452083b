//! Kitchen order use-case service.
//!
//! # Responsibility
//! - Normalize intake input and delegate idempotent creation to the store.
//! - Enforce the status transition table before any status write.
//! - Fire the ready notification after a successful move to `READY`.
//!
//! # Invariants
//! - The service keeps no order copy across calls; it re-reads before
//!   every mutation.
//! - A notification failure never fails the status update that caused it.
//! - The status write is conditional on the status the transition was
//!   validated against.

use crate::model::event::OrderEvent;
use crate::model::order::{NewOrderRequest, Order, OrderNumber, OrderValidationError};
use crate::model::status::{is_valid_transition, OrderStatus};
use crate::notify::{NotifyOutcome, ReadyNotification, ReadyNotifier};
use crate::repo::{OrderStore, RepoError};
use crate::util::phone::{normalize_phone_to_e164, DEFAULT_PHONE_REGION};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for kitchen use-cases.
#[derive(Debug)]
pub enum KitchenServiceError {
    Validation(OrderValidationError),
    OrderNotFound(OrderNumber),
    InvalidTransition {
        order_number: OrderNumber,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// Another writer changed the order between validation and write.
    StatusConflict {
        order_number: OrderNumber,
        expected: OrderStatus,
        actual: OrderStatus,
    },
    Repo(RepoError),
}

impl Display for KitchenServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::OrderNotFound(order_number) => write!(f, "order {order_number} not found"),
            Self::InvalidTransition { from, to, .. } => {
                write!(f, "invalid status transition from {from} to {to}")
            }
            Self::StatusConflict {
                order_number,
                expected,
                actual,
            } => write!(
                f,
                "order {order_number} moved from {expected} to {actual} concurrently; reload and retry"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for KitchenServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrderValidationError> for KitchenServiceError {
    fn from(value: OrderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for KitchenServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(order_number) => Self::OrderNotFound(order_number),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::StatusConflict {
                order_number,
                expected,
                actual,
            } => Self::StatusConflict {
                order_number,
                expected,
                actual,
            },
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, KitchenServiceError>;

/// Current status of one order plus the statuses it may move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStatuses {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub next_statuses: Vec<OrderStatus>,
}

/// Kitchen service facade over a store and a notifier.
pub struct KitchenService<S: OrderStore, N: ReadyNotifier> {
    store: S,
    notifier: N,
    default_phone_region: String,
}

impl<S: OrderStore, N: ReadyNotifier> KitchenService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            default_phone_region: DEFAULT_PHONE_REGION.to_string(),
        }
    }

    /// Sets the region used to interpret phones without a country prefix.
    pub fn with_default_phone_region(mut self, region: impl Into<String>) -> Self {
        self.default_phone_region = region.into();
        self
    }

    /// Creates an order, or returns the existing order for the same
    /// `client_context_id` unchanged.
    ///
    /// An unusable phone is dropped rather than rejecting the order.
    pub fn create_order(&self, request: NewOrderRequest) -> ServiceResult<Order> {
        let phone_e164 = match request.phone.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let normalized =
                    normalize_phone_to_e164(Some(raw), self.default_phone_region.as_str());
                if normalized.is_none() {
                    info!(
                        "event=order_create module=service status=ok phone=dropped region={}",
                        self.default_phone_region
                    );
                }
                normalized
            }
            _ => None,
        };

        let new_order = request.into_new_order(phone_e164)?;
        Ok(self.store.create_order(&new_order)?)
    }

    /// Moves an order to `to_status` after validating the transition.
    ///
    /// # Errors
    /// - `OrderNotFound` when the order does not exist.
    /// - `InvalidTransition` when the table forbids `current -> to_status`;
    ///   the order is left unchanged.
    /// - `StatusConflict` when the order changed after it was read.
    pub fn update_order_status(
        &self,
        order_number: &str,
        to_status: OrderStatus,
        actor_id: Option<&str>,
        notes: Option<&str>,
    ) -> ServiceResult<Order> {
        let current = self
            .store
            .get_order_by_id(order_number)?
            .ok_or_else(|| KitchenServiceError::OrderNotFound(order_number.to_string()))?;

        if !is_valid_transition(current.status, to_status) {
            warn!(
                "event=order_status module=service status=rejected order_number={} from={} to={}",
                current.order_number, current.status, to_status
            );
            return Err(KitchenServiceError::InvalidTransition {
                order_number: current.order_number,
                from: current.status,
                to: to_status,
            });
        }

        let updated = self.store.transition_order_status(
            order_number,
            current.status,
            to_status,
            actor_id,
            notes,
        )?;

        if to_status == OrderStatus::Ready {
            self.send_ready_notification(&updated);
        }

        Ok(updated)
    }

    pub fn get_active_orders(&self) -> ServiceResult<Vec<Order>> {
        Ok(self.store.get_active_orders()?)
    }

    pub fn get_order_by_id(&self, order_number: &str) -> ServiceResult<Option<Order>> {
        Ok(self.store.get_order_by_id(order_number)?)
    }

    /// Returns the statuses the order may move to next.
    pub fn allowed_next_statuses(&self, order_number: &str) -> ServiceResult<NextStatuses> {
        let order = self
            .store
            .get_order_by_id(order_number)?
            .ok_or_else(|| KitchenServiceError::OrderNotFound(order_number.to_string()))?;
        Ok(NextStatuses {
            next_statuses: order.status.allowed_next().to_vec(),
            status: order.status,
            order_number: order.order_number,
        })
    }

    /// Returns the audit trail for one order in append order.
    pub fn order_history(&self, order_number: &str) -> ServiceResult<Vec<OrderEvent>> {
        if self.store.get_order_by_id(order_number)?.is_none() {
            return Err(KitchenServiceError::OrderNotFound(order_number.to_string()));
        }
        Ok(self.store.list_events(order_number)?)
    }

    fn send_ready_notification(&self, order: &Order) {
        let Some(notification) = ReadyNotification::from_order(order) else {
            debug!(
                "event=ready_notify module=service status=skipped order_number={} reason=no_phone",
                order.order_number
            );
            return;
        };

        match self.notifier.notify_ready(&notification) {
            Ok(NotifyOutcome::Sent) | Ok(NotifyOutcome::Skipped) => {}
            Err(err) => error!(
                "event=ready_notify module=service status=error order_number={} error_code={} error={}",
                order.order_number,
                err.code(),
                err
            ),
        }
    }
}
