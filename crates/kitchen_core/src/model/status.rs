//! Order status lifecycle and transition table.
//!
//! # Responsibility
//! - Define the fixed set of order statuses.
//! - Own the single transition table used by service enforcement and by
//!   dashboard affordances.
//!
//! # Invariants
//! - `COMPLETED` and `CANCELLED` are terminal and accept no transition.
//! - Every non-terminal status may move to `CANCELLED`.
//! - `is_valid_transition(from, to)` is a pure lookup over `allowed_next()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Lifecycle state of one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Initial state for every newly received order.
    ReceivedUnconfirmed,
    Confirmed,
    Preparing,
    Ready,
    /// Terminal: handed over to the customer.
    Completed,
    /// Terminal: abandoned at any earlier stage.
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        Self::ReceivedUnconfirmed,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses shown on the kitchen board.
    pub const ACTIVE: [OrderStatus; 4] = [
        Self::ReceivedUnconfirmed,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
    ];

    /// Stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReceivedUnconfirmed => "RECEIVED_UNCONFIRMED",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            Self::ReceivedUnconfirmed => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Preparing, Self::Cancelled],
            Self::Preparing => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.allowed_next().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Returns whether orders in this status belong on the active board.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatusError(pub String);

impl Display for UnknownStatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown order status `{}`", self.0)
    }
}

impl Error for UnknownStatusError {}

impl FromStr for OrderStatus {
    type Err = UnknownStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatusError(normalized.to_string()))
    }
}

/// Returns whether `from -> to` is a legal lifecycle step.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    from.can_transition_to(to)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_transition, OrderStatus};

    #[test]
    fn parses_wire_names_and_rejects_unknown() {
        assert_eq!(
            "READY".parse::<OrderStatus>().expect("READY should parse"),
            OrderStatus::Ready
        );
        assert_eq!(
            " CANCELLED ".parse::<OrderStatus>().expect("trimmed input should parse"),
            OrderStatus::Cancelled
        );
        assert!("ready".parse::<OrderStatus>().is_err());
        assert!("DELIVERED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_transition() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                assert!(!is_valid_transition(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn active_set_matches_non_terminal_statuses() {
        let active: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|status| status.is_active())
            .collect();
        assert_eq!(active, OrderStatus::ACTIVE.to_vec());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::ReceivedUnconfirmed)
            .expect("status should serialize");
        assert_eq!(json, "\"RECEIVED_UNCONFIRMED\"");
    }
}
