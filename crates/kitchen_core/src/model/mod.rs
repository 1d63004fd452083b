//! Kitchen domain model.
//!
//! # Responsibility
//! - Define canonical order, status and audit-event structures.
//! - Keep the status transition table in exactly one place.
//!
//! # Invariants
//! - Orders are identified by an immutable `OrderNumber`.
//! - Events are append-only and reference orders by `OrderNumber`.

pub mod event;
pub mod order;
pub mod status;
