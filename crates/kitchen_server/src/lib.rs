//! HTTP surface for the kitchen order system.
//!
//! # Responsibility
//! - Expose order intake, kitchen board and status endpoints over axum.
//! - Map core errors to HTTP statuses and `{success, ...}` JSON envelopes.
//!
//! # Invariants
//! - Handlers hold no order state; every request goes through the service.
//! - Blocking store and webhook work runs off the async executor.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{require_api_key, require_kitchen_user, KitchenUser};
pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, KitchenApp};
