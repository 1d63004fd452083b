//! Shared handler state.

use crate::error::ApiError;
use kitchen_core::{KitchenService, KitchenServiceError, OrderStore, ReadyNotifier};
use log::error;
use std::sync::Arc;

/// Service type wired by the server binary.
pub type KitchenApp = KitchenService<Box<dyn OrderStore>, Box<dyn ReadyNotifier>>;

#[derive(Clone)]
pub struct AppState {
    service: Arc<KitchenApp>,
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(service: KitchenApp, api_key: Option<String>) -> Self {
        Self {
            service: Arc::new(service),
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
                .map(Arc::from),
        }
    }

    /// Configured intake key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Runs one service call on the blocking pool.
    ///
    /// Service errors are mapped with `failure` as the public message for
    /// unexpected store failures.
    pub async fn run<T, F>(&self, failure: &'static str, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&KitchenApp) -> Result<T, KitchenServiceError> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        match tokio::task::spawn_blocking(move || call(&service)).await {
            Ok(result) => result.map_err(|err| ApiError::from_service(err, failure)),
            Err(join_err) => {
                error!(
                    "event=service_call module=server status=error reason=join_failed panicked={}",
                    join_err.is_panic()
                );
                Err(ApiError::Internal(failure))
            }
        }
    }
}
