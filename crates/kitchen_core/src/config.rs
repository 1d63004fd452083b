//! Process configuration resolved once at startup.
//!
//! # Responsibility
//! - Read environment-style key/value settings into typed config structs.
//! - Select the order-store backend explicitly instead of through globals.
//!
//! # Invariants
//! - The `sqlite` backend always carries a non-empty database path.
//! - Unknown backend names are rejected, never silently defaulted.

use crate::logging::default_log_level;
use crate::util::phone::DEFAULT_PHONE_REGION;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_BIND: &str = "KITCHEN_BIND";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DATA_BACKEND: &str = "DATA_BACKEND";
pub const ENV_DB_PATH: &str = "KITCHEN_DB_PATH";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_READY_WEBHOOK_URL: &str = "READY_WEBHOOK_URL";
pub const ENV_READY_WEBHOOK_TIMEOUT_MS: &str = "READY_WEBHOOK_TIMEOUT_MS";
pub const ENV_DEFAULT_PHONE_REGION: &str = "DEFAULT_PHONE_REGION";
pub const ENV_LOG_LEVEL: &str = "KITCHEN_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "KITCHEN_LOG_DIR";

const DEFAULT_BIND_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WEBHOOK_TIMEOUT_MS: u64 = 5_000;
const WEBHOOK_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=60_000;

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingRequired(&'static str),
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    UnsupportedBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired(key) => write!(f, "required setting `{key}` is not set"),
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for `{key}`: {reason}")
            }
            Self::UnsupportedBackend(name) => write!(
                f,
                "unsupported {ENV_DATA_BACKEND} `{name}`; expected sqlite|memory"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Order-store backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite database file.
    Sqlite { path: PathBuf },
    /// Private in-memory SQLite database; data is lost on exit.
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Ready-notification webhook; `None` disables delivery.
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: DEFAULT_WEBHOOK_TIMEOUT_MS,
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitchenConfig {
    pub bind: String,
    pub store: StoreConfig,
    pub notifier: NotifierConfig,
    /// Shared secret for the intake endpoint.
    pub api_key: Option<String>,
    pub default_phone_region: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl KitchenConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind = match (get(ENV_BIND), get(ENV_PORT)) {
            (Some(bind), _) => bind,
            (None, Some(port)) => {
                let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_PORT,
                    value: port.clone(),
                    reason: "expected a TCP port number",
                })?;
                format!("{DEFAULT_BIND_HOST}:{port}")
            }
            (None, None) => format!("{DEFAULT_BIND_HOST}:{DEFAULT_PORT}"),
        };

        let backend_name = get(ENV_DATA_BACKEND).unwrap_or_else(|| "sqlite".to_string());
        let backend = match backend_name.to_ascii_lowercase().as_str() {
            "sqlite" => StoreBackend::Sqlite {
                path: get(ENV_DB_PATH)
                    .map(PathBuf::from)
                    .ok_or(ConfigError::MissingRequired(ENV_DB_PATH))?,
            },
            "memory" => StoreBackend::Memory,
            _ => return Err(ConfigError::UnsupportedBackend(backend_name)),
        };

        let timeout_ms = match get(ENV_READY_WEBHOOK_TIMEOUT_MS) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|value| WEBHOOK_TIMEOUT_RANGE_MS.contains(value))
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_READY_WEBHOOK_TIMEOUT_MS,
                    value: raw,
                    reason: "expected milliseconds between 100 and 60000",
                })?,
            None => DEFAULT_WEBHOOK_TIMEOUT_MS,
        };

        Ok(Self {
            bind,
            store: StoreConfig { backend },
            notifier: NotifierConfig {
                webhook_url: get(ENV_READY_WEBHOOK_URL),
                timeout_ms,
            },
            api_key: get(ENV_API_KEY),
            default_phone_region: get(ENV_DEFAULT_PHONE_REGION)
                .unwrap_or_else(|| DEFAULT_PHONE_REGION.to_string()),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KitchenConfig, StoreBackend, DEFAULT_WEBHOOK_TIMEOUT_MS};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> Result<KitchenConfig, ConfigError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        KitchenConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn sqlite_backend_requires_db_path() {
        let err = load(&[]).expect_err("sqlite without path must fail");
        assert_eq!(err, ConfigError::MissingRequired("KITCHEN_DB_PATH"));

        let config = load(&[("KITCHEN_DB_PATH", "/var/lib/kitchen/orders.db")])
            .expect("path should satisfy sqlite backend");
        assert_eq!(
            config.store.backend,
            StoreBackend::Sqlite {
                path: PathBuf::from("/var/lib/kitchen/orders.db")
            }
        );
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.notifier.timeout_ms, DEFAULT_WEBHOOK_TIMEOUT_MS);
        assert_eq!(config.default_phone_region, "US");
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = load(&[("DATA_BACKEND", "firestore")]).expect_err("firestore is not built in");
        assert_eq!(err, ConfigError::UnsupportedBackend("firestore".to_string()));
    }

    #[test]
    fn memory_backend_and_overrides_are_read() {
        let config = load(&[
            ("DATA_BACKEND", "MEMORY"),
            ("PORT", "8088"),
            ("API_KEY", "secret"),
            ("READY_WEBHOOK_URL", "https://hooks.example.test/ready"),
            ("READY_WEBHOOK_TIMEOUT_MS", "2500"),
            ("DEFAULT_PHONE_REGION", "PR"),
        ])
        .expect("config should load");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.bind, "127.0.0.1:8088");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://hooks.example.test/ready")
        );
        assert_eq!(config.notifier.timeout_ms, 2500);
        assert_eq!(config.default_phone_region, "PR");
    }

    #[test]
    fn blank_values_count_as_unset_and_bad_numbers_fail() {
        let config = load(&[("DATA_BACKEND", "memory"), ("API_KEY", "   ")])
            .expect("config should load");
        assert_eq!(config.api_key, None);

        let err = load(&[("DATA_BACKEND", "memory"), ("READY_WEBHOOK_TIMEOUT_MS", "10")])
            .expect_err("timeout below range must fail");
        assert!(matches!(err, ConfigError::InvalidValue { key: "READY_WEBHOOK_TIMEOUT_MS", .. }));
    }
}
