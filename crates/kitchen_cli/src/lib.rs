//! Terminal dashboard client for the kitchen order system.
//!
//! # Responsibility
//! - Poll the kitchen HTTP surface and render the active board.
//! - Issue status updates using the server-provided allowed next statuses.
//!
//! # Invariants
//! - The client never hardcodes the transition table; it asks the server.
//! - Commands hold no order state between calls.

pub mod client;
pub mod commands;
pub mod render;

use clap::{Parser, Subcommand};

pub use client::{ApiClient, CliError, CliResult};

pub const DEFAULT_KITCHEN_URL: &str = "http://127.0.0.1:3000";

/// Kitchen dashboard CLI.
#[derive(Debug, Parser)]
#[command(name = "kitchen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Kitchen server base URL.
    #[arg(long, env = "KITCHEN_URL", default_value = DEFAULT_KITCHEN_URL)]
    pub url: String,

    /// Kitchen user id sent as `x-user-id`.
    #[arg(long, env = "KITCHEN_USER_ID")]
    pub user_id: Option<String>,

    /// Role sent as `x-user-role`.
    #[arg(long, env = "KITCHEN_ROLE", default_value = "KITCHEN")]
    pub role: String,

    /// HTTP timeout per request.
    #[arg(long, default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// Log level for client diagnostics on stderr.
    #[arg(long, env = "KITCHEN_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            base_url: self.url.trim_end_matches('/').to_string(),
            user_id: self
                .user_id
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            role: self.role.trim().to_string(),
            timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Poll and print active orders, oldest first.
    Watch(commands::WatchArgs),
    /// Show one order with its allowed next statuses.
    Show(commands::ShowArgs),
    /// Move an order to another status.
    Advance(commands::AdvanceArgs),
    /// Print the status transition table.
    Statuses,
}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub user_id: Option<String>,
    pub role: String,
    pub timeout_ms: u64,
}
