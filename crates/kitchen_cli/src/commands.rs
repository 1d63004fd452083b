//! Subcommand implementations.

use crate::client::{ApiClient, CliError, CliResult};
use crate::render;
use clap::Args;
use kitchen_core::{now_epoch_ms, NextStatuses, OrderStatus};
use log::{info, warn};
use std::thread;
use std::time::Duration;

const MIN_POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval.
    #[arg(long, default_value_t = 2_500)]
    pub interval_ms: u64,

    /// Print the board once and exit.
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Order number, e.g. ORDER-0001.
    pub order_number: String,

    /// Include the audit trail.
    #[arg(long)]
    pub history: bool,
}

#[derive(Debug, Args)]
pub struct AdvanceArgs {
    pub order_number: String,

    /// Target status, e.g. PREPARING.
    pub to_status: String,

    #[arg(long)]
    pub notes: Option<String>,
}

/// Polls the active board until interrupted, or once with `--once`.
///
/// A failed poll is logged and retried on the next tick; with `--once` it is
/// returned.
pub fn watch(client: &ApiClient, args: &WatchArgs) -> CliResult<()> {
    let interval = Duration::from_millis(args.interval_ms.max(MIN_POLL_INTERVAL_MS));
    loop {
        match client.active_orders() {
            Ok(orders) => {
                println!("{}", render::board(&orders, now_epoch_ms()));
            }
            Err(err) if !args.once => {
                warn!("event=board_poll module=cli status=error error={}", err);
            }
            Err(err) => return Err(err),
        }
        if args.once {
            return Ok(());
        }
        println!();
        thread::sleep(interval);
    }
}

pub fn show(client: &ApiClient, args: &ShowArgs) -> CliResult<()> {
    let order = client.order(&args.order_number)?;
    let next = client.next_statuses(&args.order_number)?;
    let now = now_epoch_ms();
    println!("{}", render::order_detail(&order, &next, now));
    if args.history {
        let events = client.order_events(&args.order_number)?;
        println!("history:\n{}", render::history(&events, now));
    }
    Ok(())
}

/// Moves an order after checking the target against the server's allowed
/// next statuses.
pub fn advance(client: &ApiClient, args: &AdvanceArgs) -> CliResult<()> {
    let to_status = parse_status(&args.to_status)?;
    let next = client.next_statuses(&args.order_number)?;
    ensure_allowed(&next, to_status)?;

    let order = client.update_status(&args.order_number, to_status, args.notes.as_deref())?;
    info!(
        "event=order_advance module=cli status=ok order_number={} to={}",
        order.order_number, order.status
    );
    println!("{} is now {}", order.order_number, order.status);
    Ok(())
}

pub fn statuses(client: &ApiClient) -> CliResult<()> {
    let rows = client.status_table()?;
    println!("{}", render::status_table(&rows));
    Ok(())
}

/// Parses a status name; case-insensitive for typing convenience.
pub fn parse_status(raw: &str) -> CliResult<OrderStatus> {
    raw.trim()
        .to_ascii_uppercase()
        .parse::<OrderStatus>()
        .map_err(|_| CliError::UnknownStatus(raw.trim().to_string()))
}

/// Refuses targets the server did not offer.
pub fn ensure_allowed(next: &NextStatuses, to_status: OrderStatus) -> CliResult<()> {
    if next.next_statuses.contains(&to_status) {
        return Ok(());
    }
    Err(CliError::TransitionRefused {
        order_number: next.order_number.clone(),
        from: next.status,
        to: to_status,
        allowed: next.next_statuses.clone(),
    })
}
