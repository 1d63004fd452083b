//! Plain-text rendering for the dashboard.

use crate::client::StatusRow;
use kitchen_core::{NextStatuses, Order, OrderEvent, OrderStatus};

const STATUS_COLUMN_WIDTH: usize = 20;
const NAME_COLUMN_WIDTH: usize = 16;

/// Compact age such as `45s`, `12m05s` or `2h03m`.
pub fn format_age(elapsed_ms: i64) -> String {
    let seconds = elapsed_ms.max(0) / 1_000;
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3_600 {
        format!("{}m{:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h{:02}m", seconds / 3_600, (seconds % 3_600) / 60)
    }
}

/// One board line: number, status, age, customer, item count.
pub fn order_line(order: &Order, now_ms: i64) -> String {
    let item_count: u64 = order
        .items
        .iter()
        .map(|item| u64::from(item.quantity))
        .sum();
    let customer = order.customer_name.as_deref().unwrap_or("-");
    format!(
        "{:<12} {:<status_width$} {:>7}  {:<name_width$} {} item{}",
        order.order_number,
        order.status.as_str(),
        format_age(now_ms - order.received_at),
        truncate(customer, NAME_COLUMN_WIDTH),
        item_count,
        if item_count == 1 { "" } else { "s" },
        status_width = STATUS_COLUMN_WIDTH,
        name_width = NAME_COLUMN_WIDTH,
    )
}

pub fn board(orders: &[Order], now_ms: i64) -> String {
    if orders.is_empty() {
        return "no active orders".to_string();
    }
    orders
        .iter()
        .map(|order| order_line(order, now_ms))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line detail view with items, timeline and next actions.
pub fn order_detail(order: &Order, next: &NextStatuses, now_ms: i64) -> String {
    let mut lines = vec![
        format!("{}  {}", order.order_number, order.status),
        format!("customer: {}", order.customer_name.as_deref().unwrap_or("-")),
        format!("phone:    {}", order.phone_e164.as_deref().unwrap_or("-")),
        format!("total:    {:.2}", order.total_amount),
    ];
    if let Some(notes) = &order.notes {
        lines.push(format!("notes:    {notes}"));
    }

    lines.push("items:".to_string());
    for item in &order.items {
        let mut line = format!("  {} x {}", item.quantity, item.name);
        if let Some(price) = item.price {
            line.push_str(&format!(" @ {price:.2}"));
        }
        if let Some(notes) = &item.notes {
            line.push_str(&format!(" ({notes})"));
        }
        lines.push(line);
    }

    lines.push("timeline:".to_string());
    for status in OrderStatus::ALL {
        if let Some(at) = order.reached_at(status) {
            lines.push(format!(
                "  {:<width$} {} ago",
                status.as_str(),
                format_age(now_ms - at),
                width = STATUS_COLUMN_WIDTH
            ));
        }
    }

    lines.push(format!("next:     {}", status_list(&next.next_statuses)));
    lines.join("\n")
}

pub fn history(events: &[OrderEvent], now_ms: i64) -> String {
    events
        .iter()
        .map(|event| {
            let from = event.from_status.map_or("-", OrderStatus::as_str);
            let mut line = format!(
                "  {:>7} ago  {} -> {}  by {}",
                format_age(now_ms - event.occurred_at),
                from,
                event.to_status,
                event.actor_id
            );
            if let Some(notes) = &event.notes {
                line.push_str(&format!("  \"{notes}\""));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn status_table(rows: &[StatusRow]) -> String {
    rows.iter()
        .map(|row| {
            let marker = if row.terminal { " (terminal)" } else { "" };
            format!(
                "{:<width$} -> {}{}",
                row.status.as_str(),
                status_list(&row.next_statuses),
                marker,
                width = STATUS_COLUMN_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_list(statuses: &[OrderStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
