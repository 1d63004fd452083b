//! HTTP webhook delivery for ready notifications.

use super::{NotifyError, NotifyOutcome, ReadyNotification, ReadyNotifier};
use log::{info, warn};
use std::time::{Duration, Instant};

const MIN_TIMEOUT_MS: u64 = 100;
const USER_AGENT: &str = concat!("kitchen-core/", env!("CARGO_PKG_VERSION"));

/// Posts ready notifications as JSON to a fixed URL.
pub struct WebhookNotifier {
    url: Option<String>,
    agent: ureq::Agent,
}

impl WebhookNotifier {
    /// Creates a notifier; `url = None` turns every send into a logged no-op.
    pub fn new(url: Option<String>, timeout_ms: u64) -> Self {
        let timeout = Duration::from_millis(timeout_ms.max(MIN_TIMEOUT_MS));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            url: url
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            agent,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

impl ReadyNotifier for WebhookNotifier {
    fn notify_ready(&self, notification: &ReadyNotification) -> Result<NotifyOutcome, NotifyError> {
        let Some(url) = self.url.as_deref() else {
            warn!(
                "event=ready_notify module=notify status=skipped order_number={} reason=webhook_url_not_configured",
                notification.order_number
            );
            return Ok(NotifyOutcome::Skipped);
        };

        let body = serde_json::to_value(notification).map_err(NotifyError::Serialization)?;
        let started_at = Instant::now();
        match self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_json(body)
        {
            Ok(_) => {
                info!(
                    "event=ready_notify module=notify status=ok order_number={} duration_ms={}",
                    notification.order_number,
                    started_at.elapsed().as_millis()
                );
                Ok(NotifyOutcome::Sent)
            }
            Err(ureq::Error::Status(status, _)) => Err(NotifyError::HttpStatus(status)),
            Err(ureq::Error::Transport(transport)) => {
                let message = transport.to_string();
                let combined = format!("{:?} {}", transport.kind(), message);
                Err(NotifyError::Transport {
                    kind: classify_transport_error_kind(&combined),
                    message,
                })
            }
        }
    }
}

fn classify_transport_error_kind(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        "timeout"
    } else if lower.contains("tls") || lower.contains("ssl") {
        "tls"
    } else if lower.contains("dns") {
        "dns"
    } else if lower.contains("connection") || lower.contains("connect") {
        "connection"
    } else {
        "transport"
    }
}
