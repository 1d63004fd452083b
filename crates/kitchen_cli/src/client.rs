//! Blocking HTTP client for the kitchen API.

use crate::Config;
use kitchen_core::{NextStatuses, Order, OrderEvent, OrderNumber, OrderStatus};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use url::Url;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";
const USER_AGENT: &str = concat!("kitchen-cli/", env!("CARGO_PKG_VERSION"));

pub type CliResult<T> = Result<T, CliError>;

/// Client-side failure.
#[derive(Debug)]
pub enum CliError {
    /// Server answered with an error envelope or non-success status.
    Api { status: u16, message: String },
    /// Request never got an HTTP answer.
    Transport(String),
    /// Base URL cannot carry path segments.
    InvalidUrl(String),
    /// Response body did not match the expected shape.
    Decode(String),
    UnknownStatus(String),
    /// Target status is not among the server's allowed next statuses.
    TransitionRefused {
        order_number: OrderNumber,
        from: OrderStatus,
        to: OrderStatus,
        allowed: Vec<OrderStatus>,
    },
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api { status, message } => write!(f, "server returned {status}: {message}"),
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::InvalidUrl(message) => write!(f, "invalid server url: {message}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
            Self::UnknownStatus(value) => write!(f, "unknown order status `{value}`"),
            Self::TransitionRefused {
                order_number,
                from,
                to,
                allowed,
            } => {
                let allowed = if allowed.is_empty() {
                    "none".to_string()
                } else {
                    allowed
                        .iter()
                        .map(|status| status.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                write!(
                    f,
                    "{order_number} cannot move from {from} to {to}; allowed: {allowed}"
                )
            }
        }
    }
}

impl Error for CliError {}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OrdersEnvelope {
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    events: Vec<OrderEvent>,
}

#[derive(Debug, Deserialize)]
struct StatusTableEnvelope {
    statuses: Vec<StatusRow>,
}

/// One row of the served transition table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusRow {
    pub status: OrderStatus,
    pub terminal: bool,
    pub next_statuses: Vec<OrderStatus>,
}

/// Kitchen API client bound to one base URL and identity.
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    user_id: Option<String>,
    role: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms.max(1));
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: config.base_url.clone(),
            user_id: config.user_id.clone(),
            role: config.role.clone(),
        }
    }

    pub fn active_orders(&self) -> CliResult<Vec<Order>> {
        let mut url = self.endpoint(&["api", "orders"])?;
        url.query_pairs_mut().append_pair("active", "true");
        let envelope: OrdersEnvelope = self.get(&url)?;
        Ok(envelope.orders)
    }

    pub fn order(&self, order_number: &str) -> CliResult<Order> {
        let url = self.endpoint(&["api", "orders", order_number])?;
        let envelope: OrderEnvelope = self.get(&url)?;
        Ok(envelope.order)
    }

    pub fn next_statuses(&self, order_number: &str) -> CliResult<NextStatuses> {
        let url = self.endpoint(&["api", "orders", order_number, "next-statuses"])?;
        self.get(&url)
    }

    pub fn order_events(&self, order_number: &str) -> CliResult<Vec<OrderEvent>> {
        let url = self.endpoint(&["api", "orders", order_number, "events"])?;
        let envelope: EventsEnvelope = self.get(&url)?;
        Ok(envelope.events)
    }

    pub fn status_table(&self) -> CliResult<Vec<StatusRow>> {
        let url = self.endpoint(&["api", "statuses"])?;
        let envelope: StatusTableEnvelope = self.get(&url)?;
        Ok(envelope.statuses)
    }

    pub fn update_status(
        &self,
        order_number: &str,
        to_status: OrderStatus,
        notes: Option<&str>,
    ) -> CliResult<Order> {
        let url = self.endpoint(&["api", "orders", order_number, "status"])?;
        let body = serde_json::json!({
            "to_status": to_status.as_str(),
            "notes": notes,
        });
        let result = self.request("POST", &url).send_json(body);
        let envelope: OrderEnvelope = decode(url.path(), result)?;
        Ok(envelope.order)
    }

    /// Joins `segments` onto the base URL, percent-encoding each one so an
    /// order number can never address a different route.
    fn endpoint(&self, segments: &[&str]) -> CliResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| CliError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| CliError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: &Url) -> CliResult<T> {
        let result = self.request("GET", url).call();
        decode(url.path(), result)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, url.as_str())
            .set(USER_ROLE_HEADER, &self.role);
        if let Some(user_id) = &self.user_id {
            request = request.set(USER_ID_HEADER, user_id);
        }
        request
    }
}

fn decode<T: DeserializeOwned>(
    path: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> CliResult<T> {
    match result {
        Ok(response) => {
            debug!(
                "event=api_call module=cli status=ok path={} code={}",
                path,
                response.status()
            );
            response
                .into_json::<T>()
                .map_err(|err| CliError::Decode(err.to_string()))
        }
        Err(ureq::Error::Status(status, response)) => {
            let message = response
                .into_json::<ErrorEnvelope>()
                .map(|envelope| envelope.error)
                .unwrap_or_else(|_| "no error message".to_string());
            debug!(
                "event=api_call module=cli status=error path={} code={}",
                path, status
            );
            Err(CliError::Api { status, message })
        }
        Err(ureq::Error::Transport(transport)) => Err(CliError::Transport(transport.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiClient, CliError};
    use crate::Config;
    use kitchen_core::{NextStatuses, OrderStatus};

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(&Config {
            base_url: base_url.to_string(),
            user_id: None,
            role: "KITCHEN".to_string(),
            timeout_ms: 100,
        })
    }

    #[test]
    fn order_numbers_are_encoded_as_one_path_segment() {
        let client = client("http://kitchen.local:8080");
        let url = client
            .endpoint(&["api", "orders", "ORDER-1/status?x=#y", "events"])
            .expect("base url should parse");
        assert_eq!(
            url.as_str(),
            "http://kitchen.local:8080/api/orders/ORDER-1%2Fstatus%3Fx=%23y/events"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let client = client("http://kitchen.local/board");
        let url = client
            .endpoint(&["api", "statuses"])
            .expect("base url should parse");
        assert_eq!(url.as_str(), "http://kitchen.local/board/api/statuses");
    }

    #[test]
    fn served_next_statuses_decode_into_core_type() {
        let body = r#"{"success":true,"order_number":"ORDER-0003","status":"READY","next_statuses":["COMPLETED","CANCELLED"]}"#;
        let next: NextStatuses = serde_json::from_str(body).expect("served shape should decode");
        assert_eq!(next.order_number, "ORDER-0003");
        assert_eq!(next.status, OrderStatus::Ready);
        assert_eq!(
            next.next_statuses,
            vec![OrderStatus::Completed, OrderStatus::Cancelled]
        );
    }

    #[test]
    fn unusable_base_url_is_reported() {
        let err = client("not a url")
            .endpoint(&["api", "statuses"])
            .expect_err("relative base must fail");
        assert!(matches!(err, CliError::InvalidUrl(_)));

        let err = client("mailto:cook@example.com")
            .endpoint(&["api", "statuses"])
            .expect_err("cannot-be-a-base url must fail");
        assert!(matches!(err, CliError::InvalidUrl(_)));
    }

    #[test]
    fn refused_transition_lists_allowed_targets() {
        let err = CliError::TransitionRefused {
            order_number: "ORDER-0001".to_string(),
            from: OrderStatus::Confirmed,
            to: OrderStatus::Ready,
            allowed: vec![OrderStatus::Preparing, OrderStatus::Cancelled],
        };
        assert_eq!(
            err.to_string(),
            "ORDER-0001 cannot move from CONFIRMED to READY; allowed: PREPARING, CANCELLED"
        );

        let terminal = CliError::TransitionRefused {
            order_number: "ORDER-0002".to_string(),
            from: OrderStatus::Completed,
            to: OrderStatus::Cancelled,
            allowed: Vec::new(),
        };
        assert!(terminal.to_string().ends_with("allowed: none"));
    }
}
