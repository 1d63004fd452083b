//! Route table and handlers.
//!
//! # Responsibility
//! - Guard each route (intake key or kitchen identity) before any work.
//! - Translate JSON bodies, paths and queries into service calls.
//!
//! # Invariants
//! - Success bodies always carry `success: true`; failures go through
//!   `ApiError`.
//! - Action choices for clients come from the core transition table only.

use crate::auth::{require_api_key, require_kitchen_user};
use crate::error::{ApiError, NOT_FOUND_MESSAGE, ORDER_NOT_FOUND_MESSAGE};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use kitchen_core::{
    NewOrderRequest, NextStatuses, Order, OrderEvent, OrderNumber, OrderStatus,
    OrderValidationError,
};
use log::info;
use serde::{Deserialize, Serialize};

const TO_STATUS_REQUIRED: &str = "Valid to_status is required";

/// Builds the full router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/statuses", get(list_statuses))
        .route("/api/orders", post(create_order).get(list_orders))
        .route("/api/orders/:id", get(get_order))
        .route("/api/orders/:id/status", post(update_order_status))
        .route("/api/orders/:id/next-statuses", get(next_statuses))
        .route("/api/orders/:id/events", get(order_events))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub success: bool,
    pub order_number: OrderNumber,
    pub events: Vec<OrderEvent>,
}

#[derive(Debug, Serialize)]
pub struct NextStatusesResponse {
    pub success: bool,
    #[serde(flatten)]
    pub next: NextStatuses,
}

#[derive(Debug, Serialize)]
pub struct StatusTableEntry {
    pub status: OrderStatus,
    pub terminal: bool,
    pub next_statuses: Vec<OrderStatus>,
}

#[derive(Debug, Serialize)]
pub struct StatusTableResponse {
    pub success: bool,
    pub statuses: Vec<StatusTableEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub active: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub to_status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn not_found() -> ApiError {
    ApiError::NotFound(NOT_FOUND_MESSAGE)
}

async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    require_api_key(&headers, state.api_key())?;
    let Json(request) = body.map_err(|rejection| {
        ApiError::BadRequest(OrderValidationError::MalformedBody(rejection.body_text()).to_string())
    })?;

    let order = state
        .run("Failed to create order", move |service| {
            service.create_order(request)
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            success: true,
            order,
        }),
    ))
}

async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ActiveQuery>, QueryRejection>,
) -> Result<Json<OrdersResponse>, ApiError> {
    require_kitchen_user(&headers)?;
    let active = query.ok().and_then(|Query(query)| query.active);
    if active.as_deref().map(str::trim) != Some("true") {
        return Err(ApiError::BadRequest(
            "Only active=true is supported currently".to_string(),
        ));
    }

    let orders = state
        .run("Failed to get orders", |service| service.get_active_orders())
        .await?;
    Ok(Json(OrdersResponse {
        success: true,
        orders,
    }))
}

async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    require_kitchen_user(&headers)?;
    let order = state
        .run("Failed to get order", move |service| {
            service.get_order_by_id(&order_number)
        })
        .await?
        .ok_or(ApiError::NotFound(ORDER_NOT_FOUND_MESSAGE))?;
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

async fn update_order_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_number): Path<String>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let user = require_kitchen_user(&headers)?;
    let Json(request) = body.map_err(|_| ApiError::BadRequest(TO_STATUS_REQUIRED.to_string()))?;
    let to_status = parse_to_status(request.to_status.as_deref())?;
    let notes = request.notes;

    let order = state
        .run("Failed to update order status", move |service| {
            service.update_order_status(
                &order_number,
                to_status,
                Some(user.id.as_str()),
                notes.as_deref(),
            )
        })
        .await?;

    info!(
        "event=order_status module=server status=ok order_number={} to={}",
        order.order_number, order.status
    );
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

async fn next_statuses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_number): Path<String>,
) -> Result<Json<NextStatusesResponse>, ApiError> {
    require_kitchen_user(&headers)?;
    let next = state
        .run("Failed to get next statuses", move |service| {
            service.allowed_next_statuses(&order_number)
        })
        .await?;
    Ok(Json(NextStatusesResponse {
        success: true,
        next,
    }))
}

async fn order_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_number): Path<String>,
) -> Result<Json<EventsResponse>, ApiError> {
    require_kitchen_user(&headers)?;
    let lookup = order_number.clone();
    let events = state
        .run("Failed to get order events", move |service| {
            service.order_history(&lookup)
        })
        .await?;
    Ok(Json(EventsResponse {
        success: true,
        order_number,
        events,
    }))
}

async fn list_statuses(headers: HeaderMap) -> Result<Json<StatusTableResponse>, ApiError> {
    require_kitchen_user(&headers)?;
    Ok(Json(StatusTableResponse {
        success: true,
        statuses: status_table(),
    }))
}

fn status_table() -> Vec<StatusTableEntry> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusTableEntry {
            status,
            terminal: status.is_terminal(),
            next_statuses: status.allowed_next().to_vec(),
        })
        .collect()
}

fn parse_to_status(raw: Option<&str>) -> Result<OrderStatus, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(TO_STATUS_REQUIRED.to_string()))?;
    raw.parse::<OrderStatus>()
        .map_err(|err| ApiError::BadRequest(format!("{TO_STATUS_REQUIRED}: {err}")))
}
