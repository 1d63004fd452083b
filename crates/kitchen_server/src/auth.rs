//! Request guards for the intake key and kitchen identity headers.
//!
//! # Invariants
//! - Identity is trusted from upstream headers; this layer only checks
//!   presence and role.
//! - Secrets and user ids are never logged.

use crate::error::ApiError;
use axum::http::HeaderMap;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

const KITCHEN_ROLES: [&str; 2] = ["KITCHEN", "ADMIN"];

/// Authenticated kitchen caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitchenUser {
    pub id: String,
    /// Upper-cased role name.
    pub role: String,
}

/// Checks `x-api-key` against the configured key.
pub fn require_api_key(headers: &HeaderMap, configured: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = configured else {
        return Err(ApiError::ApiKeyNotConfigured);
    };
    match header_value(headers, API_KEY_HEADER) {
        Some(provided) if provided == expected => Ok(()),
        _ => Err(ApiError::Unauthorized("Invalid or missing API key")),
    }
}

/// Resolves the caller identity and requires a kitchen or admin role.
pub fn require_kitchen_user(headers: &HeaderMap) -> Result<KitchenUser, ApiError> {
    let id = header_value(headers, USER_ID_HEADER)
        .ok_or(ApiError::Unauthorized("Authentication required"))?;
    let role = header_value(headers, USER_ROLE_HEADER)
        .map(|role| role.to_ascii_uppercase())
        .unwrap_or_default();

    if !KITCHEN_ROLES.contains(&role.as_str()) {
        return Err(ApiError::Forbidden("Kitchen access required"));
    }
    Ok(KitchenUser {
        id: id.to_string(),
        role,
    })
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
