use crate::config::SharedRuntimeConfig;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError};
use tracing::info;

/// State for the admin API.
#[derive(Clone)]
pub struct AdminAppState {
    pub runtime_config: SharedRuntimeConfig,
    /// Required bearer token for PUT /api/admin/config. None = PUT unrestricted.
    pub admin_token: Option<String>,
}

/// Partial update body — only fields present in the request are changed.
#[derive(Deserialize)]
pub struct RuntimeConfigUpdate {
    pub fallback_enabled: Option<bool>,
    pub body_size_limit_bytes: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn create_admin_router(state: AdminAppState) -> Router {
    Router::new()
        .route("/api/admin/config", get(get_config).put(put_config))
        .with_state(Arc::new(state))
}

/// GET /api/admin/config — returns current RuntimeConfig.
async fn get_config(State(state): State<Arc<AdminAppState>>) -> Response {
    Json(crate::config::runtime::current(&state.runtime_config)).into_response()
}

/// PUT /api/admin/config — partial update. Requires FRESHGATE_ADMIN_TOKEN bearer when set.
async fn put_config(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
    Json(update): Json<RuntimeConfigUpdate>,
) -> Response {
    if !validate_admin_token(&headers, &state.admin_token) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    let mut cfg = state
        .runtime_config
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(v) = update.fallback_enabled {
        cfg.fallback_enabled = v;
    }
    if let Some(v) = update.body_size_limit_bytes {
        cfg.body_size_limit_bytes = v;
    }

    info!(
        fallback_enabled = cfg.fallback_enabled,
        body_size_limit_bytes = cfg.body_size_limit_bytes,
        "Runtime config updated"
    );

    Json(cfg.clone()).into_response()
}

/// Returns true if the bearer token in `Authorization` matches the expected admin token.
/// Returns true (no restriction) when `expected` is None.
fn validate_admin_token(headers: &HeaderMap, expected: &Option<String>) -> bool {
    let Some(expected_token) = expected else {
        return true;
    };

    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected_token.as_str())
}
