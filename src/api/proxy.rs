use crate::backend::{BackendClient, Endpoint, UpstreamError};
use crate::config::{runtime, SharedRuntimeConfig};
use crate::fallback::FallbackGenerator;
use crate::sensor::{parse_remote_request, validate_sensor_request, ValidationError};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Response header telling whether the payload came from the backend or was synthesized
pub const DATA_SOURCE_HEADER: &str = "x-data-source";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub fallback: FallbackGenerator,
    pub runtime_config: SharedRuntimeConfig,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Create router with the proxied prediction endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/models", get(get_models))
        .route("/sensors", get(get_sensors))
        .route("/predict", post(predict))
        .route("/predict/thingspeak", post(predict_thingspeak))
        .route("/healthz", get(healthz))
        .with_state(Arc::new(state))
}

/// GET /models - Model catalog
async fn get_models(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let result = state.backend.get(Endpoint::Models).await;
    respond(&state, Endpoint::Models, result, || state.fallback.models())
}

/// GET /sensors - Sensor catalog
async fn get_sensors(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let result = state.backend.get(Endpoint::Sensors).await;
    respond(&state, Endpoint::Sensors, result, || state.fallback.sensors())
}

/// POST /predict - Prediction from a caller-supplied reading
async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, AppError> {
    check_body_size(&state, &body)?;

    let request = validate_sensor_request(&body, state.fallback.channel_set())?;

    let result = state.backend.post(Endpoint::Predict, &request).await;
    respond(&state, Endpoint::Predict, result, || {
        state.fallback.prediction(&mut rand::thread_rng())
    })
}

/// POST /predict/thingspeak - Prediction from the backend's remote telemetry feed
async fn predict_thingspeak(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    check_body_size(&state, &body)?;

    let request = parse_remote_request(&body)?;

    let result = state.backend.post(Endpoint::PredictThingSpeak, &request).await;
    respond(&state, Endpoint::PredictThingSpeak, result, || {
        state.fallback.remote_prediction(
            &mut rand::thread_rng(),
            request.api_key.as_deref(),
            Utc::now(),
        )
    })
}

/// GET /healthz - Liveness, independent of the backend
async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn check_body_size(state: &AppState, body: &Bytes) -> Result<(), AppError> {
    let limit = runtime::current(&state.runtime_config).body_size_limit_bytes;
    if body.len() > limit {
        return Err(AppError::PayloadTooLarge);
    }
    Ok(())
}

/// Turn a backend outcome into the client response.
///
/// Backend JSON passes through untouched. On failure the fallback payload is
/// served when fallback mode is on, otherwise the failure becomes a 502/504.
fn respond<T, F>(
    state: &AppState,
    endpoint: Endpoint,
    result: Result<Value, UpstreamError>,
    fallback: F,
) -> Result<Response, AppError>
where
    T: Serialize,
    F: FnOnce() -> T,
{
    match result {
        Ok(payload) => {
            debug!(endpoint = %endpoint, "Backend responded");
            Ok(with_data_source(Json(payload), "backend"))
        }
        Err(e) => {
            warn!(
                endpoint = %endpoint,
                backend = %state.backend.base_url(),
                error = %e,
                "Backend request failed"
            );

            if !runtime::current(&state.runtime_config).fallback_enabled {
                return Err(e.into());
            }

            info!(endpoint = %endpoint, "Serving fallback payload");
            Ok(with_data_source(Json(fallback()), "fallback"))
        }
    }
}

fn with_data_source(body: impl IntoResponse, source: &'static str) -> Response {
    let mut resp = body.into_response();
    resp.headers_mut()
        .insert(DATA_SOURCE_HEADER, HeaderValue::from_static(source));
    resp
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    PayloadTooLarge,
    Upstream(String),
    UpstreamTimeout(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
            }
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::UpstreamTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
        };
        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::ValidationError(e.to_string())
    }
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Timeout => AppError::UpstreamTimeout(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}
