// Integration tests for the proxied prediction endpoints
//
// The backend is a mockito stub; requests go through the real axum router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use freshgate::api::{create_app, create_router, AdminAppState, AppState, DATA_SOURCE_HEADER};
use freshgate::backend::BackendClient;
use freshgate::config::{runtime, BackendConfig, RuntimeConfig, SharedRuntimeConfig};
use freshgate::fallback::{
    FallbackGenerator, ModelCatalog, PredictionResult, RemotePredictionResult, SensorCatalog,
};
use freshgate::sensor::{ChannelSet, FreshnessTier, CHANNEL_COUNT};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tower::ServiceExt;

// Nothing listens on port 1
const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:1";

const FRESHNESS_LABELS: [&str; 3] = ["fresh_meat", "spoiled_meat", "rotten_meat"];

// ── Helpers ───────────────────────────────────────────────────────────────────

fn backend_client(url: &str, timeout_ms: u64) -> BackendClient {
    BackendClient::new(&BackendConfig {
        url: url.to_string(),
        timeout_ms,
        connect_timeout_ms: timeout_ms,
    })
    .unwrap()
}

fn app_with_config(backend_url: &str, runtime_config: SharedRuntimeConfig) -> Router {
    create_router(AppState {
        backend: backend_client(backend_url, 1_000),
        fallback: FallbackGenerator::new(ChannelSet::Gas),
        runtime_config,
    })
}

fn create_test_app(backend_url: &str, fallback_enabled: bool) -> Router {
    app_with_config(
        backend_url,
        runtime::shared(RuntimeConfig {
            fallback_enabled,
            ..RuntimeConfig::default()
        }),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, serde_json::to_vec(&body).unwrap())
}

fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

fn data_source(response: &Response) -> &str {
    response.headers()[DATA_SOURCE_HEADER].to_str().unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ── Pass-through ──────────────────────────────────────────────────────────────

/// A healthy backend's JSON is returned unchanged.
#[tokio::test]
async fn test_predict_passes_backend_response_through() {
    let mut server = Server::new_async().await;
    let backend_body = json!({
        "predicted_class": "spoiled_meat",
        "predicted_label": "Spoiled meat",
        "confidence": 0.51,
        "probabilities": {"spoiled_meat": 0.51, "fresh_meat": 0.49},
        "sensor_data": [25.5, 8.2, 23.5, 60.0]
    });
    let mock = server
        .mock("POST", "/predict")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"sensor_data": [25.5, 8.2, 23.5, 60.0]})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(backend_body.to_string())
        .expect(1)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), true);
    let response = app
        .oneshot(post_json(
            "/predict",
            json!({"sensor_data": [25.5, 8.2, 23.5, 60], "extra": "dropped"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_source(&response), "backend");
    assert_eq!(body_json(response).await, backend_body);
    mock.assert_async().await;
}

/// Valid JSON of an unexpected shape is still passed through.
#[tokio::test]
async fn test_differently_shaped_backend_json_is_not_validated() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/models")
        .with_status(200)
        .with_body(r#"{"models":{"ann":{"name":"ANN"}},"ensemble_method":"majority_voting"}"#)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), true);
    let response = app.oneshot(get("/models")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_source(&response), "backend");
    assert_eq!(
        body_json(response).await,
        json!({"models": {"ann": {"name": "ANN"}}, "ensemble_method": "majority_voting"})
    );
}

/// Two catalog calls against an unchanged backend return identical bodies.
#[tokio::test]
async fn test_catalog_endpoints_are_idempotent() {
    let mut server = Server::new_async().await;
    let sensors = server
        .mock("GET", "/sensors")
        .with_status(200)
        .with_body(r#"{"sensor_features":["NH3","H2S","TEMP","HUMI"],"sensor_count":4}"#)
        .expect(2)
        .create_async()
        .await;
    let models = server
        .mock("GET", "/models")
        .with_status(200)
        .with_body(r#"{"available_models":[],"total_models":0}"#)
        .expect(2)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), false);
    for uri in ["/sensors", "/models"] {
        let first = body_json(app.clone().oneshot(get(uri)).await.unwrap()).await;
        let second = body_json(app.clone().oneshot(get(uri)).await.unwrap()).await;
        assert_eq!(first, second, "{} not idempotent", uri);
    }

    sensors.assert_async().await;
    models.assert_async().await;
}

/// The telemetry endpoint forwards only the key.
#[tokio::test]
async fn test_thingspeak_forwards_api_key() {
    let mut server = Server::new_async().await;
    let with_key = server
        .mock("POST", "/predict/thingspeak")
        .match_body(Matcher::Json(json!({"api_key": "RJNVLFM0O88JP765"})))
        .with_status(200)
        .with_body(r#"{"input_data":[1,2,3,4]}"#)
        .expect(1)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), false);
    let response = app
        .oneshot(post_json(
            "/predict/thingspeak",
            json!({"api_key": "RJNVLFM0O88JP765", "channel": 42}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    with_key.assert_async().await;
}

/// No key in the request → `{}` upstream.
#[tokio::test]
async fn test_thingspeak_without_key_sends_empty_object() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/predict/thingspeak")
        .match_body(Matcher::Json(json!({})))
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), false);
    let response = app
        .clone()
        .oneshot(post_raw("/predict/thingspeak", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json("/predict/thingspeak", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    mock.assert_async().await;
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Malformed readings are rejected before any backend call.
#[tokio::test]
async fn test_invalid_sensor_data_never_reaches_backend() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/predict")
        .with_status(200)
        .with_body("{}")
        .expect(0)
        .create_async()
        .await;

    // Fallback on: validation errors must still not fall back
    let app = create_test_app(&server.url(), true);

    let bad_bodies = [
        json!({"sensor_data": [1, 2, 3]}),
        json!({"sensor_data": [1, 2, 3, 4, 5]}),
        json!({"sensor_data": []}),
        json!({"sensor_data": "25.5,8.2,23.5,60"}),
        json!({"sensor_data": [1, "two", 3, 4]}),
        json!({"readings": [1, 2, 3, 4]}),
        json!([1, 2, 3, 4]),
    ];

    for body in bad_bodies {
        let response = app
            .clone()
            .oneshot(post_json("/predict", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("sensor_data") || body.is_array());
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_wrong_length_message_names_channels() {
    let app = create_test_app(UNREACHABLE_BACKEND, true);
    let response = app
        .oneshot(post_json("/predict", json!({"sensor_data": [1, 2]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "sensor_data requires exactly 4 values: NH3, H2S, TEMP, HUMI (got 2)"
    );
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = create_test_app(UNREACHABLE_BACKEND, true);

    for uri in ["/predict", "/predict/thingspeak"] {
        let response = app
            .clone()
            .oneshot(post_raw(uri, "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    let response = app
        .oneshot(post_json("/predict/thingspeak", json!({"api_key": 12345})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Oversized bodies get 413 and no backend call.
#[tokio::test]
async fn test_body_over_limit_returns_413() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = app_with_config(
        &server.url(),
        runtime::shared(RuntimeConfig {
            fallback_enabled: true,
            body_size_limit_bytes: 16,
        }),
    );

    let oversized = json!({"sensor_data": [25.5, 8.2, 23.5, 60]});
    for uri in ["/predict", "/predict/thingspeak"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, oversized.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE, "{}", uri);
        assert_eq!(body_json(response).await["error"], "payload too large");
    }

    mock.assert_async().await;
}

// ── Fallback ──────────────────────────────────────────────────────────────────

/// 503 from the backend with fallback on: 200 with a synthetic prediction.
#[tokio::test]
async fn test_predict_backend_503_serves_fallback() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/predict")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), true);
    let response = app
        .oneshot(post_json(
            "/predict",
            json!({"sensor_data": [25.5, 8.2, 23.5, 60]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_source(&response), "fallback");

    let json = body_json(response).await;
    assert!(FRESHNESS_LABELS.contains(&json["predicted_class"].as_str().unwrap()));
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert_eq!(json["sensor_data"].as_array().unwrap().len(), CHANNEL_COUNT);

    mock.assert_async().await;
}

/// Same failure with fallback off surfaces as 502.
#[tokio::test]
async fn test_predict_backend_503_without_fallback_returns_502() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/predict")
        .with_status(503)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), false);
    let response = app
        .oneshot(post_json(
            "/predict",
            json!({"sensor_data": [25.5, 8.2, 23.5, 60]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get(DATA_SOURCE_HEADER).is_none());
    assert_eq!(body_json(response).await["error"], "backend API error: 503");
}

/// 200 with a non-JSON body counts as a failure.
#[tokio::test]
async fn test_unparseable_backend_body_falls_back() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/sensors")
        .with_status(200)
        .with_body("<!doctype html><p>maintenance</p>")
        .create_async()
        .await;

    let response = create_test_app(&server.url(), true)
        .oneshot(get("/sensors"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_source(&response), "fallback");
    let catalog: SensorCatalog = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(catalog.sensor_count, 4);

    let response = create_test_app(&server.url(), false)
        .oneshot(get("/sensors"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

/// Every endpoint stays renderable when the backend is down.
#[tokio::test]
async fn test_unreachable_backend_every_endpoint_falls_back() {
    let app = create_test_app(UNREACHABLE_BACKEND, true);

    let response = app.clone().oneshot(get("/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let models: ModelCatalog = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(models.total_models, models.available_models.len());
    assert_eq!(models.supported_features, vec!["NH3", "H2S", "TEMP", "HUMI"]);
    for model in &models.available_models {
        assert_eq!(model.feature_count, model.features.len());
    }

    let response = app.clone().oneshot(get("/sensors")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sensors: SensorCatalog = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(sensors.sensor_types.gas_sensors, vec!["NH3", "H2S"]);
    assert_eq!(sensors.sensor_types.environmental_sensors, vec!["TEMP", "HUMI"]);

    let response = app
        .clone()
        .oneshot(post_json("/predict", json!({"sensor_data": [1, 2, 3, 4]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let prediction: PredictionResult = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(prediction.probabilities.len(), 7);
    assert_eq!(
        prediction.predicted_class,
        FreshnessTier::from_score(prediction.confidence).class_label()
    );
    assert!((50.0..=70.0).contains(&prediction.sensor_data[3]));

    let response = app
        .oneshot(post_json("/predict/thingspeak", json!({"api_key": "KEY123"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let remote: RemotePredictionResult =
        serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(remote.metadata.thingspeak.api_key, "KEY123");
    assert_eq!(remote.metadata.sensor_names, vec!["NH3", "H2S", "TEMP", "HUMI"]);
    for (_, p) in remote.predictions.iter() {
        assert!(FRESHNESS_LABELS.contains(&p.class_label.as_str()));
    }
}

/// Unreachable backend without fallback → 502 on every endpoint.
#[tokio::test]
async fn test_unreachable_backend_without_fallback_returns_502() {
    let app = create_test_app(UNREACHABLE_BACKEND, false);

    let requests = vec![
        get("/models"),
        get("/sensors"),
        post_json("/predict", json!({"sensor_data": [1, 2, 3, 4]})),
        post_json("/predict/thingspeak", json!({})),
    ];
    for request in requests {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

/// A backend that never answers is cut off by the timeout.
#[tokio::test]
async fn test_hung_backend_returns_504_or_fallback() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let _hung = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let runtime_config = runtime::shared(RuntimeConfig::default());
    let app = create_router(AppState {
        backend: backend_client(&url, 200),
        fallback: FallbackGenerator::new(ChannelSet::Gas),
        runtime_config: runtime_config.clone(),
    });

    let response = app.clone().oneshot(get("/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    runtime_config.write().unwrap().fallback_enabled = true;
    let response = app.oneshot(get("/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_source(&response), "fallback");
}

/// Any valid reading yields a fixed-set label and a confidence in [0, 1].
#[tokio::test]
async fn test_valid_readings_always_yield_renderable_prediction() {
    let app = create_test_app(UNREACHABLE_BACKEND, true);
    let readings = [
        json!([0, 0, 0, 0]),
        json!([-5.5, 1e6, 23.5, 60]),
        json!([25.5, 8.2, 23.5, 60]),
        json!([55.4, 23.1, 24, 70]),
    ];

    for reading in readings {
        let response = app
            .clone()
            .oneshot(post_json("/predict", json!({"sensor_data": reading})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(FRESHNESS_LABELS.contains(&json["predicted_class"].as_str().unwrap()));
        assert!((0.0..=1.0).contains(&json["confidence"].as_f64().unwrap()));
    }
}

// ── Misc ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_healthz_does_not_touch_backend() {
    let app = create_test_app(UNREACHABLE_BACKEND, false);
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

/// Turning fallback on through the admin API changes proxy behavior immediately.
#[tokio::test]
async fn test_admin_toggle_applies_to_proxy() {
    let runtime_config = runtime::shared(RuntimeConfig::default());
    let app = create_app(
        AppState {
            backend: backend_client(UNREACHABLE_BACKEND, 1_000),
            fallback: FallbackGenerator::new(ChannelSet::Generic),
            runtime_config: runtime_config.clone(),
        },
        AdminAppState {
            runtime_config,
            admin_token: None,
        },
    );

    let response = app.clone().oneshot(get("/sensors")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let update = Request::builder()
        .method("PUT")
        .uri("/api/admin/config")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"fallback_enabled":true}"#))
        .unwrap();
    let response = app.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/sensors")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sensors: SensorCatalog = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(sensors.sensor_features, vec!["Sensor1", "Sensor2", "TEMP", "HUMI"]);
}
