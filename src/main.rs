use anyhow::{Context, Result};
use freshgate::api::{create_app, AdminAppState, AppState};
use freshgate::backend::BackendClient;
use freshgate::config::{self, GatewayConfig};
use freshgate::fallback::FallbackGenerator;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freshgate=info".into()),
        )
        .init();

    info!("Freshgate starting...");

    // Static config: optional TOML file, then environment overrides
    let mut gateway_config = match std::env::var("FRESHGATE_CONFIG") {
        Ok(path) => config::load_config(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config from {}: {}", path, e))?,
        Err(_) => GatewayConfig::default(),
    };
    gateway_config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    let runtime_config = config::new_runtime_config();
    let runtime_snapshot = config::runtime::current(&runtime_config);

    let admin_token = std::env::var("FRESHGATE_ADMIN_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());
    if admin_token.is_none() {
        warn!("FRESHGATE_ADMIN_TOKEN not set, admin config updates are unrestricted");
    }

    info!(
        backend_url = %gateway_config.backend.url,
        timeout_ms = gateway_config.backend.timeout_ms,
        channel_set = %gateway_config.sensors.channel_set,
        fallback_enabled = runtime_snapshot.fallback_enabled,
        "Configuration loaded"
    );

    let backend = BackendClient::new(&gateway_config.backend)?;

    let app = create_app(
        AppState {
            backend,
            fallback: FallbackGenerator::new(gateway_config.sensors.channel_set),
            runtime_config: runtime_config.clone(),
        },
        AdminAppState {
            runtime_config,
            admin_token,
        },
    );

    let bind_address = gateway_config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!(address = %bind_address, "API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    info!("Freshgate stopped");

    Ok(())
}
