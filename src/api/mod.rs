// HTTP API: proxied prediction endpoints and runtime administration

pub mod admin;
pub mod proxy;

pub use admin::{create_admin_router, AdminAppState};
pub use proxy::{create_router, AppError, AppState, DATA_SOURCE_HEADER};

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

/// Full application: proxy + admin routes, reachable from any browser origin.
pub fn create_app(state: AppState, admin_state: AdminAppState) -> Router {
    create_router(state)
        .merge(create_admin_router(admin_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any)
                .expose_headers([axum::http::HeaderName::from_static(DATA_SOURCE_HEADER)]),
        )
}
