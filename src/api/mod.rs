//! JSON API for the dashboard
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Actor handle** for poll cycles, so cycles never overlap
//! - **Optional bearer auth** when a token is configured
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check (no auth)
//! - `GET /api/services` - Poll all services and return their state
//! - `POST /api/services` - Register a service
//! - `PUT /api/services` - Update a service
//! - `DELETE /api/services/:id` - Remove a service
//! - `GET /api/metrics` - Host metrics (runs threshold checks)
//! - `GET /api/notifications` - Recent notifications and unread count
//! - `POST /api/notifications/mark_read` - Mark all notifications read
//! - `GET /api/ping` - Latency to a well-known host
//! - `GET|POST /api/settings` - Alert settings of the current user
//! - `GET /api/network/scan` - Neighbour table

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiSettings;

/// Build the router with all routes and the configured layers
pub fn build_router(state: ApiState, settings: &ApiSettings) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route(
            "/api/services",
            get(routes::services::poll_services)
                .post(routes::services::create_service)
                .put(routes::services::update_service),
        )
        .route("/api/services/:id", delete(routes::services::delete_service))
        .route("/api/metrics", get(routes::metrics::get_metrics))
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/mark_read",
            post(routes::notifications::mark_read),
        )
        .route("/api/ping", get(routes::ping::ping))
        .route(
            "/api/settings",
            get(routes::settings::get_settings).post(routes::settings::update_settings),
        )
        .route("/api/network/scan", get(routes::network::scan))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Add auth middleware if token provided
    if let Some(token) = settings.auth_token.clone() {
        app = app.layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    // outermost: preflight requests carry no token
    if settings.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(settings: ApiSettings, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", settings.bind_addr);

    let app = build_router(state, &settings);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    // Spawn server in background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
