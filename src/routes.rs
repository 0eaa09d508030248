//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /track/{token}` - Resolve a tracking link (public)
//! - `POST /track/{token}` - Resolve a protected link with a password form (public)
//! - `GET  /health`        - Health check: database, GeoIP provider (public)
//! - `/api/*`              - Link and campaign management API (bearer session required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/track` and `/api`
//! - **Authentication** - Bearer session token on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, track_handler, track_password_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the production router with all routes and middleware.
///
/// Rate limiting keys on the forwarding headers when `state.behind_proxy`
/// is set; enable that only behind a trusted reverse proxy.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, true))
}

/// Builds the route table, optionally without rate limiting.
///
/// The unlimited variant exists for embedding in test harnesses that issue
/// bursts of requests from a single address.
pub fn build_router(state: AppState, rate_limited: bool) -> Router {
    let behind_proxy = state.behind_proxy;

    let mut api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let mut track_router = Router::new().route(
        "/track/{token}",
        get(track_handler).post(track_password_handler),
    );

    if rate_limited {
        api_router = rate_limit::SECURE.apply(api_router, behind_proxy);
        track_router = rate_limit::PUBLIC.apply(track_router, behind_proxy);
    }

    Router::new()
        .merge(track_router)
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
