//! Router assembly: health checks, resource routes and HTTP layers

use crate::server::entity_registry::EntityRegistry;
use crate::server::handlers::PAGINATION_HEADER;
use crate::server::state::AppState;
use axum::{
    Json, Router,
    http::{HeaderName, header},
    routing::get,
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router
///
/// Merges health routes, every registered resource and any custom routes,
/// then binds the shared state and wraps the result in tracing and CORS.
pub fn build_router(
    registry: &EntityRegistry,
    state: AppState,
    custom_routes: Vec<Router<AppState>>,
) -> Router {
    let mut app = health_routes().merge(registry.build_routes());

    for custom_router in custom_routes {
        app = app.merge(custom_router);
    }

    app.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer()),
    )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(PAGINATION_HEADER), header::LOCATION])
}

/// Build health check routes
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "transit-rs"
    }))
}
