pub mod todos;

use axum::{Json, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::types::Health;

/// Mounts the health probe and the given API router under `/api`, with
/// request tracing and permissive CORS.
pub fn app(router: Router) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(router);
    Router::new().nest("/api", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
    )
}

async fn health() -> Json<Health> {
    Json(Health { status: "running", message: "Hey! My todo API is working! 🎉" })
}
