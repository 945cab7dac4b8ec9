pub mod auth;
pub mod comments;
pub mod projects;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::AppState;

// Room for the text fields that travel alongside an upload
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    let api_router = Router::new()
        .merge(auth::router())
        .nest("/projects", projects::router(body_limit))
        .nest("/comments", comments::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .nest_service("/uploads", ServeDir::new(state.storage.base_path()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}
