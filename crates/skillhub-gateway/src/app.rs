use axum::{
    routing::{get, post},
    Router,
};
use skillhub_scheduler::TaskScheduler;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub scheduler: TaskScheduler,
}

impl AppState {
    pub fn new(scheduler: TaskScheduler) -> Self {
        Self { scheduler }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/rpc", post(crate::http::rpc::rpc_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
