use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

/// GET /health: liveness probe, returns server metadata.
///
/// A store that cannot be read is reported as `"degraded"` with a null task
/// count.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (status, tasks) = match state.scheduler.get_all_tasks() {
        Ok(tasks) => ("ok", Some(tasks.len())),
        Err(e) => {
            warn!(error = %e, "health check could not read task store");
            ("degraded", None)
        }
    };
    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "tasks": tasks,
    }))
}
