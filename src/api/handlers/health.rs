use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// GET /health: liveness plus the daemon's latest published status.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.status.borrow().clone();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "state": status.state,
            "cycles": status.cycles,
            "dedup_size": status.dedup_size,
            "last_cycle": status.last_cycle,
        })),
    )
}
