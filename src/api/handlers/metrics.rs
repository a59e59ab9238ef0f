use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics::gauge;

use crate::AppState;

/// GET /metrics: Prometheus scrape, with the dedup gauge taken from the
/// daemon's latest published status.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    let dedup_size = state.status.borrow().dedup_size;
    gauge!("dedup_window_size").set(dedup_size as f64);

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_handle.render(),
    )
}
