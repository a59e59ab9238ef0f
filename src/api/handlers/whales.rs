use axum::extract::State;
use axum::Json;
use chrono::Utc;

use super::ApiResponse;
use crate::alerts::classify;
use crate::models::WhaleAlert;
use crate::AppState;

/// GET /api/whales/recent: current whale movements, classified, no dedup.
pub async fn recent(State(state): State<AppState>) -> Json<ApiResponse<Vec<WhaleAlert>>> {
    let (fetched, quote) = tokio::join!(
        state.chain.fetch_recent_large_transactions(state.min_whale_amount),
        state.oracle.fetch_quote(),
    );

    match fetched {
        Ok(transactions) => {
            let now = Utc::now();
            let alerts = transactions
                .iter()
                .map(|tx| classify(tx, &quote, now))
                .collect();
            Json(ApiResponse {
                success: true,
                data: Some(alerts),
                error: None,
            })
        }
        Err(e) => Json(ApiResponse {
            success: false,
            data: None,
            error: Some(e.to_string()),
        }),
    }
}
