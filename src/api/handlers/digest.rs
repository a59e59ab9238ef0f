use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::alerts::{classify, render_digest};
use crate::errors::AppError;
use crate::models::WhaleAlert;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DigestRequest {
    /// Chat id or `@channel` of the subscriber session.
    pub destination: String,
}

#[derive(Debug, Serialize)]
pub struct DigestSent {
    pub destination: String,
    pub movements: usize,
    pub text: String,
}

/// POST /api/digest: send the "Latest Whale Activity" digest to one chat.
///
/// An unavailable provider renders the "no activity" text rather than failing.
pub async fn send_digest(
    State(state): State<AppState>,
    Json(req): Json<DigestRequest>,
) -> Result<Json<ApiResponse<DigestSent>>, AppError> {
    let destination = req.destination.trim().to_string();
    if destination.is_empty() {
        return Err(AppError::BadRequest("destination must not be empty".into()));
    }

    let (fetched, quote) = tokio::join!(
        state.chain.fetch_recent_large_transactions(state.min_whale_amount),
        state.oracle.fetch_quote(),
    );

    let now = Utc::now();
    let alerts: Vec<WhaleAlert> = fetched
        .unwrap_or_default()
        .iter()
        .map(|tx| classify(tx, &quote, now))
        .collect();
    let text = render_digest(&alerts, &quote);

    state
        .notifier
        .send(&destination, &text)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    tracing::info!(destination = %destination, movements = alerts.len(), "Digest sent");

    Ok(Json(ApiResponse {
        success: true,
        data: Some(DigestSent {
            destination,
            movements: alerts.len(),
            text,
        }),
        error: None,
    }))
}
