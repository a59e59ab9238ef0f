pub mod alerts;
pub mod api;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod services;

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::providers::{CoinGeckoClient, TaostatsClient};
use crate::services::notifier::Notifier;
use crate::services::DaemonStatus;

/// Shared state of the operational HTTP API. Never holds the dedup window.
#[derive(Clone)]
pub struct AppState {
    pub chain: TaostatsClient,
    pub oracle: CoinGeckoClient,
    pub notifier: Arc<Notifier>,
    pub status: watch::Receiver<DaemonStatus>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub api_token: Option<String>,
    pub min_whale_amount: Decimal,
}
