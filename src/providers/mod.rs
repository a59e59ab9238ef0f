pub mod coingecko;
pub mod taostats;
pub mod types;

pub use coingecko::CoinGeckoClient;
pub use taostats::TaostatsClient;
pub use types::MalformedRecord;

use std::time::Duration;

use thiserror::Error;

/// Any upstream failure. Callers treat every variant as "no data this cycle".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("non-2xx status: {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Http(e)
        }
    }
}

/// Shared HTTP client. Every upstream call is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("taowhale/", env!("CARGO_PKG_VERSION")))
        .build()
}
