use metrics::counter;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::ProviderError;
use crate::models::PriceQuote;

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
const COIN_ID: &str = "bittensor";

#[derive(Debug, Clone, Deserialize)]
struct SimplePriceResponse {
    bittensor: Option<CoinPrice>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoinPrice {
    #[serde(default)]
    usd: Option<Decimal>,
    #[serde(default)]
    eur: Option<Decimal>,
    #[serde(default)]
    usd_24h_change: Option<Decimal>,
}

/// TAO price oracle backed by CoinGecko's `/simple/price`.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: COINGECKO_API_BASE.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Current quote, or a zero quote when the price is unavailable.
    pub async fn fetch_quote(&self) -> PriceQuote {
        match self.try_fetch_quote().await {
            Ok(quote) => quote,
            Err(e) => {
                counter!("provider_errors_total", "provider" => "coingecko").increment(1);
                tracing::warn!(error = %e, "TAO price unavailable, using zero quote");
                PriceQuote::zero()
            }
        }
    }

    pub async fn try_fetch_quote(&self) -> Result<PriceQuote, ProviderError> {
        let url = Url::parse_with_params(
            &format!("{}/simple/price", self.base_url),
            &[
                ("ids", COIN_ID),
                ("vs_currencies", "usd,eur"),
                ("include_24hr_change", "true"),
            ],
        )
        .map_err(|e| ProviderError::Malformed(format!("bad url: {e}")))?;

        let resp = self.http.get(url).send().await?.error_for_status()?;
        let body: SimplePriceResponse = resp.json().await?;

        let price = body
            .bittensor
            .ok_or_else(|| ProviderError::Malformed(format!("no `{COIN_ID}` entry")))?;

        Ok(PriceQuote {
            usd: price.usd.unwrap_or(Decimal::ZERO),
            eur: price.eur.unwrap_or(Decimal::ZERO),
            change_24h_percent: price.usd_24h_change.unwrap_or(Decimal::ZERO),
        })
    }
}
