use metrics::counter;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{ApiBalance, ApiEnvelope, ApiExtrinsic, ApiStake, ApiSubnet};
use super::ProviderError;
use crate::models::{RawTransaction, StakePosition, Subnet, SubnetDetail, WalletBalance};

const TAOSTATS_API_BASE: &str = "https://api.taostats.io/api";

/// Read-only client for the TaoStats analytics API.
#[derive(Debug, Clone)]
pub struct TaostatsClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
    max_results: usize,
}

impl TaostatsClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: TAOSTATS_API_BASE.into(),
            api_key,
            page_size: 50,
            max_results: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `page_size` records are requested; at most `max_results` whales are kept.
    pub fn with_limits(mut self, page_size: u32, max_results: usize) -> Self {
        self.page_size = page_size;
        self.max_results = max_results;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    /// Latest `subtensorModule` extrinsics worth at least `min_amount` TAO, in provider order.
    ///
    /// Records that fail to decode are skipped individually.
    pub async fn fetch_recent_large_transactions(
        &self,
        min_amount: Decimal,
    ) -> Result<Vec<RawTransaction>, ProviderError> {
        let page_size = self.page_size.to_string();
        let records = self
            .get_records(
                "/v1/extrinsic/latest",
                &[("module", "subtensorModule"), ("limit", page_size.as_str())],
            )
            .await?;

        let whales: Vec<RawTransaction> = decode_records::<ApiExtrinsic, RawTransaction>(records)
            .into_iter()
            .filter(|tx| tx.amount >= min_amount)
            .take(self.max_results)
            .collect();

        tracing::debug!(
            count = whales.len(),
            min_amount = %min_amount,
            "Fetched whale-sized extrinsics"
        );

        Ok(whales)
    }

    /// Latest balance of a coldkey. `Ok(None)` when the provider has no record.
    pub async fn fetch_wallet_balance(
        &self,
        address: &str,
    ) -> Result<Option<WalletBalance>, ProviderError> {
        let records = self
            .get_records("/v1/balance/latest", &[("address", address)])
            .await?;

        let Some(first) = records.into_iter().next() else {
            return Ok(None);
        };

        let api: ApiBalance =
            serde_json::from_value(first).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let balance = api
            .into_balance(address)
            .map_err(|e| ProviderError::Malformed(e.reason))?;

        Ok(Some(balance))
    }

    /// Per-subnet stake positions of a coldkey.
    pub async fn fetch_wallet_stakes(
        &self,
        address: &str,
    ) -> Result<Vec<StakePosition>, ProviderError> {
        let records = self
            .get_records("/v1/stake/latest", &[("address", address)])
            .await?;

        Ok(decode_records::<ApiStake, StakePosition>(records))
    }

    pub async fn fetch_subnets(&self, limit: u32) -> Result<Vec<Subnet>, ProviderError> {
        let limit = limit.to_string();
        let records = self
            .get_records("/v1/subnet/latest", &[("limit", limit.as_str())])
            .await?;

        Ok(decode_records::<ApiSubnet, Subnet>(records))
    }

    pub async fn fetch_subnet_detail(
        &self,
        netuid: u16,
    ) -> Result<Option<SubnetDetail>, ProviderError> {
        let netuid = netuid.to_string();
        let records = self
            .get_records("/v1/subnet/latest", &[("netuid", netuid.as_str())])
            .await?;

        Ok(decode_records::<ApiSubnet, SubnetDetail>(records)
            .into_iter()
            .next())
    }

    /// GET `endpoint` and unwrap the `{ "data": [...] }` envelope.
    async fn get_records(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>, ProviderError> {
        let url = Url::parse_with_params(&format!("{}{}", self.base_url, endpoint), params)
            .map_err(|e| ProviderError::Malformed(format!("bad url: {e}")))?;

        // Without a key the request still goes out, with an empty Authorization header.
        let authorization = self
            .api_key
            .as_deref()
            .map(|key| format!("Bearer {key}"))
            .unwrap_or_default();

        let result = async {
            let resp = self
                .http
                .get(url)
                .header(AUTHORIZATION, authorization)
                .header(CONTENT_TYPE, "application/json")
                .send()
                .await?
                .error_for_status()?;

            let envelope: ApiEnvelope = resp.json().await?;
            Ok::<_, ProviderError>(envelope.data)
        }
        .await;

        if let Err(e) = &result {
            counter!("provider_errors_total", "provider" => "taostats").increment(1);
            tracing::warn!(error = %e, endpoint = endpoint, "TaoStats request failed");
        }

        result
    }
}

/// Decode each raw record, skipping (and counting) the ones that don't fit.
fn decode_records<A, T>(records: Vec<Value>) -> Vec<T>
where
    A: DeserializeOwned,
    T: TryFrom<A, Error = super::MalformedRecord>,
{
    let mut out = Vec::with_capacity(records.len());

    for record in records {
        let decoded = serde_json::from_value::<A>(record)
            .map_err(|e| super::MalformedRecord {
                reason: e.to_string(),
            })
            .and_then(T::try_from);

        match decoded {
            Ok(item) => out.push(item),
            Err(e) => {
                counter!("malformed_records_total").increment(1);
                tracing::warn!(reason = %e.reason, "Skipping malformed provider record");
            }
        }
    }

    out
}
