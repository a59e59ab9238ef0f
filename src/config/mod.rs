use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

const DEFAULT_CHANNEL_ID: &str = "@SubNavisAlerts";
const DEFAULT_TAOSTATS_URL: &str = "https://api.taostats.io/api";
const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Telegram
    pub bot_token: String,
    pub channel_id: String,
    pub telegram_api_url: String,

    // Upstream providers
    pub taostats_api_key: Option<String>,
    pub taostats_base_url: String,
    pub coingecko_base_url: String,
    pub http_timeout_secs: u64,
    pub extrinsic_page_size: u32,
    pub max_alerts_per_poll: usize,

    // Daemon
    pub poll_interval_secs: u64,
    pub min_whale_amount: Decimal,
    pub dedup_capacity: usize,
    pub delivery_delay_secs: u64,
    pub startup_announcement: bool,

    // Operational API (served only when `port` is set)
    pub host: String,
    pub port: Option<u16>,
    pub api_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("SUBNAVIS_BOT_TOKEN")
            .ok_or(ConfigError::MissingCredential("SUBNAVIS_BOT_TOKEN"))?;

        let dedup_capacity: usize = parse_or(&get, "DEDUP_CAPACITY", 1_000)?;
        if dedup_capacity < 2 {
            return Err(ConfigError::Invalid {
                key: "DEDUP_CAPACITY",
                value: dedup_capacity.to_string(),
            });
        }

        let http_timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", 15)?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "HTTP_TIMEOUT_SECS",
                value: "0".into(),
            });
        }

        let poll_interval_secs: u64 = parse_or(&get, "POLL_INTERVAL_SECS", 300)?;
        let extrinsic_page_size: u32 = parse_or(&get, "EXTRINSIC_PAGE_SIZE", 50)?;
        let max_alerts_per_poll: usize = parse_or(&get, "MAX_ALERTS_PER_POLL", 10)?;
        for (key, value) in [
            ("POLL_INTERVAL_SECS", poll_interval_secs),
            ("EXTRINSIC_PAGE_SIZE", u64::from(extrinsic_page_size)),
            ("MAX_ALERTS_PER_POLL", max_alerts_per_poll as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: "0".into(),
                });
            }
        }

        let min_whale_amount: Decimal = parse_or(&get, "MIN_WHALE_AMOUNT", Decimal::from(10_000))?;
        if min_whale_amount.is_sign_negative() {
            return Err(ConfigError::Invalid {
                key: "MIN_WHALE_AMOUNT",
                value: min_whale_amount.to_string(),
            });
        }

        let port = match get("PORT") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?),
            None => None,
        };

        Ok(Self {
            bot_token,
            channel_id: get("ALERT_CHANNEL_ID").unwrap_or_else(|| DEFAULT_CHANNEL_ID.into()),
            telegram_api_url: get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_URL.into()),

            taostats_api_key: get("TAOSTATS_API_KEY"),
            taostats_base_url: get("TAOSTATS_BASE_URL").unwrap_or_else(|| DEFAULT_TAOSTATS_URL.into()),
            coingecko_base_url: get("COINGECKO_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COINGECKO_URL.into()),
            http_timeout_secs,
            extrinsic_page_size,
            max_alerts_per_poll,

            poll_interval_secs,
            min_whale_amount,
            dedup_capacity,
            delivery_delay_secs: parse_or(&get, "DELIVERY_DELAY_SECS", 2)?,
            startup_announcement: parse_or(&get, "STARTUP_ANNOUNCEMENT", true)?,

            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            api_token: get("API_TOKEN"),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn delivery_delay(&self) -> Duration {
        Duration::from_secs(self.delivery_delay_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
