use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{RawTransaction, StakePosition, Subnet, SubnetDetail, TxKind, WalletBalance};

/// rao per TAO.
pub const RAO_PER_TAO: i64 = 1_000_000_000;

/// One record that could not be decoded. The rest of the batch is still used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed record: {reason}")]
pub struct MalformedRecord {
    pub reason: String,
}

impl MalformedRecord {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope (TaoStats `{ "data": [...] }`)
// ---------------------------------------------------------------------------

/// Records stay as raw JSON so one bad entry can be skipped on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub data: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Extrinsic (`/v1/extrinsic/latest`)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiExtrinsic {
    #[serde(default)]
    pub call: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub block_timestamp: Option<Value>,
    #[serde(default)]
    pub netuid: Option<Value>,
}

impl TryFrom<ApiExtrinsic> for RawTransaction {
    type Error = MalformedRecord;

    fn try_from(api: ApiExtrinsic) -> Result<Self, Self::Error> {
        let kind = TxKind::from_call(api.call.as_deref().unwrap_or("transfer"));
        let amount = rao_to_tao(api.amount.as_ref())?;
        let block_timestamp = parse_block_timestamp(api.block_timestamp.as_ref())?;

        Ok(RawTransaction {
            kind,
            amount,
            source: api.from.unwrap_or_default(),
            destination: api.to.filter(|to| !to.is_empty()),
            subnet: parse_netuid(api.netuid.as_ref()),
            block_timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Balance / Stake (`/v1/balance/latest`, `/v1/stake/latest`)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBalance {
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub stake: Option<Value>,
    #[serde(default)]
    pub free: Option<Value>,
}

impl ApiBalance {
    pub fn into_balance(self, address: &str) -> Result<WalletBalance, MalformedRecord> {
        Ok(WalletBalance {
            address: address.to_string(),
            balance: rao_to_tao(self.balance.as_ref())?,
            stake: rao_to_tao(self.stake.as_ref())?,
            free: rao_to_tao(self.free.as_ref())?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStake {
    #[serde(default)]
    pub netuid: Option<Value>,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub stake: Option<Value>,
}

impl TryFrom<ApiStake> for StakePosition {
    type Error = MalformedRecord;

    fn try_from(api: ApiStake) -> Result<Self, Self::Error> {
        Ok(StakePosition {
            subnet_id: parse_netuid(api.netuid.as_ref()),
            hotkey: api.hotkey,
            stake: rao_to_tao(api.stake.as_ref())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Subnet (`/v1/subnet/latest`)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSubnet {
    #[serde(default)]
    pub netuid: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub emission: Option<Value>,
    #[serde(default)]
    pub tempo: Option<Value>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub n: Option<Value>,
    #[serde(default)]
    pub max_n: Option<Value>,
}

impl TryFrom<ApiSubnet> for Subnet {
    type Error = MalformedRecord;

    fn try_from(api: ApiSubnet) -> Result<Self, Self::Error> {
        let netuid = parse_netuid(api.netuid.as_ref())
            .ok_or_else(|| MalformedRecord::new("subnet without netuid"))?;

        Ok(Subnet {
            netuid,
            name: api
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("SN{netuid}")),
            emission: api
                .emission
                .as_ref()
                .and_then(decimal_from_value)
                .unwrap_or(Decimal::ZERO),
            tempo: api.tempo.as_ref().and_then(u32_from_value),
            owner: api.owner,
        })
    }
}

impl TryFrom<ApiSubnet> for SubnetDetail {
    type Error = MalformedRecord;

    fn try_from(api: ApiSubnet) -> Result<Self, Self::Error> {
        let miners = api.n.as_ref().and_then(u32_from_value).unwrap_or(0);
        let max_n = api.max_n.as_ref().and_then(u32_from_value).unwrap_or(256);
        Ok(SubnetDetail {
            subnet: Subnet::try_from(api)?,
            miners,
            max_n,
        })
    }
}

// ---------------------------------------------------------------------------
// Field decoding
// ---------------------------------------------------------------------------

/// Convert a rao amount (number or numeric string) into TAO. Missing means zero.
pub fn rao_to_tao(value: Option<&Value>) -> Result<Decimal, MalformedRecord> {
    let rao = match value {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(v) => decimal_from_value(v)
            .ok_or_else(|| MalformedRecord::new(format!("unparseable amount {v}")))?,
    };

    if rao.is_sign_negative() && !rao.is_zero() {
        return Err(MalformedRecord::new(format!("negative amount {rao}")));
    }

    Ok(rao / Decimal::from(RAO_PER_TAO))
}

pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

fn u32_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|u| u32::try_from(u).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_netuid(value: Option<&Value>) -> Option<u16> {
    value
        .and_then(u32_from_value)
        .and_then(|n| u16::try_from(n).ok())
}

/// Accepts unix seconds, unix milliseconds (number or string) and RFC 3339.
pub fn parse_block_timestamp(
    value: Option<&Value>,
) -> Result<Option<DateTime<Utc>>, MalformedRecord> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().and_then(from_unix),
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(secs) => from_unix(secs),
            Err(_) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        },
        Some(_) => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| MalformedRecord::new(format!("unparseable block_timestamp {value:?}")))
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    // If >1e12, it's milliseconds
    if secs > 1_000_000_000_000 {
        DateTime::from_timestamp(secs / 1000, ((secs % 1000) * 1_000_000) as u32)
    } else {
        DateTime::from_timestamp(secs, 0)
    }
}
