use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TxKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Stake,
    Unstake,
    Transfer,
    /// Any other extrinsic call, keeping the provider's raw label.
    Other(String),
}

impl TxKind {
    /// Map a `subtensorModule` call name onto a kind.
    pub fn from_call(call: &str) -> Self {
        let call = call.trim();
        match call.to_lowercase().as_str() {
            c if c.starts_with("add_stake") => TxKind::Stake,
            c if c.starts_with("remove_stake") || c.starts_with("unstake") => TxKind::Unstake,
            c if c.starts_with("transfer") => TxKind::Transfer,
            _ => TxKind::Other(call.to_string()),
        }
    }

    /// Uppercase action label shown in alerts.
    pub fn action_label(&self) -> String {
        match self {
            TxKind::Stake => "STAKE".into(),
            TxKind::Unstake => "UNSTAKE".into(),
            TxKind::Transfer => "TRANSFER".into(),
            TxKind::Other(raw) => raw.to_uppercase(),
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Stake => write!(f, "stake"),
            TxKind::Unstake => write!(f, "unstake"),
            TxKind::Transfer => write!(f, "transfer"),
            TxKind::Other(raw) => write!(f, "{raw}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTransaction: one decoded extrinsic from the analytics provider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub kind: TxKind,
    /// Amount in TAO (already scaled down from rao).
    pub amount: Decimal,
    pub source: String,
    pub destination: Option<String>,
    pub subnet: Option<u16>,
    pub block_timestamp: Option<DateTime<Utc>>,
}

impl RawTransaction {
    pub fn identity(&self) -> EventIdentity {
        EventIdentity {
            kind: self.kind.clone(),
            amount: self.amount.normalize(),
            source: self.source.clone(),
            block_timestamp: self.block_timestamp,
        }
    }
}

impl fmt::Display for RawTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Extrinsic: kind={} amount={} from={} subnet={:?}",
            self.kind,
            self.amount,
            shorten_address(&self.source),
            self.subnet,
        )
    }
}

// ---------------------------------------------------------------------------
// EventIdentity: key used to recognise the same extrinsic across polls
// ---------------------------------------------------------------------------

/// Composite key `(kind, amount, source, block timestamp)`.
///
/// The amount is normalized so `125000` and `125000.000` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    pub kind: TxKind,
    pub amount: Decimal,
    pub source: String,
    pub block_timestamp: Option<DateTime<Utc>>,
}

/// `5F3sa2TJAWMqDhXG6jhV4N8ko9SxwGy8TpaNS1repo5EYjQX` → `5F3sa2TJ...`
pub fn shorten_address(address: &str) -> String {
    if address.chars().count() > 8 {
        let head: String = address.chars().take(8).collect();
        format!("{head}...")
    } else {
        address.to_string()
    }
}
