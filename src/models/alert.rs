use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TxKind;

/// Magnitude tier of a whale movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Whale,
    BigWhale,
    MegaWhale,
}

impl Tier {
    pub const BIG_WHALE_MIN: i64 = 50_000;
    pub const MEGA_WHALE_MIN: i64 = 100_000;

    pub fn for_amount(amount: Decimal) -> Self {
        if amount >= Decimal::from(Self::MEGA_WHALE_MIN) {
            Tier::MegaWhale
        } else if amount >= Decimal::from(Self::BIG_WHALE_MIN) {
            Tier::BigWhale
        } else {
            Tier::Whale
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Tier::Whale => "🐋 WHALE",
            Tier::BigWhale => "🐋🐋 BIG WHALE",
            Tier::MegaWhale => "🐋🐋🐋 MEGA WHALE",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Whale => "whale",
            Tier::BigWhale => "big_whale",
            Tier::MegaWhale => "mega_whale",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified whale movement, ready to render. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhaleAlert {
    pub tier: Tier,
    #[serde(skip)]
    pub kind: TxKind,
    pub action: String,
    pub amount: Decimal,
    pub usd_value: Decimal,
    /// TAO/USD rate used for `usd_value`; zero when the price was unavailable.
    pub price_usd: Decimal,
    pub subnet: Option<u16>,
    /// Truncated source address, for display only.
    pub from: String,
    pub timestamp: DateTime<Utc>,
}
