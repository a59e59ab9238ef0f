pub mod alert;
pub mod transaction;
pub mod wallet;

pub use alert::{Tier, WhaleAlert};
pub use transaction::{shorten_address, EventIdentity, RawTransaction, TxKind};
pub use wallet::{StakePosition, Subnet, SubnetDetail, WalletBalance};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceQuote
// ---------------------------------------------------------------------------

/// Current TAO exchange rate. A zero-valued quote means the price is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    pub usd: Decimal,
    pub eur: Decimal,
    pub change_24h_percent: Decimal,
}

impl PriceQuote {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.usd.is_zero()
    }
}
