use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wallet totals in TAO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub address: String,
    pub balance: Decimal,
    pub stake: Decimal,
    pub free: Decimal,
}

/// Stake held by a coldkey on one subnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakePosition {
    pub subnet_id: Option<u16>,
    pub hotkey: Option<String>,
    pub stake: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub netuid: u16,
    pub name: String,
    pub emission: Decimal,
    pub tempo: Option<u32>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetDetail {
    #[serde(flatten)]
    pub subnet: Subnet,
    pub miners: u32,
    pub max_n: u32,
}
