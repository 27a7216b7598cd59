use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "payout_network", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutNetwork {
    Trc20,
    Erc20,
    Bep20,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Sent,
}

impl PayoutStatus {
    /// Statuses that count against the trader's available profit split: everything the
    /// operator has not rejected.
    pub fn reserves_funds(&self) -> bool {
        !matches!(self, PayoutStatus::Rejected)
    }
}

/// Profit-split withdrawal request of a funded trader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Payout {
    pub id: i64,
    pub challenge_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub wallet_address: String,
    pub network: PayoutNetwork,
    pub status: PayoutStatus,
    pub tx_hash: Option<String>,
    pub reject_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
