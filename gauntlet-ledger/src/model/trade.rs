use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "trade_direction", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// +1 for long, −1 for short. Multiplies the raw price move into signed P&L.
    pub fn multiplier(&self) -> Decimal {
        match self {
            TradeDirection::Long => Decimal::ONE,
            TradeDirection::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "trade_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "close_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Manual,
    TakeProfit,
    StopLoss,
    /// Closed by the platform: violation liquidation or phase transition.
    Forced,
}

/// One execution record. Closed trades are append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Trade {
    pub id: i64,
    pub challenge_id: i64,
    pub symbol: String,
    pub direction: TradeDirection,
    pub status: TradeStatus,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    /// Base-asset quantity; already reflects the leveraged position.
    pub quantity: Decimal,
    pub leverage: i32,
    pub notional: Decimal,
    pub margin: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub pnl_pct: Option<Decimal>,
    pub close_reason: Option<CloseReason>,
    /// Exchange order id for synced trades; deduplicates replayed syncs.
    pub order_ref: Option<String>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }
}
