use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How total drawdown is anchored.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "drawdown_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DrawdownType {
    /// Measured from the original `initial_balance`.
    Static,
    /// Measured from the highest-ever observed equity.
    Trailing,
}

/// Named challenge template. Immutable once referenced by an active challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct ChallengePlan {
    pub id: i32,
    pub name: String,
    pub account_size: Decimal,
    pub price: Decimal,
    pub profit_target_phase1_pct: Decimal,
    pub profit_target_phase2_pct: Decimal,
    pub max_daily_loss_pct: Decimal,
    pub max_total_loss_pct: Decimal,
    pub drawdown_type: DrawdownType,
    pub min_trading_days: i32,
    pub max_trading_days: Option<i32>,
    /// No single UTC day may contribute more than 30% of cumulative profit.
    pub consistency_rule: bool,
    /// Single evaluation phase straight to funded.
    pub one_phase: bool,
    pub max_leverage: i32,
    pub profit_split_pct: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ChallengePlan {
    /// Profit target for the provided phase, as percent of `initial_balance`.
    pub fn profit_target_pct(&self, phase: i16) -> Decimal {
        if phase <= 1 {
            self.profit_target_phase1_pct
        } else {
            self.profit_target_phase2_pct
        }
    }
}
