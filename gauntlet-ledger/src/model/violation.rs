use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rule the trader broke.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "violation_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DailyLoss,
    TotalLoss,
    Consistency,
    NewsBan,
    MaxTradingDays,
    SelfHedging,
    Custom,
}

/// Appended-only record of a broken rule: the observed value and the limit it crossed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Violation {
    pub id: i64,
    pub challenge_id: i64,
    pub kind: ViolationKind,
    pub description: String,
    pub value: Decimal,
    pub limit_value: Decimal,
    pub occurred_at: DateTime<Utc>,
}
