use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One post-funded account-size increase. Appended only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct ScalingStep {
    pub id: i64,
    pub challenge_id: i64,
    pub step_number: i32,
    pub size_before: Decimal,
    pub size_after: Decimal,
    pub triggered_at: DateTime<Utc>,
}
