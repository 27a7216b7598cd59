use super::LedgerStore;
use crate::{
    error::LedgerError,
    model::{Violation, ViolationKind},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Inputs for appending a violation.
#[derive(Debug, Clone)]
pub struct NewViolation {
    pub kind: ViolationKind,
    pub description: String,
    pub value: Decimal,
    pub limit_value: Decimal,
}

impl LedgerStore {
    /// Violations of one challenge, newest first.
    pub async fn violations(&self, challenge_id: i64) -> Result<Vec<Violation>, LedgerError> {
        Ok(sqlx::query_as::<_, Violation>(
            "SELECT * FROM violations WHERE challenge_id = $1 ORDER BY occurred_at DESC",
        )
        .bind(challenge_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Append a violation outside a failure transition (eg/ a warning-grade custom
    /// rule recorded by an operator).
    pub async fn insert_violation(
        &self,
        challenge_id: i64,
        new: NewViolation,
        occurred_at: DateTime<Utc>,
    ) -> Result<Violation, LedgerError> {
        Ok(sqlx::query_as::<_, Violation>(
            "INSERT INTO violations (challenge_id, kind, description, value, limit_value, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(challenge_id)
        .bind(new.kind)
        .bind(&new.description)
        .bind(new.value)
        .bind(new.limit_value)
        .bind(occurred_at)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Whether any violation occurred at or after `since`. Gates scaling eligibility.
    pub async fn violations_exist_since(
        &self,
        challenge_id: i64,
        since: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM violations WHERE challenge_id = $1 AND occurred_at > $2",
        )
        .bind(challenge_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?
            > 0)
    }

    /// Whether any violation occurred in `[from, to)`. Gates trading-day counting.
    pub async fn violations_exist_between(
        &self,
        challenge_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM violations \
             WHERE challenge_id = $1 AND occurred_at >= $2 AND occurred_at < $3",
        )
        .bind(challenge_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?
            > 0)
    }
}
