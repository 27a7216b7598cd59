use super::LedgerStore;
use crate::{
    error::LedgerError,
    model::{Payout, PayoutNetwork},
};
use rust_decimal::Decimal;

/// Inputs for a payout request. Validation against available profit happens in the
/// engine layer before insertion.
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub challenge_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub wallet_address: String,
    pub network: PayoutNetwork,
}

impl LedgerStore {
    /// Payouts of one user, newest first.
    pub async fn payouts_for_user(&self, user_id: i64) -> Result<Vec<Payout>, LedgerError> {
        Ok(sqlx::query_as::<_, Payout>(
            "SELECT * FROM payouts WHERE user_id = $1 ORDER BY requested_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Sum of net amounts already reserved against a challenge's profit split
    /// (everything not rejected).
    pub async fn sum_reserved_net(&self, challenge_id: i64) -> Result<Decimal, LedgerError> {
        Ok(sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT sum(net_amount) FROM payouts \
             WHERE challenge_id = $1 AND status != 'rejected'",
        )
        .bind(challenge_id)
        .fetch_one(&self.pool)
        .await?
        .unwrap_or(Decimal::ZERO))
    }

    /// Whether the challenge has a payout awaiting operator action.
    pub async fn has_pending_payout(&self, challenge_id: i64) -> Result<bool, LedgerError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM payouts WHERE challenge_id = $1 AND status = 'pending'",
        )
        .bind(challenge_id)
        .fetch_one(&self.pool)
        .await?
            > 0)
    }

    /// Insert a payout in `pending`.
    pub async fn insert_payout(&self, new: NewPayout) -> Result<Payout, LedgerError> {
        Ok(sqlx::query_as::<_, Payout>(
            "INSERT INTO payouts ( \
                 challenge_id, user_id, amount, fee, net_amount, wallet_address, network \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(new.challenge_id)
        .bind(new.user_id)
        .bind(new.amount)
        .bind(new.fee)
        .bind(new.net_amount)
        .bind(&new.wallet_address)
        .bind(new.network)
        .fetch_one(&self.pool)
        .await?)
    }
}
