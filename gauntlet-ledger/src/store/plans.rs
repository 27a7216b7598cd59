use super::LedgerStore;
use crate::{error::LedgerError, model::ChallengePlan};

impl LedgerStore {
    pub async fn plan(&self, plan_id: i32) -> Result<ChallengePlan, LedgerError> {
        sqlx::query_as::<_, ChallengePlan>("SELECT * FROM challenge_plans WHERE id = $1")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "challenge_plan",
                id: plan_id as i64,
            })
    }

    /// Plans currently purchasable.
    pub async fn active_plans(&self) -> Result<Vec<ChallengePlan>, LedgerError> {
        Ok(sqlx::query_as::<_, ChallengePlan>(
            "SELECT * FROM challenge_plans WHERE is_active ORDER BY account_size",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
