use super::LedgerStore;
use crate::{error::LedgerError, model::ScalingStep};

impl LedgerStore {
    /// Scaling steps of one challenge, oldest first.
    pub async fn scaling_steps(&self, challenge_id: i64) -> Result<Vec<ScalingStep>, LedgerError> {
        Ok(sqlx::query_as::<_, ScalingStep>(
            "SELECT * FROM scaling_steps WHERE challenge_id = $1 ORDER BY step_number",
        )
        .bind(challenge_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Most recent scaling step of one challenge.
    pub async fn last_scaling_step(
        &self,
        challenge_id: i64,
    ) -> Result<Option<ScalingStep>, LedgerError> {
        Ok(sqlx::query_as::<_, ScalingStep>(
            "SELECT * FROM scaling_steps WHERE challenge_id = $1 \
             ORDER BY step_number DESC LIMIT 1",
        )
        .bind(challenge_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
