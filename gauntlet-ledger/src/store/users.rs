use super::LedgerStore;
use crate::{
    error::LedgerError,
    model::{User, UserRole},
};

impl LedgerStore {
    /// Find a user by internal id.
    pub async fn user(&self, user_id: i64) -> Result<User, LedgerError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "user",
                id: user_id,
            })
    }

    /// Find a user by external (messaging-platform) id.
    pub async fn user_by_external_id(&self, external_id: i64) -> Result<Option<User>, LedgerError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = $1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Create a user on first contact. The referral code must be unique; the caller
    /// retries with a fresh code on conflict.
    pub async fn create_user(
        &self,
        external_id: i64,
        referral_code: &str,
        referred_by: Option<i64>,
    ) -> Result<User, LedgerError> {
        Ok(sqlx::query_as::<_, User>(
            "INSERT INTO users (external_id, referral_code, referred_by) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(external_id)
        .bind(referral_code)
        .bind(referred_by)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Resolve a referral code to its owner.
    pub async fn user_by_referral_code(&self, code: &str) -> Result<Option<User>, LedgerError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE referral_code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn set_user_role(&self, user_id: i64, role: UserRole) -> Result<(), LedgerError> {
        sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_user_blocked(&self, user_id: i64, blocked: bool) -> Result<(), LedgerError> {
        sqlx::query("UPDATE users SET blocked = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(blocked)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
