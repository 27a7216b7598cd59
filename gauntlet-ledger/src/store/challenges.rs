use super::{violations::NewViolation, LedgerStore};
use crate::{
    error::LedgerError,
    model::{Challenge, ChallengeStatus, UserRole},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Inputs for creating a challenge at purchase time, demo account already provisioned.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub user_id: i64,
    pub plan_id: i32,
    pub account_size: Decimal,
    pub demo_account_id: String,
    pub demo_api_key_enc: String,
    pub demo_api_secret_enc: String,
}

impl LedgerStore {
    pub async fn challenge(&self, challenge_id: i64) -> Result<Challenge, LedgerError> {
        sqlx::query_as::<_, Challenge>("SELECT * FROM challenges WHERE id = $1")
            .bind(challenge_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "challenge",
                id: challenge_id,
            })
    }

    /// Challenges the rule-check loop reconciles: active and not quarantined.
    pub async fn active_challenges(&self) -> Result<Vec<Challenge>, LedgerError> {
        Ok(sqlx::query_as::<_, Challenge>(
            "SELECT * FROM challenges \
             WHERE status IN ('phase1', 'phase2', 'funded') AND NOT quarantined \
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Active challenges of one user.
    pub async fn active_challenges_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Challenge>, LedgerError> {
        Ok(sqlx::query_as::<_, Challenge>(
            "SELECT * FROM challenges \
             WHERE user_id = $1 AND status IN ('phase1', 'phase2', 'funded') \
             ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Create a challenge in `phase1` with every balance anchored at the plan's
    /// account size. Fails with [`LedgerError::Conflict`] if the user already has an
    /// active attempt on the same plan.
    pub async fn create_challenge(&self, new: NewChallenge) -> Result<Challenge, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let duplicate = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM challenges \
             WHERE user_id = $1 AND plan_id = $2 \
               AND status IN ('phase1', 'phase2', 'funded')",
        )
        .bind(new.user_id)
        .bind(new.plan_id)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate > 0 {
            return Err(LedgerError::Conflict(
                "an active challenge already exists for this plan".into(),
            ));
        }

        let challenge = sqlx::query_as::<_, Challenge>(
            "INSERT INTO challenges ( \
                 user_id, plan_id, phase, \
                 demo_account_id, demo_api_key_enc, demo_api_secret_enc, \
                 initial_balance, current_balance, peak_equity, daily_start_balance, \
                 daily_reset_at \
             ) VALUES ($1, $2, 1, $3, $4, $5, $6, $6, $6, $6, now()) \
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(new.plan_id)
        .bind(&new.demo_account_id)
        .bind(&new.demo_api_key_enc)
        .bind(&new.demo_api_secret_enc)
        .bind(new.account_size)
        .fetch_one(&mut *tx)
        .await?;

        // First purchase elevates a guest to challenger
        sqlx::query(
            "UPDATE users SET role = $2, updated_at = now() \
             WHERE id = $1 AND role = 'guest'",
        )
        .bind(new.user_id)
        .bind(UserRole::Challenger)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(challenge_id = challenge.id, user_id = new.user_id, "challenge created");
        Ok(challenge)
    }

    /// Persist the mutable monetary state after an uneventful tick. Single statement,
    /// no explicit transaction required.
    ///
    /// Trade counters are excluded: they move only through the atomic increments in
    /// [`settle_trade_close`](Self::settle_trade_close) and
    /// [`bump_trade_counters`](Self::bump_trade_counters), so a tick with a stale
    /// in-memory model cannot roll them back.
    pub async fn update_tick_state(&self, challenge: &Challenge) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE challenges SET \
                 current_balance = $2, peak_equity = $3, daily_start_balance = $4, \
                 daily_pnl = $5, total_pnl = $6, daily_reset_at = $7, \
                 trading_days_count = $8, last_trade_sync_at = $9, updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge.id)
        .bind(challenge.current_balance)
        .bind(challenge.peak_equity)
        .bind(challenge.daily_start_balance)
        .bind(challenge.daily_pnl)
        .bind(challenge.total_pnl)
        .bind(challenge.daily_reset_at)
        .bind(challenge.trading_days_count)
        .bind(challenge.last_trade_sync_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Atomically reserve margin from the challenge balance when a synthetic trade
    /// opens. Returns `false` if the balance cannot cover the margin.
    pub async fn reserve_margin(
        &self,
        challenge_id: i64,
        margin: Decimal,
    ) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            "UPDATE challenges SET current_balance = current_balance - $2, updated_at = now() \
             WHERE id = $1 AND current_balance >= $2",
        )
        .bind(challenge_id)
        .bind(margin)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically return margin plus realised P&L when a synthetic trade closes, and
    /// advance the trade counters.
    pub async fn settle_trade_close(
        &self,
        challenge_id: i64,
        margin: Decimal,
        realized_pnl: Decimal,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE challenges SET \
                 current_balance = current_balance + $2 + $3, \
                 total_trades = total_trades + 1, \
                 winning_trades = winning_trades + CASE WHEN $3 > 0 THEN 1 ELSE 0 END, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(margin)
        .bind(realized_pnl)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Advance trade counters for executions synced from the exchange.
    pub async fn bump_trade_counters(
        &self,
        challenge_id: i64,
        total_delta: i32,
        winning_delta: i32,
    ) -> Result<(), LedgerError> {
        if total_delta == 0 && winning_delta == 0 {
            return Ok(());
        }
        sqlx::query(
            "UPDATE challenges SET \
                 total_trades = total_trades + $2, winning_trades = winning_trades + $3, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(total_delta)
        .bind(winning_delta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Commit a `* → failed` transition: status, violation record, and the user role
    /// downgrade (to guest, only when no other active challenge remains), atomically.
    ///
    /// Returns `true` if the user role was downgraded.
    pub async fn fail_challenge(
        &self,
        challenge: &Challenge,
        violation: NewViolation,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, ChallengeStatus>(
            "SELECT status FROM challenges WHERE id = $1 FOR UPDATE",
        )
        .bind(challenge.id)
        .fetch_one(&mut *tx)
        .await?;

        if !status.can_transition_to(ChallengeStatus::Failed) {
            warn!(
                challenge_id = challenge.id,
                ?status,
                "failure transition skipped, status no longer active"
            );
            return Ok(false);
        }

        sqlx::query(
            "UPDATE challenges SET \
                 status = 'failed', failed_at = $2, failed_reason = $3, \
                 current_balance = $4, peak_equity = $5, daily_pnl = $6, total_pnl = $7, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge.id)
        .bind(now)
        .bind(&violation.description)
        .bind(challenge.current_balance)
        .bind(challenge.peak_equity)
        .bind(challenge.daily_pnl)
        .bind(challenge.total_pnl)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO violations (challenge_id, kind, description, value, limit_value, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(challenge.id)
        .bind(violation.kind)
        .bind(&violation.description)
        .bind(violation.value)
        .bind(violation.limit_value)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let other_active = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM challenges \
             WHERE user_id = $1 AND id != $2 \
               AND status IN ('phase1', 'phase2', 'funded')",
        )
        .bind(challenge.user_id)
        .bind(challenge.id)
        .fetch_one(&mut *tx)
        .await?;

        let downgraded = other_active == 0;
        if downgraded {
            sqlx::query(
                "UPDATE users SET role = 'guest', updated_at = now() \
                 WHERE id = $1 AND role NOT IN ('admin', 'super_admin')",
            )
            .bind(challenge.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(challenge_id = challenge.id, "challenge failed");
        Ok(downgraded)
    }

    /// Commit a `phase1 → phase2` promotion: counters zeroed, balances restored to
    /// `initial_balance`, phase updated.
    pub async fn promote_to_phase2(
        &self,
        challenge_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, ChallengeStatus>(
            "SELECT status FROM challenges WHERE id = $1 FOR UPDATE",
        )
        .bind(challenge_id)
        .fetch_one(&mut *tx)
        .await?;

        if !status.can_transition_to(ChallengeStatus::Phase2) {
            warn!(challenge_id, ?status, "phase2 promotion skipped");
            return Ok(());
        }

        sqlx::query(
            "UPDATE challenges SET \
                 status = 'phase2', phase = 2, phase_passed_at = $2, \
                 trading_days_count = 0, daily_pnl = 0, total_pnl = 0, \
                 current_balance = initial_balance, peak_equity = initial_balance, \
                 daily_start_balance = initial_balance, daily_reset_at = $2, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(challenge_id, "challenge promoted to phase2");
        Ok(())
    }

    /// Persist freshly provisioned funded credentials ahead of the status commit.
    ///
    /// If the process dies between this write and [`promote_to_funded`], the partial
    /// state is visible (`funded_api_key_enc` set, status not `funded`) and the
    /// orchestrator resumes the promotion without provisioning again.
    pub async fn store_funded_credentials(
        &self,
        challenge_id: i64,
        account_id: &str,
        api_key_enc: &str,
        api_secret_enc: &str,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE challenges SET \
                 funded_account_id = $2, funded_api_key_enc = $3, funded_api_secret_enc = $4, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(account_id)
        .bind(api_key_enc)
        .bind(api_secret_enc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Commit a `* → funded` promotion: switch to the funded sub-account, zero the
    /// counters, restore balances, elevate the user role. Credentials must already be
    /// stored via [`store_funded_credentials`].
    pub async fn promote_to_funded(
        &self,
        challenge_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, ChallengeStatus>(
            "SELECT status FROM challenges WHERE id = $1 FOR UPDATE",
        )
        .bind(challenge_id)
        .fetch_one(&mut *tx)
        .await?;

        if !status.can_transition_to(ChallengeStatus::Funded) {
            warn!(challenge_id, ?status, "funded promotion skipped");
            return Ok(());
        }

        sqlx::query(
            "UPDATE challenges SET \
                 status = 'funded', account_mode = 'funded', phase = NULL, \
                 funded_at = $2, phase_passed_at = $2, \
                 trading_days_count = 0, daily_pnl = 0, total_pnl = 0, \
                 current_balance = initial_balance, peak_equity = initial_balance, \
                 daily_start_balance = initial_balance, daily_reset_at = $2, \
                 last_trade_sync_at = $2, updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET role = 'funded', updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(challenge_id, user_id, "challenge promoted to funded");
        Ok(())
    }

    /// Commit one scaling step: append the step record and rebase `initial_balance`
    /// so future drawdowns and targets measure from the new size.
    ///
    /// The `(challenge_id, step_number)` uniqueness makes a replayed commit a no-op.
    pub async fn apply_scaling(
        &self,
        challenge_id: i64,
        step_number: i32,
        size_before: Decimal,
        size_after: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, ChallengeStatus>(
            "SELECT status FROM challenges WHERE id = $1 FOR UPDATE",
        )
        .bind(challenge_id)
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            "INSERT INTO scaling_steps (challenge_id, step_number, size_before, size_after, triggered_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (challenge_id, step_number) DO NOTHING",
        )
        .bind(challenge_id)
        .bind(step_number)
        .bind(size_before)
        .bind(size_after)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            warn!(challenge_id, step_number, "scaling step replayed, skipping");
            return Ok(());
        }

        sqlx::query(
            "UPDATE challenges SET \
                 initial_balance = $2, current_balance = $2, \
                 peak_equity = GREATEST(peak_equity, $2), updated_at = now() \
             WHERE id = $1",
        )
        .bind(challenge_id)
        .bind(size_after)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(challenge_id, step_number, %size_after, "scaling applied");
        Ok(())
    }

    /// Quarantine a challenge whose credentials cannot be unsealed; no automatic
    /// transitions are applied until an operator clears the flag.
    pub async fn set_quarantined(
        &self,
        challenge_id: i64,
        quarantined: bool,
    ) -> Result<(), LedgerError> {
        sqlx::query("UPDATE challenges SET quarantined = $2, updated_at = now() WHERE id = $1")
            .bind(challenge_id)
            .bind(quarantined)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
