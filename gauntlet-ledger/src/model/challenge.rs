use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status. `failed`, `completed` and `funded` never reverse.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "challenge_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Phase1,
    Phase2,
    Funded,
    Failed,
    Completed,
}

impl ChallengeStatus {
    /// Statuses the rule-check loop reconciles every tick.
    pub const ACTIVE: [ChallengeStatus; 3] = [
        ChallengeStatus::Phase1,
        ChallengeStatus::Phase2,
        ChallengeStatus::Funded,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Whether `next` is reachable from `self` in the lifecycle graph.
    pub fn can_transition_to(&self, next: ChallengeStatus) -> bool {
        use ChallengeStatus::*;
        matches!(
            (self, next),
            (Phase1, Phase2)
                | (Phase1, Funded)
                | (Phase2, Funded)
                | (Phase1, Failed)
                | (Phase2, Failed)
                | (Funded, Failed)
                | (Funded, Completed)
        )
    }
}

/// Whether the challenge trades a simulated or a real funded sub-account.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, sqlx::Type,
)]
#[sqlx(type_name = "account_mode", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
    Demo,
    Funded,
}

/// One trader's evaluation attempt against one plan.
///
/// Owns the sealed credentials of its demo and (after promotion) funded sub-account,
/// plus all monetary state the rule engine evaluates. Mutated only by the orchestrator
/// and by explicit user-initiated actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Challenge {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i32,
    pub status: ChallengeStatus,
    pub phase: Option<i16>,
    pub account_mode: AccountMode,
    /// Set when credentials fail to unseal; the orchestrator skips quarantined
    /// challenges until an operator clears the flag.
    pub quarantined: bool,

    pub demo_account_id: Option<String>,
    pub demo_api_key_enc: Option<String>,
    pub demo_api_secret_enc: Option<String>,
    pub funded_account_id: Option<String>,
    pub funded_api_key_enc: Option<String>,
    pub funded_api_secret_enc: Option<String>,

    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub peak_equity: Decimal,
    pub daily_start_balance: Decimal,
    pub daily_pnl: Decimal,
    pub total_pnl: Decimal,

    pub trading_days_count: i32,
    pub total_trades: i32,
    pub winning_trades: i32,

    pub started_at: DateTime<Utc>,
    pub daily_reset_at: Option<DateTime<Utc>>,
    pub phase_passed_at: Option<DateTime<Utc>>,
    pub funded_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub failed_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_trade_sync_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Share of closed trades that realised a profit, as percent with 2dp.
    pub fn win_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.winning_trades) / Decimal::from(self.total_trades)
            * Decimal::ONE_HUNDRED)
            .round_dp(2)
    }

    /// Sealed credentials for the account the challenge currently trades.
    pub fn sealed_credentials(&self) -> Option<(&str, &str)> {
        match self.account_mode {
            AccountMode::Demo => self
                .demo_api_key_enc
                .as_deref()
                .zip(self.demo_api_secret_enc.as_deref()),
            AccountMode::Funded => self
                .funded_api_key_enc
                .as_deref()
                .zip(self.funded_api_secret_enc.as_deref()),
        }
    }

    /// A funded promotion was interrupted after credentials were replaced but before
    /// the status committed; the orchestrator resumes such challenges on sight.
    pub fn has_partial_funded_state(&self) -> bool {
        self.funded_api_key_enc.is_some() && self.status != ChallengeStatus::Funded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transition_graph() {
        use ChallengeStatus::*;

        struct TestCase {
            from: ChallengeStatus,
            to: ChallengeStatus,
            expected: bool,
        }

        let tests = vec![
            TestCase { from: Phase1, to: Phase2, expected: true },
            TestCase { from: Phase1, to: Funded, expected: true },
            TestCase { from: Phase2, to: Funded, expected: true },
            TestCase { from: Phase1, to: Failed, expected: true },
            TestCase { from: Funded, to: Failed, expected: true },
            TestCase { from: Funded, to: Completed, expected: true },
            // No reversals
            TestCase { from: Phase2, to: Phase1, expected: false },
            TestCase { from: Failed, to: Phase1, expected: false },
            TestCase { from: Funded, to: Phase2, expected: false },
            TestCase { from: Completed, to: Funded, expected: false },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                test.from.can_transition_to(test.to),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_win_rate_zero_trades() {
        let challenge = test_challenge();
        assert_eq!(challenge.win_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_win_rate_rounding() {
        let challenge = Challenge {
            total_trades: 3,
            winning_trades: 2,
            ..test_challenge()
        };
        assert_eq!(challenge.win_rate().to_string(), "66.67");
    }

    fn test_challenge() -> Challenge {
        Challenge {
            id: 1,
            user_id: 1,
            plan_id: 1,
            status: ChallengeStatus::Phase1,
            phase: Some(1),
            account_mode: AccountMode::Demo,
            quarantined: false,
            demo_account_id: None,
            demo_api_key_enc: None,
            demo_api_secret_enc: None,
            funded_account_id: None,
            funded_api_key_enc: None,
            funded_api_secret_enc: None,
            initial_balance: Decimal::new(10_000, 0),
            current_balance: Decimal::new(10_000, 0),
            peak_equity: Decimal::new(10_000, 0),
            daily_start_balance: Decimal::new(10_000, 0),
            daily_pnl: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            trading_days_count: 0,
            total_trades: 0,
            winning_trades: 0,
            started_at: Utc::now(),
            daily_reset_at: None,
            phase_passed_at: None,
            funded_at: None,
            failed_at: None,
            failed_reason: None,
            completed_at: None,
            last_trade_sync_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
