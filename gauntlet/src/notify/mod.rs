use crate::{error::EngineError, rules::DrawdownScope};
use chrono::{DateTime, Utc};
use gauntlet_ledger::LedgerStore;
use redis::aio::ConnectionManager;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// FIFO queue consumed by the messaging-bot process.
const QUEUE_KEY: &str = "gauntlet:notifications";

/// Day-scoped dedup markers survive comfortably past the UTC day they guard.
const DAILY_DEDUP_TTL_SECONDS: i64 = 2 * 24 * 3600;

/// Episode-scoped markers (goal milestones per phase) outlive any plausible phase.
const EPISODE_DEDUP_TTL_SECONDS: i64 = 180 * 24 * 3600;

/// Typed notification payloads handed off to the bot process.
///
/// Serialised as tagged JSON (`type` discriminant) onto the Redis queue. The ledger
/// outbox keeps a human-readable copy per user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ChallengePurchased {
        user_id: i64,
        challenge_id: i64,
        account_size: Decimal,
    },
    DrawdownWarning {
        user_id: i64,
        challenge_id: i64,
        scope: DrawdownScope,
        drawdown_pct: Decimal,
        limit_pct: Decimal,
    },
    GoalProgress {
        user_id: i64,
        challenge_id: i64,
        milestone_pct: u8,
        profit_pct: Decimal,
    },
    Violation {
        user_id: i64,
        challenge_id: i64,
        kind: String,
        description: String,
    },
    PhasePassed {
        user_id: i64,
        challenge_id: i64,
        new_phase: i16,
    },
    Funded {
        user_id: i64,
        challenge_id: i64,
        account_size: Decimal,
    },
    ScalingApplied {
        user_id: i64,
        challenge_id: i64,
        step_number: i32,
        size_before: Decimal,
        size_after: Decimal,
    },
    TradeClosed {
        user_id: i64,
        challenge_id: i64,
        symbol: String,
        pnl: Decimal,
        close_reason: String,
    },
    MasterBalanceLow {
        balance: Decimal,
        minimum: Decimal,
    },
    /// Deployment-grade problems routed to the super-admin channel.
    OperatorAlert {
        message: String,
    },
}

impl Notification {
    /// Stable discriminant used for outbox rows and dedup keys.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ChallengePurchased { .. } => "challenge_purchased",
            Notification::DrawdownWarning {
                scope: DrawdownScope::Daily,
                ..
            } => "daily_drawdown_warning",
            Notification::DrawdownWarning {
                scope: DrawdownScope::Total,
                ..
            } => "total_drawdown_warning",
            Notification::GoalProgress {
                milestone_pct: 80, ..
            } => "goal_80_pct",
            Notification::GoalProgress { .. } => "goal_50_pct",
            Notification::Violation { .. } => "violation",
            Notification::PhasePassed { .. } => "phase_passed",
            Notification::Funded { .. } => "funded",
            Notification::ScalingApplied { .. } => "scaling_applied",
            Notification::TradeClosed { .. } => "trade_closed",
            Notification::MasterBalanceLow { .. } => "master_balance_low",
            Notification::OperatorAlert { .. } => "operator_alert",
        }
    }

    /// Recipient, when the notification addresses one user.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Notification::ChallengePurchased { user_id, .. }
            | Notification::DrawdownWarning { user_id, .. }
            | Notification::GoalProgress { user_id, .. }
            | Notification::Violation { user_id, .. }
            | Notification::PhasePassed { user_id, .. }
            | Notification::Funded { user_id, .. }
            | Notification::ScalingApplied { user_id, .. }
            | Notification::TradeClosed { user_id, .. } => Some(*user_id),
            Notification::MasterBalanceLow { .. } | Notification::OperatorAlert { .. } => None,
        }
    }

    /// Outbox rendering: short title plus body.
    fn render(&self) -> (String, String) {
        match self {
            Notification::ChallengePurchased { account_size, .. } => (
                "Challenge activated".into(),
                format!("Your evaluation account is live with ${account_size}."),
            ),
            Notification::DrawdownWarning {
                scope,
                drawdown_pct,
                limit_pct,
                ..
            } => {
                let scope = match scope {
                    DrawdownScope::Daily => "Daily",
                    DrawdownScope::Total => "Total",
                };
                (
                    format!("{scope} drawdown warning"),
                    format!("{scope} drawdown is {drawdown_pct:.2}% of a {limit_pct}% limit."),
                )
            }
            Notification::GoalProgress {
                milestone_pct,
                profit_pct,
                ..
            } => (
                format!("{milestone_pct}% of the way there"),
                format!("Current profit: {profit_pct:.1}%. Keep the pace."),
            ),
            Notification::Violation { description, .. } => {
                ("Challenge failed".into(), description.clone())
            }
            Notification::PhasePassed { new_phase, .. } => (
                "Phase passed".into(),
                format!("Welcome to phase {new_phase}. Balances are reset, targets updated."),
            ),
            Notification::Funded { account_size, .. } => (
                "You are funded".into(),
                format!("A live ${account_size} account is now yours. Trade well."),
            ),
            Notification::ScalingApplied {
                size_before,
                size_after,
                ..
            } => (
                "Account scaled".into(),
                format!("Account size increased from ${size_before} to ${size_after}."),
            ),
            Notification::TradeClosed {
                symbol,
                pnl,
                close_reason,
                ..
            } => (
                format!("{symbol} closed"),
                format!("Realised P&L {pnl} USDT ({close_reason})."),
            ),
            Notification::MasterBalanceLow { balance, minimum } => (
                "Master balance low".into(),
                format!("Master wallet holds {balance} USDT, below the {minimum} USDT minimum."),
            ),
            Notification::OperatorAlert { message } => ("Operator alert".into(), message.clone()),
        }
    }
}

/// Commit-then-notify hand-off.
///
/// `enqueue` persists an outbox row and pushes tagged JSON onto the Redis FIFO the
/// bot process consumes. Callers invoke it only after their database transaction has
/// committed, so observers never learn of state the ledger does not reflect.
#[derive(Clone)]
pub struct Notifier {
    redis: ConnectionManager,
    ledger: LedgerStore,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish()
    }
}

impl Notifier {
    pub fn new(redis: ConnectionManager, ledger: LedgerStore) -> Self {
        Self { redis, ledger }
    }

    /// Queue a notification and persist it to the outbox.
    pub async fn enqueue(&self, notification: Notification) -> Result<(), EngineError> {
        if let Some(user_id) = notification.user_id() {
            let (title, body) = notification.render();
            self.ledger
                .insert_notification(user_id, notification.kind(), &title, &body)
                .await?;
        }

        let payload = serde_json::to_string(&notification)
            .expect("notification payloads serialise infallibly");
        let mut conn = self.redis.clone();
        let _: i64 = redis::cmd("RPUSH")
            .arg(QUEUE_KEY)
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        debug!(kind = notification.kind(), "notification queued");
        Ok(())
    }

    /// Queue a notification at most once per `(kind, challenge, UTC day)`.
    ///
    /// Returns `true` if this call won the dedup race and queued.
    pub async fn enqueue_deduped_daily(
        &self,
        challenge_id: i64,
        now: DateTime<Utc>,
        notification: Notification,
    ) -> Result<bool, EngineError> {
        let day = now.format("%Y%m%d");
        let key = format!(
            "gauntlet:notify:dedup:{}:{challenge_id}:{day}",
            notification.kind()
        );
        self.enqueue_if_unseen(&key, DAILY_DEDUP_TTL_SECONDS, notification)
            .await
    }

    /// Queue a notification at most once per `(kind, challenge)` episode. The marker
    /// is cleared implicitly when the episode key changes (eg/ phase reset bumps the
    /// episode tag the caller includes).
    pub async fn enqueue_deduped_episode(
        &self,
        challenge_id: i64,
        episode: &str,
        notification: Notification,
    ) -> Result<bool, EngineError> {
        let key = format!(
            "gauntlet:notify:dedup:{}:{challenge_id}:{episode}",
            notification.kind()
        );
        self.enqueue_if_unseen(&key, EPISODE_DEDUP_TTL_SECONDS, notification)
            .await
    }

    async fn enqueue_if_unseen(
        &self,
        key: &str,
        ttl_seconds: i64,
        notification: Notification,
    ) -> Result<bool, EngineError> {
        let mut conn = self.redis.clone();
        let won: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        if won.is_none() {
            return Ok(false);
        }

        self.enqueue(notification).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payloads_serialise_with_type_discriminant() {
        struct TestCase {
            input: Notification,
            expected_type: &'static str,
        }

        let tests = vec![
            TestCase {
                input: Notification::Violation {
                    user_id: 42,
                    challenge_id: 7,
                    kind: "DailyLoss".into(),
                    description: "Daily drawdown 5.01% breached the 5% limit".into(),
                },
                expected_type: r#""type":"violation""#,
            },
            TestCase {
                input: Notification::DrawdownWarning {
                    user_id: 42,
                    challenge_id: 7,
                    scope: DrawdownScope::Daily,
                    drawdown_pct: dec!(4.2),
                    limit_pct: dec!(5),
                },
                expected_type: r#""type":"drawdown_warning""#,
            },
            TestCase {
                input: Notification::ScalingApplied {
                    user_id: 42,
                    challenge_id: 7,
                    step_number: 1,
                    size_before: dec!(110000),
                    size_after: dec!(137500),
                },
                expected_type: r#""type":"scaling_applied""#,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let json = serde_json::to_string(&test.input).unwrap();
            assert!(json.contains(test.expected_type), "TC{index} failed: {json}");
        }
    }

    #[test]
    fn test_kind_distinguishes_warning_scopes() {
        let daily = Notification::DrawdownWarning {
            user_id: 1,
            challenge_id: 1,
            scope: DrawdownScope::Daily,
            drawdown_pct: dec!(4.2),
            limit_pct: dec!(5),
        };
        let total = Notification::DrawdownWarning {
            user_id: 1,
            challenge_id: 1,
            scope: DrawdownScope::Total,
            drawdown_pct: dec!(8.2),
            limit_pct: dec!(10),
        };
        assert_eq!(daily.kind(), "daily_drawdown_warning");
        assert_eq!(total.kind(), "total_drawdown_warning");
    }

    #[test]
    fn test_operator_alerts_have_no_recipient() {
        let alert = Notification::OperatorAlert {
            message: "master balance low".into(),
        };
        assert_eq!(alert.user_id(), None);
    }
}
