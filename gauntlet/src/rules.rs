use crate::risk::{daily_drawdown_pct, total_drawdown_pct};
use gauntlet_ledger::model::{Challenge, ChallengePlan, ChallengeStatus, ViolationKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// No single UTC day may contribute more than this share of cumulative profit.
pub const CONSISTENCY_LIMIT_PCT: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// Drawdown warnings fire once the drawdown reaches this share of its limit.
pub const WARNING_THRESHOLD_PCT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Everything the rule engine needs to evaluate one challenge at one instant.
/// Pure data; the orchestrator assembles it from ledger and exchange state.
#[derive(Debug, Clone)]
pub struct RuleInput<'a> {
    pub challenge: &'a Challenge,
    pub plan: &'a ChallengePlan,
    pub equity: Decimal,
    /// Sum of realised P&L on trades closed in the current UTC day.
    pub today_pnl: Decimal,
}

/// A broken rule: what was measured and the limit it crossed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleViolation {
    pub kind: ViolationKind,
    pub description: String,
    pub value: Decimal,
    pub limit: Decimal,
}

/// Where a passing challenge advances to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum PromotionTarget {
    Phase2,
    Funded,
}

/// Rule engine output. First matching rule wins; `Ok` when nothing fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Violation(RuleViolation),
    Promotion(PromotionTarget),
}

/// Evaluate every challenge rule over one snapshot.
///
/// Pure: no I/O, never fails. Threshold semantics are inclusive (`≥`) for the loss
/// limits and the profit target; the consistency comparison is strict (`>`), so a day
/// contributing exactly 30% of profit passes.
///
/// Order of evaluation:
/// 1. daily loss, 2. total loss, 3. max trading days, 4. consistency, 5. promotion.
pub fn evaluate(input: &RuleInput<'_>) -> Verdict {
    let RuleInput {
        challenge,
        plan,
        equity,
        today_pnl,
    } = input;

    let daily_dd = daily_drawdown_pct(challenge.daily_start_balance, *equity);
    if daily_dd >= plan.max_daily_loss_pct {
        return Verdict::Violation(RuleViolation {
            kind: ViolationKind::DailyLoss,
            description: format!(
                "Daily drawdown {:.2}% breached the {}% limit",
                daily_dd, plan.max_daily_loss_pct
            ),
            value: daily_dd,
            limit: plan.max_daily_loss_pct,
        });
    }

    let total_dd = total_drawdown_pct(
        plan.drawdown_type,
        challenge.initial_balance,
        challenge.peak_equity,
        *equity,
    );
    if total_dd >= plan.max_total_loss_pct {
        return Verdict::Violation(RuleViolation {
            kind: ViolationKind::TotalLoss,
            description: format!(
                "Total drawdown {:.2}% breached the {}% limit",
                total_dd, plan.max_total_loss_pct
            ),
            value: total_dd,
            limit: plan.max_total_loss_pct,
        });
    }

    if let Some(max_days) = plan.max_trading_days {
        if challenge.trading_days_count > max_days {
            return Verdict::Violation(RuleViolation {
                kind: ViolationKind::MaxTradingDays,
                description: format!(
                    "Trading days {} exceeded the maximum of {}",
                    challenge.trading_days_count, max_days
                ),
                value: Decimal::from(challenge.trading_days_count),
                limit: Decimal::from(max_days),
            });
        }
    }

    let total_pnl = *equity - challenge.initial_balance;

    if plan.consistency_rule && total_pnl > Decimal::ZERO {
        let today_share_pct = *today_pnl / total_pnl * Decimal::ONE_HUNDRED;
        if today_share_pct > CONSISTENCY_LIMIT_PCT {
            return Verdict::Violation(RuleViolation {
                kind: ViolationKind::Consistency,
                description: format!(
                    "Today's profit is {:.1}% of total profit (limit {}%)",
                    today_share_pct, CONSISTENCY_LIMIT_PCT
                ),
                value: today_share_pct,
                limit: CONSISTENCY_LIMIT_PCT,
            });
        }
    }

    let target_pct = match challenge.status {
        ChallengeStatus::Phase1 => plan.profit_target_phase1_pct,
        ChallengeStatus::Phase2 => plan.profit_target_phase2_pct,
        // Funded accounts have no target
        _ => return Verdict::Ok,
    };

    let target_amount = challenge.initial_balance * target_pct / Decimal::ONE_HUNDRED;
    if total_pnl >= target_amount && challenge.trading_days_count >= plan.min_trading_days {
        let target = if challenge.status == ChallengeStatus::Phase1 && !plan.one_phase {
            PromotionTarget::Phase2
        } else {
            PromotionTarget::Funded
        };
        return Verdict::Promotion(target);
    }

    Verdict::Ok
}

/// Drawdown a warning refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawdownScope {
    Daily,
    Total,
}

/// An 80-percent early warning: the drawdown sits in `[0.8 × limit, limit)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawdownWarning {
    pub scope: DrawdownScope,
    pub drawdown_pct: Decimal,
    pub limit_pct: Decimal,
}

/// Warnings to emit for the current snapshot, at most one per scope.
pub fn drawdown_warnings(input: &RuleInput<'_>) -> Vec<DrawdownWarning> {
    let mut warnings = Vec::with_capacity(2);

    let daily_dd = daily_drawdown_pct(input.challenge.daily_start_balance, input.equity);
    let daily_limit = input.plan.max_daily_loss_pct;
    if daily_dd >= daily_limit * WARNING_THRESHOLD_PCT / Decimal::ONE_HUNDRED && daily_dd < daily_limit
    {
        warnings.push(DrawdownWarning {
            scope: DrawdownScope::Daily,
            drawdown_pct: daily_dd,
            limit_pct: daily_limit,
        });
    }

    let total_dd = total_drawdown_pct(
        input.plan.drawdown_type,
        input.challenge.initial_balance,
        input.challenge.peak_equity,
        input.equity,
    );
    let total_limit = input.plan.max_total_loss_pct;
    if total_dd >= total_limit * WARNING_THRESHOLD_PCT / Decimal::ONE_HUNDRED && total_dd < total_limit
    {
        warnings.push(DrawdownWarning {
            scope: DrawdownScope::Total,
            drawdown_pct: total_dd,
            limit_pct: total_limit,
        });
    }

    warnings
}

/// Profit-progress milestone reached on the way to the phase target, if any.
///
/// Reports the highest milestone met (80 before 50); deduplication per episode is the
/// notifier's concern.
pub fn goal_milestone(input: &RuleInput<'_>) -> Option<u8> {
    let target_pct = match input.challenge.status {
        ChallengeStatus::Phase1 => input.plan.profit_target_phase1_pct,
        ChallengeStatus::Phase2 => input.plan.profit_target_phase2_pct,
        _ => return None,
    };
    if input.challenge.initial_balance.is_zero() || target_pct.is_zero() {
        return None;
    }

    let total_pnl = input.equity - input.challenge.initial_balance;
    let profit_pct = total_pnl / input.challenge.initial_balance * Decimal::ONE_HUNDRED;

    if profit_pct >= target_pct {
        // Target met outright: promotion handles the messaging
        None
    } else if profit_pct >= target_pct * Decimal::from_parts(80, 0, 0, false, 2) {
        Some(80)
    } else if profit_pct >= target_pct * Decimal::from_parts(50, 0, 0, false, 2) {
        Some(50)
    } else {
        None
    }
}
