use crate::{error::EngineError, risk::round_fiat};
use gauntlet_ledger::{
    model::{Challenge, ChallengePlan, ChallengeStatus, Payout, PayoutNetwork},
    store::NewPayout,
    LedgerStore,
};
use rust_decimal::Decimal;

/// Profit share currently withdrawable from a funded challenge:
/// `profit_split_pct × max(0, total_pnl)` minus everything already reserved by
/// non-rejected payouts.
pub async fn available_payout(
    ledger: &LedgerStore,
    challenge: &Challenge,
    plan: &ChallengePlan,
) -> Result<Decimal, EngineError> {
    let split = plan.profit_split_pct / Decimal::ONE_HUNDRED;
    let earned = round_fiat(challenge.total_pnl.max(Decimal::ZERO) * split);
    let reserved = ledger.sum_reserved_net(challenge.id).await?;
    Ok((earned - reserved).max(Decimal::ZERO))
}

/// Validate and record a payout request in `pending`.
///
/// Enforces: funded status, the configured minimum, the available profit split, and
/// at most one outstanding pending payout per challenge.
pub async fn request_payout(
    ledger: &LedgerStore,
    challenge: &Challenge,
    plan: &ChallengePlan,
    min_amount: Decimal,
    amount: Decimal,
    wallet_address: String,
    network: PayoutNetwork,
) -> Result<Payout, EngineError> {
    if challenge.status != ChallengeStatus::Funded {
        return Err(EngineError::Validation(
            "payouts are available to funded challenges only".into(),
        ));
    }
    if amount < min_amount {
        return Err(EngineError::Validation(format!(
            "Minimum payout amount is {min_amount:.2}"
        )));
    }

    let available = available_payout(ledger, challenge, plan).await?;
    if amount > available {
        return Err(EngineError::Validation(format!(
            "Amount exceeds available balance ({available:.2})"
        )));
    }

    if ledger.has_pending_payout(challenge.id).await? {
        return Err(EngineError::Conflict(
            "a pending payout already exists for this challenge".into(),
        ));
    }

    Ok(ledger
        .insert_payout(NewPayout {
            challenge_id: challenge.id,
            user_id: challenge.user_id,
            amount,
            fee: Decimal::ZERO,
            net_amount: amount,
            wallet_address,
            network,
        })
        .await?)
}
