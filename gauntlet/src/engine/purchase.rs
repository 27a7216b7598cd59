use crate::{
    error::EngineError,
    notify::{Notification, Notifier},
    security::seal::SealKey,
};
use gauntlet_exchange::MasterExchange;
use gauntlet_ledger::{
    model::{Challenge, ChallengePlan, User},
    store::NewChallenge,
    LedgerStore,
};
use tracing::info;

/// Purchase flow: provision a demo sub-account sized to the plan, seal its
/// credentials, create the challenge, and notify the trader.
///
/// Provisioning precedes the insert; a crash in between leaks only an unused demo
/// sub-account (unique username, no funds at risk).
pub async fn purchase_challenge(
    ledger: &LedgerStore,
    master: &dyn MasterExchange,
    seal_key: &SealKey,
    notifier: &Notifier,
    user: &User,
    plan: &ChallengePlan,
) -> Result<Challenge, EngineError> {
    let username_prefix = format!("GL{}", user.id);
    let account = master
        .provision_demo_account(plan.account_size, &username_prefix)
        .await?;

    let challenge = ledger
        .create_challenge(NewChallenge {
            user_id: user.id,
            plan_id: plan.id,
            account_size: plan.account_size,
            demo_account_id: account.account_id,
            demo_api_key_enc: seal_key.seal(&account.credentials.key),
            demo_api_secret_enc: seal_key.seal(&account.credentials.secret),
        })
        .await?;

    notifier
        .enqueue(Notification::ChallengePurchased {
            user_id: user.id,
            challenge_id: challenge.id,
            account_size: plan.account_size,
        })
        .await?;

    info!(
        challenge_id = challenge.id,
        user_id = user.id,
        plan_id = plan.id,
        "challenge purchased"
    );
    Ok(challenge)
}
