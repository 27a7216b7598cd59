use crate::{
    error::EngineError,
    notify::{Notification, Notifier},
    paper::PaperEngine,
    rules::{self, PromotionTarget, RuleInput, RuleViolation, Verdict},
    security::seal::SealKey,
};
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use gauntlet_exchange::{
    bybit::model::order::Side, AccountExchange, ExchangeError, MasterExchange,
};
use gauntlet_integration::backoff::Backoff;
use gauntlet_ledger::{
    model::{Challenge, ChallengeStatus, TradeDirection},
    store::{NewViolation, SyncedTrade},
    LedgerStore,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// UTC day-boundary bookkeeping.
pub mod daily;

/// Payout availability arithmetic and request validation.
pub mod payout;

/// Challenge purchase flow: demo provisioning plus ledger insert.
pub mod purchase;

/// Scaling trigger arithmetic.
pub mod scaling;

/// Production [`AccountSource`] unsealing per-challenge credentials.
pub mod source;

/// Namespace for deterministic transfer ids, so a retried promotion or scaling
/// replays the same venue-level idempotency token.
const TRANSFER_NAMESPACE: Uuid = Uuid::from_u128(0x8c5d_1f2a_9e4b_4c6d_8a1e_3f7b_2d9c_5e41);

/// Transient exchange calls retry this many times within one tick before the tick is
/// abandoned for that challenge.
const MAX_TRANSIENT_RETRIES: u32 = 3;

/// The per-challenge view of the exchange, resolved each tick.
pub struct AccountView {
    pub exchange: Arc<dyn AccountExchange>,
    /// Paper challenges simulate fills locally; exchange-backed ones sync closed
    /// trades from the venue.
    pub is_paper: bool,
}

impl std::fmt::Debug for AccountView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountView")
            .field("is_paper", &self.is_paper)
            .finish()
    }
}

/// Resolves the exchange view for one challenge.
///
/// The production implementation ([`source::SealedAccountSource`]) unseals the
/// challenge's credentials; tests substitute in-memory fakes.
pub trait AccountSource: Send + Sync {
    fn account_for(&self, challenge: &Challenge) -> Result<AccountView, EngineError>;
}

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rule-check cadence; also the per-challenge wall-clock budget.
    pub check_interval: Duration,
    /// Maximum challenges processed concurrently within one tick.
    pub fan_out: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            fan_out: 16,
        }
    }
}

/// The periodic rule-check loop.
///
/// Every tick, for each active challenge: fetch exchange state, run the rule engine,
/// apply transitions atomically, emit notifications after commit. Within one
/// challenge ticks are strictly sequential (a per-challenge mutex; overruns coalesce
/// by skipping); across challenges processing is parallel up to `fan_out`.
pub struct Orchestrator {
    ledger: LedgerStore,
    accounts: Arc<dyn AccountSource>,
    master: Arc<dyn MasterExchange>,
    notifier: Notifier,
    seal_key: SealKey,
    paper: Option<PaperEngine>,
    config: EngineConfig,
    locks: parking_lot::Mutex<FnvHashMap<i64, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        ledger: LedgerStore,
        accounts: Arc<dyn AccountSource>,
        master: Arc<dyn MasterExchange>,
        notifier: Notifier,
        seal_key: SealKey,
        paper: Option<PaperEngine>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ledger,
            accounts,
            master,
            notifier,
            seal_key,
            paper,
            config,
            locks: parking_lot::Mutex::new(FnvHashMap::default()),
        }
    }

    /// Run until the shutdown signal flips, draining the in-flight tick with a grace
    /// period of one interval.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(
            interval_s = self.config.check_interval.as_secs(),
            fan_out = self.config.fan_out,
            "orchestrator running"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let tick = self.clone().tick();
                    tokio::pin!(tick);
                    tokio::select! {
                        _ = &mut tick => {}
                        _ = shutdown.changed() => {
                            let _ = tokio::time::timeout(self.config.check_interval, tick).await;
                            info!("orchestrator stopped");
                            return;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("orchestrator stopped");
                    return;
                }
            }
        }
    }

    /// One pass over every active challenge.
    pub async fn tick(self: Arc<Self>) {
        let challenges = match self.ledger.active_challenges().await {
            Ok(challenges) => challenges,
            Err(err) => {
                error!(%err, "failed to load active challenges, skipping tick");
                return;
            }
        };
        debug!(count = challenges.len(), "tick started");

        let semaphore = Arc::new(Semaphore::new(self.config.fan_out.max(1)));
        let mut tasks = tokio::task::JoinSet::new();

        for challenge in challenges {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            let this = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                this.process_challenge(challenge).await;
            });
        }

        while tasks.join_next().await.is_some() {}
    }

    fn challenge_lock(&self, challenge_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(challenge_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Process one challenge under its exclusive lock and tick budget.
    ///
    /// If the previous tick for this challenge is still running, this tick is
    /// coalesced away. A tick exceeding the wall-clock budget is cancelled at its
    /// next suspension point; nothing is committed in that case beyond the
    /// already-atomic single statements.
    pub async fn process_challenge(&self, challenge: Challenge) {
        let lock = self.challenge_lock(challenge.id);
        let Ok(_guard) = lock.try_lock() else {
            debug!(challenge_id = challenge.id, "previous tick still running, coalescing");
            return;
        };

        let challenge_id = challenge.id;
        let outcome = tokio::time::timeout(
            self.config.check_interval,
            self.check_challenge(challenge),
        )
        .await
        .unwrap_or(Err(EngineError::TickBudget { challenge_id }));

        match outcome {
            Ok(()) => {}
            Err(err) if err.is_transient() => {
                debug!(challenge_id, %err, "tick skipped, will retry next cycle");
            }
            Err(EngineError::InvariantBreach { detail, .. }) => {
                error!(challenge_id, %detail, "invariant breach, quarantining challenge");
                if let Err(err) = self.ledger.set_quarantined(challenge_id, true).await {
                    error!(challenge_id, %err, "failed to quarantine challenge");
                }
                self.alert_operator(format!(
                    "Invariant breach on challenge {challenge_id}: {detail}"
                ))
                .await;
            }
            Err(err) => {
                error!(challenge_id, %err, "challenge tick failed");
                if let EngineError::Exchange(exchange_err) = &err {
                    if exchange_err.is_signature_error() {
                        self.alert_operator(format!(
                            "Signature rejected for challenge {challenge_id}: deployment bug"
                        ))
                        .await;
                    }
                }
            }
        }
    }

    async fn check_challenge(&self, mut challenge: Challenge) -> Result<(), EngineError> {
        let now = Utc::now();

        // A promotion interrupted after credential replacement resumes before anything
        // else touches the account.
        if challenge.has_partial_funded_state() {
            info!(challenge_id = challenge.id, "resuming interrupted funded promotion");
            return self.finalize_funded(&challenge).await;
        }

        let plan = self.ledger.plan(challenge.plan_id).await?;

        let view = match self.accounts.account_for(&challenge) {
            Ok(view) => view,
            Err(EngineError::CredentialUnseal { challenge_id }) => {
                warn!(challenge_id, "credentials cannot be unsealed, quarantining");
                self.ledger.set_quarantined(challenge_id, true).await?;
                self.alert_operator(format!(
                    "Challenge {challenge_id} quarantined: credential unseal failure"
                ))
                .await;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        // Paper challenges match protective triggers against the feed before the
        // balance snapshot, the way the venue would have filled them already.
        if view.is_paper {
            if let Some(paper) = &self.paper {
                paper.sweep_protective_triggers(&challenge).await?;
            }
        }

        let balance = self
            .with_transient_retries(|| view.exchange.balance())
            .await?;
        let equity = balance.equity;

        challenge.current_balance = balance.wallet;
        if equity > challenge.peak_equity {
            challenge.peak_equity = equity;
        }
        if challenge.peak_equity < challenge.initial_balance {
            // Scaling and promotions keep peak at or above the anchor; anything else
            // means the row was corrupted outside the engine.
            return Err(EngineError::InvariantBreach {
                challenge_id: challenge.id,
                detail: format!(
                    "peak_equity {} below initial_balance {}",
                    challenge.peak_equity, challenge.initial_balance
                ),
            });
        }

        if !view.is_paper {
            self.sync_closed_trades(&mut challenge, view.exchange.as_ref())
                .await?;
        }

        self.daily_reset_check(&mut challenge, now).await?;

        challenge.daily_pnl = equity - challenge.daily_start_balance;
        challenge.total_pnl = equity - challenge.initial_balance;

        let today_pnl = self
            .ledger
            .sum_pnl_closed_between(challenge.id, daily::day_floor(now), now)
            .await?;

        let input = RuleInput {
            challenge: &challenge,
            plan: &plan,
            equity,
            today_pnl,
        };

        let warnings = rules::drawdown_warnings(&input);
        let milestone = rules::goal_milestone(&input);
        let verdict = rules::evaluate(&input);
        let uneventful = matches!(verdict, Verdict::Ok);

        // Each transition (and the uneventful snapshot) commits before any
        // notification goes out, so observers never learn of state the ledger does
        // not hold. Progress notifications follow the commit of whichever outcome
        // the verdict produced: a violation tick still delivers the warning that was
        // in band, and a promotion tick still delivers the crossed milestone.
        match verdict {
            Verdict::Violation(violation) => {
                self.handle_violation(&challenge, &view, violation, now)
                    .await?;
            }
            Verdict::Promotion(PromotionTarget::Phase2) => {
                self.promote_phase2(&challenge, &view, now).await?;
            }
            Verdict::Promotion(PromotionTarget::Funded) => {
                self.promote_funded(&challenge, &view).await?;
            }
            Verdict::Ok => {
                self.ledger.update_tick_state(&challenge).await?;
            }
        }

        self.emit_progress(&challenge, warnings, milestone, now)
            .await?;

        if uneventful && challenge.status == ChallengeStatus::Funded {
            self.check_scaling(&challenge).await?;
        }

        Ok(())
    }

    /// Emit the 80-percent drawdown warnings and goal milestones observed this tick,
    /// deduplicated per UTC day (warnings) and per phase episode (milestones).
    async fn emit_progress(
        &self,
        challenge: &Challenge,
        warnings: Vec<rules::DrawdownWarning>,
        milestone: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        for warning in warnings {
            self.notifier
                .enqueue_deduped_daily(
                    challenge.id,
                    now,
                    Notification::DrawdownWarning {
                        user_id: challenge.user_id,
                        challenge_id: challenge.id,
                        scope: warning.scope,
                        drawdown_pct: warning.drawdown_pct.round_dp(2),
                        limit_pct: warning.limit_pct,
                    },
                )
                .await?;
        }

        if let Some(milestone_pct) = milestone {
            let episode = match challenge.phase {
                Some(phase) => format!("m{milestone_pct}-p{phase}"),
                None => format!("m{milestone_pct}-funded"),
            };
            let profit_pct = if challenge.initial_balance.is_zero() {
                Decimal::ZERO
            } else {
                (challenge.total_pnl / challenge.initial_balance * Decimal::ONE_HUNDRED).round_dp(1)
            };
            self.notifier
                .enqueue_deduped_episode(
                    challenge.id,
                    &episode,
                    Notification::GoalProgress {
                        user_id: challenge.user_id,
                        challenge_id: challenge.id,
                        milestone_pct,
                        profit_pct,
                    },
                )
                .await?;
        }

        Ok(())
    }

    /// Pull closed-position records from the venue into the ledger, advancing the
    /// sync high-water mark and the trade counters.
    async fn sync_closed_trades(
        &self,
        challenge: &mut Challenge,
        exchange: &dyn AccountExchange,
    ) -> Result<(), EngineError> {
        let since = challenge.last_trade_sync_at;
        let entries = self
            .with_transient_retries(|| exchange.closed_pnl_since(since))
            .await?;
        if entries.is_empty() {
            return Ok(());
        }

        let mut total = 0i32;
        let mut winning = 0i32;
        let mut high_water = since;

        for entry in entries {
            let Some(pnl) = entry.closed_pnl else { continue };
            // The closing order sells a long and buys back a short
            let direction = match entry.side {
                Side::Sell => TradeDirection::Long,
                Side::Buy => TradeDirection::Short,
            };

            let inserted = self
                .ledger
                .insert_synced_trade(SyncedTrade {
                    challenge_id: challenge.id,
                    symbol: entry.symbol,
                    direction,
                    entry_price: entry.avg_entry_price.unwrap_or(Decimal::ZERO),
                    exit_price: entry.avg_exit_price.unwrap_or(Decimal::ZERO),
                    quantity: entry.qty.unwrap_or(Decimal::ZERO),
                    leverage: entry
                        .leverage
                        .and_then(|leverage| leverage.trunc().to_i32())
                        .unwrap_or(1),
                    realized_pnl: pnl,
                    order_ref: entry.order_id,
                    opened_at: entry.created_time,
                    closed_at: entry.updated_time,
                })
                .await?;

            if inserted {
                total += 1;
                if pnl > Decimal::ZERO {
                    winning += 1;
                }
            }
            if high_water.map_or(true, |mark| entry.updated_time > mark) {
                high_water = Some(entry.updated_time);
            }
        }

        self.ledger
            .bump_trade_counters(challenge.id, total, winning)
            .await?;
        challenge.total_trades += total;
        challenge.winning_trades += winning;
        challenge.last_trade_sync_at = high_water;

        Ok(())
    }

    /// Apply the UTC day boundary: reset the daily anchor and accrue a trading day
    /// iff the ended day saw at least one closed trade and no violation.
    async fn daily_reset_check(
        &self,
        challenge: &mut Challenge,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if !daily::needs_reset(challenge.daily_reset_at, now) {
            return Ok(());
        }

        if let Some(last_reset) = challenge.daily_reset_at {
            let (day_start, day_end) = daily::ended_day_window(last_reset);
            let trades = self
                .ledger
                .count_trades_closed_between(challenge.id, day_start, day_end)
                .await?;
            let violated = self
                .ledger
                .violations_exist_between(challenge.id, day_start, day_end)
                .await?;

            if trades > 0 && !violated {
                challenge.trading_days_count += 1;
                debug!(
                    challenge_id = challenge.id,
                    trading_days = challenge.trading_days_count,
                    "trading day accrued"
                );
            }
        }

        challenge.daily_start_balance = challenge.current_balance;
        challenge.daily_pnl = Decimal::ZERO;
        challenge.daily_reset_at = Some(now);
        debug!(challenge_id = challenge.id, "daily reset applied");
        Ok(())
    }

    /// `* → failed`: close everything (best effort), commit the failure atomically,
    /// then notify.
    async fn handle_violation(
        &self,
        challenge: &Challenge,
        view: &AccountView,
        violation: RuleViolation,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        warn!(
            challenge_id = challenge.id,
            kind = ?violation.kind,
            value = %violation.value,
            limit = %violation.limit,
            "violation detected"
        );

        self.close_all_best_effort(challenge, view).await;

        self.ledger
            .fail_challenge(
                challenge,
                NewViolation {
                    kind: violation.kind,
                    description: violation.description.clone(),
                    value: violation.value.round_dp(2),
                    limit_value: violation.limit,
                },
                now,
            )
            .await?;

        self.notifier
            .enqueue(Notification::Violation {
                user_id: challenge.user_id,
                challenge_id: challenge.id,
                kind: format!("{:?}", violation.kind),
                description: violation.description,
            })
            .await?;

        Ok(())
    }

    /// `phase1 → phase2`: flatten the demo account, reset its balance to the plan
    /// size, commit, then notify.
    async fn promote_phase2(
        &self,
        challenge: &Challenge,
        view: &AccountView,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        info!(challenge_id = challenge.id, "phase1 passed, promoting to phase2");

        self.close_all_best_effort(challenge, view).await;

        // Restore the demo wallet to the starting size; a failure here degrades the
        // demo balance display but must not block the promotion.
        if !view.is_paper {
            match self.demo_credentials(challenge) {
                Ok(credentials) => {
                    if let Err(err) = self
                        .master
                        .top_up_demo_balance(credentials, challenge.initial_balance)
                        .await
                    {
                        warn!(challenge_id = challenge.id, %err, "demo balance reset failed");
                    }
                }
                Err(err) => {
                    warn!(challenge_id = challenge.id, %err, "demo credentials unavailable for reset");
                }
            }
        }

        self.ledger.promote_to_phase2(challenge.id, now).await?;

        self.notifier
            .enqueue(Notification::PhasePassed {
                user_id: challenge.user_id,
                challenge_id: challenge.id,
                new_phase: 2,
            })
            .await?;

        Ok(())
    }

    /// `* → funded`: flatten the demo account, provision a real sub-account with the
    /// plan size, seal and store the new credentials, then commit and notify.
    async fn promote_funded(
        &self,
        challenge: &Challenge,
        view: &AccountView,
    ) -> Result<(), EngineError> {
        info!(
            challenge_id = challenge.id,
            account_size = %challenge.initial_balance,
            "phase passed, provisioning funded account"
        );

        self.close_all_best_effort(challenge, view).await;

        let plan = self.ledger.plan(challenge.plan_id).await?;
        let transfer_id = Uuid::new_v5(
            &TRANSFER_NAMESPACE,
            format!("funded:{}", challenge.id).as_bytes(),
        );

        let account = self
            .master
            .provision_funded_account(
                challenge.initial_balance,
                &format!("GL{}F", challenge.user_id),
                plan.max_leverage.max(1) as u32,
                transfer_id,
            )
            .await?;

        self.ledger
            .store_funded_credentials(
                challenge.id,
                &account.account_id,
                &self.seal_key.seal(&account.credentials.key),
                &self.seal_key.seal(&account.credentials.secret),
            )
            .await?;

        self.finalize_funded(challenge).await
    }

    /// Final, idempotent half of the funded promotion: flips the ledger state and
    /// notifies. Also the resume path after an interrupted promotion.
    async fn finalize_funded(&self, challenge: &Challenge) -> Result<(), EngineError> {
        self.ledger
            .promote_to_funded(challenge.id, challenge.user_id, Utc::now())
            .await?;

        self.notifier
            .enqueue(Notification::Funded {
                user_id: challenge.user_id,
                challenge_id: challenge.id,
                account_size: challenge.initial_balance,
            })
            .await?;

        Ok(())
    }

    /// Scaling, funded challenges only: a profit rung reached with a clean record
    /// since the last anchor buys a 25% size increase funded from the master wallet.
    async fn check_scaling(&self, challenge: &Challenge) -> Result<(), EngineError> {
        let steps = self.ledger.scaling_steps(challenge.id).await?;
        if !scaling::scaling_due(
            challenge.total_pnl,
            challenge.initial_balance,
            steps.len() as i64,
        ) {
            return Ok(());
        }

        // Eligibility: no violation since the later of funded_at and the previous step
        let anchor = steps
            .last()
            .map(|step| step.triggered_at)
            .or(challenge.funded_at)
            .unwrap_or(challenge.started_at);
        if self
            .ledger
            .violations_exist_since(challenge.id, anchor)
            .await?
        {
            debug!(challenge_id = challenge.id, "scaling blocked by violations");
            return Ok(());
        }

        let step_number = steps.len() as i32 + 1;
        let size_before = challenge.current_balance;
        let size_after = scaling::scaled_size(size_before);
        let top_up = size_after - size_before;
        if top_up <= Decimal::ZERO {
            return Ok(());
        }

        let Some(funded_uid) = challenge.funded_account_id.as_deref() else {
            return Err(EngineError::InvariantBreach {
                challenge_id: challenge.id,
                detail: "funded challenge without funded_account_id".into(),
            });
        };

        let transfer_id = Uuid::new_v5(
            &TRANSFER_NAMESPACE,
            format!("scaling:{}:{step_number}", challenge.id).as_bytes(),
        );
        self.master
            .transfer_to_sub(transfer_id, top_up, funded_uid)
            .await?;

        self.ledger
            .apply_scaling(challenge.id, step_number, size_before, size_after, Utc::now())
            .await?;

        self.notifier
            .enqueue(Notification::ScalingApplied {
                user_id: challenge.user_id,
                challenge_id: challenge.id,
                step_number,
                size_before,
                size_after,
            })
            .await?;

        Ok(())
    }

    /// Close every position; per-symbol failures are logged and never block the
    /// caller's transition.
    async fn close_all_best_effort(&self, challenge: &Challenge, view: &AccountView) {
        match view.exchange.close_all_positions().await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    if let Err(err) = outcome.result {
                        warn!(
                            challenge_id = challenge.id,
                            symbol = %outcome.symbol,
                            %err,
                            "close-all leg failed"
                        );
                    }
                }
            }
            Err(err) => warn!(challenge_id = challenge.id, %err, "close-all failed"),
        }
    }

    fn demo_credentials(
        &self,
        challenge: &Challenge,
    ) -> Result<gauntlet_exchange::ApiCredentials, EngineError> {
        let (key_enc, secret_enc) = challenge
            .demo_api_key_enc
            .as_deref()
            .zip(challenge.demo_api_secret_enc.as_deref())
            .ok_or(EngineError::CredentialUnseal {
                challenge_id: challenge.id,
            })?;

        Ok(gauntlet_exchange::ApiCredentials::new(
            self.seal_key
                .unseal(key_enc)
                .map_err(|_| EngineError::CredentialUnseal {
                    challenge_id: challenge.id,
                })?,
            self.seal_key
                .unseal(secret_enc)
                .map_err(|_| EngineError::CredentialUnseal {
                    challenge_id: challenge.id,
                })?,
        ))
    }

    async fn with_transient_retries<T, F, Fut>(&self, mut op: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExchangeError>>,
    {
        let mut backoff = Backoff::new(Duration::from_millis(250), Duration::from_secs(2));
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && backoff.attempt() < MAX_TRANSIENT_RETRIES => {
                    let delay = backoff.next_delay();
                    debug!(%err, delay_ms = delay.as_millis() as u64, "transient exchange error, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn alert_operator(&self, message: String) {
        if let Err(err) = self
            .notifier
            .enqueue(Notification::OperatorAlert { message })
            .await
        {
            error!(%err, "failed to queue operator alert");
        }
    }
}

/// Hourly master-wallet watchdog: queue a super-admin alert (deduplicated per day)
/// whenever the master balance dips below the configured minimum.
pub async fn master_watchdog(
    master: Arc<dyn MasterExchange>,
    notifier: Notifier,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match master.ensure_master_healthy().await {
                    Ok(balance) => debug!(%balance, "master balance healthy"),
                    Err(ExchangeError::MasterBalanceLow { balance, minimum }) => {
                        warn!(%balance, %minimum, "master balance below minimum");
                        if let Err(err) = notifier
                            .enqueue_deduped_daily(
                                0,
                                Utc::now(),
                                Notification::MasterBalanceLow { balance, minimum },
                            )
                            .await
                        {
                            error!(%err, "failed to queue master balance alert");
                        }
                    }
                    Err(err) => warn!(%err, "master balance check failed"),
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}

// Re-export the pieces integration tests and the runtime wire together.
pub use payout::{available_payout, request_payout};
pub use purchase::purchase_challenge;
