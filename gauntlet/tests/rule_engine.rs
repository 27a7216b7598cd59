use chrono::Utc;
use gauntlet::rules::{
    self, DrawdownScope, PromotionTarget, RuleInput, Verdict,
};
use gauntlet_ledger::model::{
    AccountMode, Challenge, ChallengePlan, ChallengeStatus, DrawdownType, ViolationKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn plan() -> ChallengePlan {
    ChallengePlan {
        id: 1,
        name: "Gauntlet 10K".into(),
        account_size: dec!(10000),
        price: dec!(99),
        profit_target_phase1_pct: dec!(8),
        profit_target_phase2_pct: dec!(5),
        max_daily_loss_pct: dec!(5),
        max_total_loss_pct: dec!(10),
        drawdown_type: DrawdownType::Static,
        min_trading_days: 5,
        max_trading_days: None,
        consistency_rule: false,
        one_phase: false,
        max_leverage: 50,
        profit_split_pct: dec!(80),
        is_active: true,
        created_at: Utc::now(),
    }
}

fn challenge() -> Challenge {
    Challenge {
        id: 1,
        user_id: 42,
        plan_id: 1,
        status: ChallengeStatus::Phase1,
        phase: Some(1),
        account_mode: AccountMode::Demo,
        quarantined: false,
        demo_account_id: Some("53888000".into()),
        demo_api_key_enc: None,
        demo_api_secret_enc: None,
        funded_account_id: None,
        funded_api_key_enc: None,
        funded_api_secret_enc: None,
        initial_balance: dec!(10000),
        current_balance: dec!(10000),
        peak_equity: dec!(10000),
        daily_start_balance: dec!(10000),
        daily_pnl: Decimal::ZERO,
        total_pnl: Decimal::ZERO,
        trading_days_count: 0,
        total_trades: 0,
        winning_trades: 0,
        started_at: Utc::now(),
        daily_reset_at: Some(Utc::now()),
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

fn input<'a>(
    challenge: &'a Challenge,
    plan: &'a ChallengePlan,
    equity: Decimal,
    today_pnl: Decimal,
) -> RuleInput<'a> {
    RuleInput {
        challenge,
        plan,
        equity,
        today_pnl,
    }
}

#[test]
fn phase1_fails_on_daily_loss() {
    // Scenario: balances at 10000, a tick observes equity 9499 → 5.01% daily loss
    let plan = plan();
    let challenge = challenge();

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(9499), Decimal::ZERO));

    match verdict {
        Verdict::Violation(violation) => {
            assert_eq!(violation.kind, ViolationKind::DailyLoss);
            assert_eq!(violation.value, dec!(5.01));
            assert_eq!(violation.limit, dec!(5));
        }
        other => panic!("expected daily loss violation, got {other:?}"),
    }
}

#[test]
fn daily_loss_strictly_below_limit_passes() {
    // 4.99% stays under a 5% limit
    let plan = plan();
    let challenge = challenge();

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(9501), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Ok);
}

#[test]
fn trailing_drawdown_triggers_at_exact_limit() {
    // Peak rose to 12000; equity 10800 is exactly 10% off the peak
    let mut plan = plan();
    plan.drawdown_type = DrawdownType::Trailing;
    let mut challenge = challenge();
    challenge.peak_equity = dec!(12000);

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10800), Decimal::ZERO));

    match verdict {
        Verdict::Violation(violation) => {
            assert_eq!(violation.kind, ViolationKind::TotalLoss);
            assert_eq!(violation.value, dec!(10.0));
        }
        other => panic!("expected total loss violation, got {other:?}"),
    }
}

#[test]
fn trailing_drawdown_protects_profit_above_peak() {
    // Equity above peak reports zero drawdown: no violation possible
    let mut plan = plan();
    plan.drawdown_type = DrawdownType::Trailing;
    let mut challenge = challenge();
    challenge.peak_equity = dec!(12000);
    challenge.daily_start_balance = dec!(12000);

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(12500), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Ok);
}

#[test]
fn phase1_promotes_to_phase2_when_target_and_days_met() {
    // +8% with 5 trading days on a two-phase plan
    let plan = plan();
    let mut challenge = challenge();
    challenge.trading_days_count = 5;

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10800), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Promotion(PromotionTarget::Phase2));
}

#[test]
fn promotion_withheld_without_min_trading_days() {
    // Target met but only 4 trading days: hold
    let plan = plan();
    let mut challenge = challenge();
    challenge.trading_days_count = 4;

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10800), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Ok);
}

#[test]
fn one_phase_plan_promotes_straight_to_funded() {
    let mut plan = plan();
    plan.one_phase = true;
    let mut challenge = challenge();
    challenge.trading_days_count = 5;

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10800), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Promotion(PromotionTarget::Funded));
}

#[test]
fn phase2_promotes_to_funded() {
    let plan = plan();
    let mut challenge = challenge();
    challenge.status = ChallengeStatus::Phase2;
    challenge.phase = Some(2);
    challenge.trading_days_count = 5;

    // Phase 2 target is 5%
    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10500), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Promotion(PromotionTarget::Funded));
}

#[test]
fn consistency_violation_above_thirty_percent() {
    // Total profit 1000, today's closed P&L 400 → 40% of total
    let mut plan = plan();
    plan.consistency_rule = true;
    let challenge = challenge();

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(11000), dec!(400)));

    match verdict {
        Verdict::Violation(violation) => {
            assert_eq!(violation.kind, ViolationKind::Consistency);
            assert_eq!(violation.value, dec!(40));
            assert_eq!(violation.limit, dec!(30));
        }
        other => panic!("expected consistency violation, got {other:?}"),
    }
}

#[test]
fn consistency_exact_thirty_percent_passes() {
    let mut plan = plan();
    plan.consistency_rule = true;
    let mut challenge = challenge();
    challenge.trading_days_count = 1;

    // total 1000, today 300: exactly 30% does not trigger
    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(11000), dec!(300)));
    assert!(!matches!(
        verdict,
        Verdict::Violation(ref v) if v.kind == ViolationKind::Consistency
    ));
}

#[test]
fn max_trading_days_exceeded_fails() {
    let mut plan = plan();
    plan.max_trading_days = Some(30);
    let mut challenge = challenge();
    challenge.trading_days_count = 31;

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10100), Decimal::ZERO));

    match verdict {
        Verdict::Violation(violation) => {
            assert_eq!(violation.kind, ViolationKind::MaxTradingDays);
            assert_eq!(violation.value, dec!(31));
            assert_eq!(violation.limit, dec!(30));
        }
        other => panic!("expected max trading days violation, got {other:?}"),
    }
}

#[test]
fn daily_loss_evaluated_before_total_loss() {
    // Both limits breached in one observation: daily loss wins
    let plan = plan();
    let challenge = challenge();

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(8900), Decimal::ZERO));
    match verdict {
        Verdict::Violation(violation) => assert_eq!(violation.kind, ViolationKind::DailyLoss),
        other => panic!("expected violation, got {other:?}"),
    }
}

#[test]
fn funded_challenge_has_no_profit_target() {
    let plan = plan();
    let mut challenge = challenge();
    challenge.status = ChallengeStatus::Funded;
    challenge.phase = None;
    challenge.trading_days_count = 50;

    let verdict = rules::evaluate(&input(&challenge, &plan, dec!(10900), Decimal::ZERO));
    assert_eq!(verdict, Verdict::Ok);
}

#[test]
fn warnings_fire_inside_eighty_percent_band() {
    let plan = plan();
    let challenge = challenge();

    // 4.2% daily drawdown: inside [4.0, 5.0)
    let warnings = rules::drawdown_warnings(&input(&challenge, &plan, dec!(9580), Decimal::ZERO));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].scope, DrawdownScope::Daily);

    // 3.9%: below the band
    let warnings = rules::drawdown_warnings(&input(&challenge, &plan, dec!(9610), Decimal::ZERO));
    assert!(warnings.is_empty());

    // 9% total drawdown trips the total scope; with the daily anchor lowered by the
    // reset, the daily scope warns too
    let mut after_reset = challenge.clone();
    after_reset.daily_start_balance = dec!(9500);
    let warnings = rules::drawdown_warnings(&input(&after_reset, &plan, dec!(9100), Decimal::ZERO));
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].scope, DrawdownScope::Daily);
    assert_eq!(warnings[1].scope, DrawdownScope::Total);

    // At the limit itself the violation takes over, the warning does not fire
    let warnings = rules::drawdown_warnings(&input(&challenge, &plan, dec!(9500), Decimal::ZERO));
    assert!(warnings.iter().all(|w| w.scope != DrawdownScope::Daily));
}

#[test]
fn goal_milestones_reported_below_target() {
    let plan = plan();
    let challenge = challenge();

    // 4.4% of an 8% target: 55% of the way → 50 milestone
    assert_eq!(
        rules::goal_milestone(&input(&challenge, &plan, dec!(10440), Decimal::ZERO)),
        Some(50)
    );
    // 6.6%: 82.5% of the way → 80 milestone
    assert_eq!(
        rules::goal_milestone(&input(&challenge, &plan, dec!(10660), Decimal::ZERO)),
        Some(80)
    );
    // 2%: nothing yet
    assert_eq!(
        rules::goal_milestone(&input(&challenge, &plan, dec!(10200), Decimal::ZERO)),
        None
    );
    // Target met outright: the promotion handles messaging
    assert_eq!(
        rules::goal_milestone(&input(&challenge, &plan, dec!(10800), Decimal::ZERO)),
        None
    );
}
