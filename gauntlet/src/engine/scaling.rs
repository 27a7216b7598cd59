use rust_decimal::Decimal;

/// Funded accounts scale after each additional +10% of profit on the current size.
pub const SCALING_TRIGGER_PCT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Each scaling step grows the account by 25%.
pub const SCALING_INCREASE_PCT: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Account size never scales beyond $2M.
pub const MAX_ACCOUNT_SIZE: Decimal = Decimal::from_parts(2_000_000, 0, 0, false, 0);

/// Whether profit has reached the next scaling rung.
///
/// The trigger grows with each applied step: step `n + 1` requires
/// `10% × (n + 1)` cumulative profit on the current `initial_balance`.
pub fn scaling_due(total_pnl: Decimal, initial_balance: Decimal, applied_steps: i64) -> bool {
    if initial_balance <= Decimal::ZERO || initial_balance >= MAX_ACCOUNT_SIZE {
        return false;
    }
    let profit_pct = total_pnl / initial_balance * Decimal::ONE_HUNDRED;
    let required_pct = SCALING_TRIGGER_PCT * Decimal::from(applied_steps + 1);
    profit_pct >= required_pct
}

/// The account size after one scaling step, capped at [`MAX_ACCOUNT_SIZE`].
pub fn scaled_size(current_balance: Decimal) -> Decimal {
    let grown = current_balance * (Decimal::ONE + SCALING_INCREASE_PCT / Decimal::ONE_HUNDRED);
    grown.min(MAX_ACCOUNT_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scaling_due_first_step() {
        // +10% on $100k with no prior steps: due
        assert!(scaling_due(dec!(10000), dec!(100000), 0));
        // +9.9%: not yet
        assert!(!scaling_due(dec!(9900), dec!(100000), 0));
        // Second step needs +20%
        assert!(!scaling_due(dec!(10000), dec!(100000), 1));
        assert!(scaling_due(dec!(20000), dec!(100000), 1));
    }

    #[test]
    fn test_scaling_never_past_cap() {
        assert!(!scaling_due(dec!(1000000), MAX_ACCOUNT_SIZE, 0));
        assert_eq!(scaled_size(dec!(1900000)), MAX_ACCOUNT_SIZE);
        assert_eq!(scaled_size(dec!(110000)), dec!(137500.00));
    }
}
