use fnv::FnvHashMap;
use gauntlet_ledger::model::{DrawdownType, Trade, TradeDirection};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Fiat amounts round half-even to 2dp.
pub const FIAT_DP: u32 = 2;

/// Base-asset quantities round half-even to 8dp.
pub const ASSET_DP: u32 = 8;

/// Round a fiat amount to its declared scale.
pub fn round_fiat(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FIAT_DP, RoundingStrategy::MidpointNearestEven)
}

/// Round a base-asset quantity to its declared scale.
pub fn round_asset(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(ASSET_DP, RoundingStrategy::MidpointNearestEven)
}

/// Realised P&L of a filled trade in quote currency.
///
/// Leverage appears in margin but not here: the quantity already reflects the
/// leveraged position.
pub fn trade_pnl(
    direction: TradeDirection,
    entry_price: Decimal,
    exit_price: Decimal,
    quantity: Decimal,
) -> Decimal {
    round_fiat((exit_price - entry_price) * direction.multiplier() * quantity)
}

/// Unrealised P&L of an open trade marked at `mark_price`.
pub fn unrealized_pnl(trade: &Trade, mark_price: Decimal) -> Decimal {
    trade_pnl(trade.direction, trade.entry_price, mark_price, trade.quantity)
}

/// Account equity: balance plus the unrealised P&L of every open trade with a known
/// price. A missing price skips that leg rather than failing the computation.
pub fn equity(
    current_balance: Decimal,
    open_trades: &[Trade],
    prices: &FnvHashMap<String, Decimal>,
) -> Decimal {
    let unrealized = open_trades
        .iter()
        .filter_map(|trade| {
            prices
                .get(&trade.symbol)
                .map(|mark| unrealized_pnl(trade, *mark))
        })
        .sum::<Decimal>();
    round_fiat(current_balance + unrealized)
}

/// Percentage loss from the start of the current UTC day. Never negative; a zero
/// `daily_start_balance` yields zero.
pub fn daily_drawdown_pct(daily_start_balance: Decimal, equity: Decimal) -> Decimal {
    if daily_start_balance.is_zero() {
        return Decimal::ZERO;
    }
    let loss = daily_start_balance - equity;
    if loss <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    loss / daily_start_balance * Decimal::ONE_HUNDRED
}

/// Percentage loss from the plan's anchor: `initial_balance` (static) or the
/// highest-ever observed equity (trailing). Never negative.
pub fn total_drawdown_pct(
    drawdown_type: DrawdownType,
    initial_balance: Decimal,
    peak_equity: Decimal,
    equity: Decimal,
) -> Decimal {
    let base = match drawdown_type {
        DrawdownType::Static => initial_balance,
        DrawdownType::Trailing => peak_equity,
    };
    if base.is_zero() {
        return Decimal::ZERO;
    }
    let loss = base - equity;
    if loss <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    loss / base * Decimal::ONE_HUNDRED
}

/// Position sizing outputs: base-asset quantity plus its notional and margin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PositionSize {
    pub quantity: Decimal,
    pub notional: Decimal,
    pub margin: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizingError {
    /// Stop must sit on the losing side of entry for the chosen direction.
    #[error("stop loss is on the wrong side of entry for this direction")]
    InvalidStop,
}

/// Size a position so that hitting the stop loses `risk_pct` percent of `balance`.
///
/// `quantity = (balance × risk_pct / 100) / stop_distance`; notional and margin follow
/// from the entry price and leverage.
pub fn position_size_from_risk(
    balance: Decimal,
    risk_pct: Decimal,
    entry_price: Decimal,
    stop_loss: Decimal,
    direction: TradeDirection,
    leverage: u32,
) -> Result<PositionSize, SizingError> {
    let risk_amount = balance * risk_pct / Decimal::ONE_HUNDRED;

    let stop_distance = match direction {
        TradeDirection::Long => entry_price - stop_loss,
        TradeDirection::Short => stop_loss - entry_price,
    };
    if stop_distance <= Decimal::ZERO {
        return Err(SizingError::InvalidStop);
    }

    let quantity = round_asset(risk_amount / stop_distance);
    let notional = round_fiat(quantity * entry_price);
    let margin = round_fiat(notional / Decimal::from(leverage.max(1)));

    Ok(PositionSize {
        quantity,
        notional,
        margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gauntlet_ledger::model::{TradeStatus, CloseReason};
    use rust_decimal_macros::dec;

    fn open_trade(symbol: &str, direction: TradeDirection, entry: Decimal, qty: Decimal) -> Trade {
        Trade {
            id: 1,
            challenge_id: 1,
            symbol: symbol.to_owned(),
            direction,
            status: TradeStatus::Open,
            entry_price: entry,
            exit_price: None,
            quantity: qty,
            leverage: 10,
            notional: round_fiat(entry * qty),
            margin: round_fiat(entry * qty / dec!(10)),
            stop_loss: None,
            take_profit: None,
            realized_pnl: None,
            pnl_pct: None,
            close_reason: None::<CloseReason>,
            order_ref: None,
            opened_at: Utc::now(),
            closed_at: None,
            duration_seconds: None,
        }
    }

    #[test]
    fn test_trade_pnl() {
        struct TestCase {
            direction: TradeDirection,
            entry: Decimal,
            exit: Decimal,
            qty: Decimal,
            expected: Decimal,
        }

        let tests = vec![
            // TC0: long profits when price rises
            TestCase {
                direction: TradeDirection::Long,
                entry: dec!(16500),
                exit: dec!(16650),
                qty: dec!(0.5),
                expected: dec!(75.00),
            },
            // TC1: short profits when price falls
            TestCase {
                direction: TradeDirection::Short,
                entry: dec!(16500),
                exit: dec!(16350),
                qty: dec!(0.5),
                expected: dec!(75.00),
            },
            // TC2: long loses when price falls
            TestCase {
                direction: TradeDirection::Long,
                entry: dec!(16500),
                exit: dec!(16400),
                qty: dec!(2),
                expected: dec!(-200.00),
            },
            // TC3: half-even rounding at the fiat scale
            TestCase {
                direction: TradeDirection::Long,
                entry: dec!(100),
                exit: dec!(100.005),
                qty: dec!(1),
                expected: dec!(0.00),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = trade_pnl(test.direction, test.entry, test.exit, test.qty);
            assert_eq!(actual, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_equity_skips_missing_prices() {
        let trades = vec![
            open_trade("BTCUSDT", TradeDirection::Long, dec!(16500), dec!(0.5)),
            open_trade("ETHUSDT", TradeDirection::Short, dec!(1200), dec!(5)),
        ];
        let mut prices = FnvHashMap::default();
        prices.insert("BTCUSDT".to_owned(), dec!(16600));
        // ETHUSDT price missing: leg skipped

        assert_eq!(equity(dec!(10000), &trades, &prices), dec!(10050.00));
    }

    #[test]
    fn test_daily_drawdown_pct() {
        // -$501 on a $10k day start = 5.01%
        assert_eq!(
            daily_drawdown_pct(dec!(10000), dec!(9499)),
            dec!(5.01)
        );
        // Profit never reports negative drawdown
        assert_eq!(daily_drawdown_pct(dec!(10000), dec!(10500)), Decimal::ZERO);
        // Division-by-zero guard
        assert_eq!(daily_drawdown_pct(Decimal::ZERO, dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_total_drawdown_static_vs_trailing() {
        // Static anchors at initial balance
        assert_eq!(
            total_drawdown_pct(DrawdownType::Static, dec!(10000), dec!(12000), dec!(9000)),
            dec!(10)
        );
        // Trailing anchors at peak equity: (12000 - 10800) / 12000 = 10%
        assert_eq!(
            total_drawdown_pct(DrawdownType::Trailing, dec!(10000), dec!(12000), dec!(10800)),
            dec!(10.0)
        );
        // Equity above peak: zero, never negative
        assert_eq!(
            total_drawdown_pct(DrawdownType::Trailing, dec!(10000), dec!(12000), dec!(12500)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_position_size_from_risk() {
        // Risk 1% of $10k with a $100 stop distance: qty = 100 / 100 = 1
        let size = position_size_from_risk(
            dec!(10000),
            dec!(1),
            dec!(16500),
            dec!(16400),
            TradeDirection::Long,
            10,
        )
        .unwrap();

        assert_eq!(size.quantity, dec!(1));
        assert_eq!(size.notional, dec!(16500.00));
        assert_eq!(size.margin, dec!(1650.00));

        // Law: qty × stop_distance ≈ balance × risk_pct / 100
        assert_eq!(size.quantity * dec!(100), dec!(100));
    }

    #[test]
    fn test_position_size_rejects_wrong_side_stop() {
        // Long with stop above entry
        assert_eq!(
            position_size_from_risk(
                dec!(10000),
                dec!(1),
                dec!(16500),
                dec!(16600),
                TradeDirection::Long,
                10,
            ),
            Err(SizingError::InvalidStop)
        );
        // Short with stop below entry
        assert_eq!(
            position_size_from_risk(
                dec!(10000),
                dec!(1),
                dec!(16500),
                dec!(16400),
                TradeDirection::Short,
                10,
            ),
            Err(SizingError::InvalidStop)
        );
    }
}
