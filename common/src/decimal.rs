//! Fixed-point helpers shared by every profit-identity calculation. Per the
//! design notes, all monetary math stays in `Decimal` (28-29 significant
//! digits, comfortably over the 18 fractional-digit floor); `f64` is reserved
//! for confidence/volatility heuristics and must never feed back into a
//! `netProfit` computation.

use rust_decimal::Decimal;

/// `(sell - buy) / buy * 10_000`, the spread in basis points.
pub fn spread_bps(buy_price: Decimal, sell_price: Decimal) -> Decimal {
    if buy_price.is_zero() {
        return Decimal::ZERO;
    }
    (sell_price - buy_price) / buy_price * Decimal::from(10_000)
}

/// Clamps a basis-point fraction (e.g. a configured slippage tolerance) into
/// `[0, 10_000]` so a misconfigured value can never invert a profit sign.
pub fn clamp_bps(bps: Decimal) -> Decimal {
    bps.max(Decimal::ZERO).min(Decimal::from(10_000))
}

/// Applies a basis-point fraction to a notional amount: `amount * bps / 10_000`.
pub fn apply_bps(amount: Decimal, bps: Decimal) -> Decimal {
    amount * bps / Decimal::from(10_000)
}
