//! Balancer-style weighted pool: two tokens with independent weights summing
//! to 1. The spot price has a closed form, unlike StableCurve, so this stays
//! purely analytic - no iteration needed.

pub struct WeightedQuote {
    pub mid_price: f64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub spread_bps: f64,
    pub valid: bool,
}

fn spot_price(balance_in: f64, weight_in: f64, balance_out: f64, weight_out: f64) -> f64 {
    (balance_in / weight_in) / (balance_out / weight_out)
}

/// Output amount for trading `amount_in` of the in-side asset, after fee.
fn swap_out(balance_in: f64, weight_in: f64, balance_out: f64, weight_out: f64, amount_in: f64, fee_factor: f64) -> f64 {
    let amount_in_eff = amount_in * fee_factor;
    let base = balance_in / (balance_in + amount_in_eff);
    balance_out * (1.0 - base.powf(weight_in / weight_out))
}

pub fn spread(
    balance0: u128,
    weight0: f64,
    balance1: u128,
    weight1: f64,
    fee_bps: u32,
    min_liquidity: u128,
) -> WeightedQuote {
    if balance0 < min_liquidity || balance1 < min_liquidity || weight0 <= 0.0 || weight1 <= 0.0 {
        return WeightedQuote { mid_price: 0.0, buy_price: 0.0, sell_price: 0.0, spread_bps: 0.0, valid: false };
    }

    let x0 = balance0 as f64;
    let x1 = balance1 as f64;
    let fee_factor = 1.0 - (fee_bps as f64 / 10_000.0);

    // mid price: token1 per token0, at zero weight shift.
    let mid = spot_price(x0, weight0, x1, weight1);

    let eps = 1e-6 * x0.max(x1).max(1.0);
    let buy_out = swap_out(x0, weight0, x1, weight1, eps, fee_factor);
    let buy_price = buy_out / eps;

    let sell_out = swap_out(x1, weight1, x0, weight0, eps, fee_factor);
    let sell_price = eps / sell_out.max(1e-18);

    let spread_bps = if mid > 0.0 { ((buy_price - sell_price).abs() / mid) * 10_000.0 } else { 0.0 };

    WeightedQuote { mid_price: mid, buy_price, sell_price, spread_bps, valid: spread_bps.is_finite() && mid.is_finite() }
}
