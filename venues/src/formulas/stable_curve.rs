//! Two-asset StableSwap (Curve-style) invariant, solved with a bounded
//! Newton iteration per §4.B. Unlike the constant-product/concentrated
//! formulas this has no closed form, so every result carries a `converged`
//! flag the adapter maps onto `Quote::approximate` when the iteration cap is
//! hit before the residual settles.

const MAX_ITERATIONS: u32 = 64;
const N: f64 = 2.0;

/// Solves for the invariant `D` given pool balances and amplification.
fn compute_d(x0: f64, x1: f64, amp: f64) -> (f64, bool) {
    let s = x0 + x1;
    if s == 0.0 {
        return (0.0, true);
    }
    let ann = amp * N;
    let mut d = s;
    for _ in 0..MAX_ITERATIONS {
        let d_p = d * d / (x0 * N) * d / (x1 * N);
        let d_prev = d;
        d = (ann * s + d_p * N) * d / ((ann - 1.0) * d + (N + 1.0) * d_p);
        if (d - d_prev).abs() <= 1e-10 {
            return (d, true);
        }
    }
    (d, false)
}

/// Solves for the new balance of the *other* asset after one side is moved
/// to `x_in`, holding the invariant `D` fixed.
fn get_y(x_in: f64, d: f64, amp: f64) -> (f64, bool) {
    let ann = amp * N;
    let c = d * d / (x_in * N) * d / ann / N;
    let b = x_in + d / ann;

    let mut y = d;
    for _ in 0..MAX_ITERATIONS {
        let y_prev = y;
        y = (y * y + c) / (2.0 * y + b - d);
        if (y - y_prev).abs() <= 1e-10 {
            return (y, true);
        }
    }
    (y, false)
}

pub struct StableQuote {
    pub mid_price: f64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub spread_bps: f64,
    pub converged: bool,
    pub valid: bool,
}

/// Structural spread for a 2-asset stable pool: quote both directions with a
/// tiny epsilon trade and compare to the `D`-implied mid price.
pub fn spread(balance0: u128, balance1: u128, amp: u64, fee_bps: u32, min_liquidity: u128) -> StableQuote {
    if balance0 < min_liquidity || balance1 < min_liquidity {
        return StableQuote { mid_price: 0.0, buy_price: 0.0, sell_price: 0.0, spread_bps: 0.0, converged: true, valid: false };
    }

    let x0 = balance0 as f64;
    let x1 = balance1 as f64;
    let amp = amp as f64;
    let fee_factor = 1.0 - (fee_bps as f64 / 10_000.0);

    let (d, d_converged) = compute_d(x0, x1, amp);
    let eps = 1e-6 * x0.max(x1).max(1.0);

    // buy: spend token0 eps, receive token1
    let (y_after_in, c1) = get_y(x0 + eps * fee_factor, d, amp);
    let out_buy = x1 - y_after_in;
    let buy_price = out_buy / eps;

    // sell: spend token1 eps, receive token0
    let (y_after_in2, c2) = get_y(x1 + eps * fee_factor, d, amp);
    let out_sell = x0 - y_after_in2;
    let sell_price = eps / out_sell.max(1e-18);

    let mid = (buy_price + 1.0 / sell_price.max(1e-18)) / 2.0;
    let spread_bps = if mid > 0.0 { ((buy_price - sell_price).abs() / mid) * 10_000.0 } else { 0.0 };
    let converged = d_converged && c1 && c2;

    StableQuote {
        mid_price: mid,
        buy_price,
        sell_price,
        spread_bps,
        converged,
        valid: spread_bps.is_finite() && mid.is_finite(),
    }
}
