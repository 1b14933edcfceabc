//! Structural spread and executable depth for a constant-product pool
//! (UniswapV2-style x*y=k), adapted from the spread/depth pulses the teacher
//! wrote for STON.fi pools. Everything here stays in `f64` internally; the
//! adapter layer converts results to `Decimal` at the boundary.

/// Infinitesimal (ε→0) buy/sell price either side of mid, and the implied
/// structural spread after LP + protocol fees. Excludes size-dependent
/// slippage by design - that is `depth_at_slippage`'s job.
pub struct SpreadResult {
    pub mid_price: f64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub spread_bps: f64,
    pub valid: bool,
}

pub fn spread(reserve0: u128, reserve1: u128, fee_bps: u32, min_liquidity: u128) -> SpreadResult {
    if reserve0 < min_liquidity || reserve1 < min_liquidity {
        return SpreadResult { mid_price: 0.0, buy_price: 0.0, sell_price: 0.0, spread_bps: 0.0, valid: false };
    }

    let x = reserve0 as f64;
    let y = reserve1 as f64;
    let fee_factor = 1.0 - (fee_bps as f64 / 10_000.0);
    let mid = y / x;
    let eps = 1e-9;

    let dx_eff = eps * fee_factor;
    let dy = (y * dx_eff) / (x + dx_eff);
    let buy_price = dy / eps;

    let dy_eff = eps * fee_factor;
    let dx = (x * dy_eff) / (y + dy_eff);
    let sell_price = eps / dx;

    let spread_bps = ((buy_price - sell_price).abs() / mid) * 10_000.0;

    SpreadResult { mid_price: mid, buy_price, sell_price, spread_bps, valid: spread_bps.is_finite() }
}

/// Binary search for the largest trade size whose execution price stays
/// within `max_slippage_bps` of mid - the depth figure the scanner caps
/// reference notional against.
pub struct DepthResult {
    pub max_dx: u128,
    pub slippage_bps: f64,
    pub valid: bool,
}

pub fn depth_at_slippage(reserve0: u128, reserve1: u128, fee_bps: u32, max_slippage_bps: f64, min_liquidity: u128) -> DepthResult {
    if reserve0 < min_liquidity || reserve1 < min_liquidity {
        return DepthResult { max_dx: 0, slippage_bps: 0.0, valid: false };
    }

    let x = reserve0 as f64;
    let y = reserve1 as f64;
    let fee_factor = 1.0 - (fee_bps as f64 / 10_000.0);
    let mid = y / x;

    let mut low = 0.0;
    let mut high = x * 0.3;
    let mut best_dx = 0.0;
    let mut best_slippage = 0.0;

    for _ in 0..32 {
        let dx = (low + high) / 2.0;
        if dx < 1.0 {
            break;
        }

        let dx_eff = dx * fee_factor;
        let dy = (y * dx_eff) / (x + dx_eff);
        let exec_price = dy / dx;
        let slippage = ((mid - exec_price) / mid * 10_000.0).max(0.0);

        if slippage <= max_slippage_bps {
            best_dx = dx;
            best_slippage = slippage;
            low = dx;
        } else {
            high = dx;
        }
    }

    DepthResult { max_dx: best_dx as u128, slippage_bps: best_slippage, valid: best_dx > 0.0 && best_slippage.is_finite() }
}
