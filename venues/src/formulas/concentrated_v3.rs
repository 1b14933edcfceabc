//! Concentrated-liquidity (UniswapV3-style) pricing within the current tick.
//!
//! Inside a single tick the pool behaves exactly like a constant-product pool
//! over its *virtual* reserves, so this reduces to the constant-product
//! formulas over reserves derived from `liquidity` and `sqrt_price`. Ticks
//! outside the current range are not modeled - quotes this far out are
//! already outside any arbitrage-relevant size for this engine.

use super::constant_product::{DepthResult, SpreadResult, depth_at_slippage, spread};

/// Virtual reserves implied by liquidity `L` and `sqrt_price` = sqrt(price)
/// at the current tick: virtual_reserve0 = L / sqrtP, virtual_reserve1 = L * sqrtP.
fn virtual_reserves(liquidity: u128, sqrt_price: f64) -> (u128, u128) {
    if sqrt_price <= 0.0 {
        return (0, 0);
    }
    let l = liquidity as f64;
    let reserve0 = (l / sqrt_price) as u128;
    let reserve1 = (l * sqrt_price) as u128;
    (reserve0, reserve1)
}

pub fn spread_v3(liquidity: u128, sqrt_price: f64, fee_bps: u32, min_liquidity: u128) -> SpreadResult {
    let (r0, r1) = virtual_reserves(liquidity, sqrt_price);
    spread(r0, r1, fee_bps, min_liquidity)
}

pub fn depth_v3(liquidity: u128, sqrt_price: f64, fee_bps: u32, max_slippage_bps: f64, min_liquidity: u128) -> DepthResult {
    let (r0, r1) = virtual_reserves(liquidity, sqrt_price);
    depth_at_slippage(r0, r1, fee_bps, max_slippage_bps, min_liquidity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_reserves_are_symmetric_at_price_one() {
        let (r0, r1) = virtual_reserves(1_000_000, 1.0);
        assert_eq!(r0, r1);
    }

    #[test]
    fn spread_scales_with_fee_tier() {
        let low_fee = spread_v3(1_000_000_000, 1.0, 5, 100);
        let high_fee = spread_v3(1_000_000_000, 1.0, 100, 100);
        assert!(low_fee.valid && high_fee.valid);
        assert!(high_fee.spread_bps > low_fee.spread_bps);
    }

    #[test]
    fn zero_sqrt_price_is_invalid() {
        let r = spread_v3(1_000_000, 0.0, 5, 100);
        assert!(!r.valid);
    }
}
