use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use chain::CallRequest;
use core_model::{Quote, Venue};

use crate::error::VenueError;
use crate::formulas::{concentrated_v3, constant_product, stable_curve, weighted_pool};
use crate::pools::PoolState;

const MIN_LIQUIDITY: u128 = 100;

fn to_decimal(v: f64) -> Result<Decimal, VenueError> {
    if !v.is_finite() {
        return Err(VenueError::NonFinitePrice);
    }
    Decimal::from_f64_retain(v).ok_or(VenueError::NonFinitePrice)
}

/// Uniform interface every venue implementation exposes to the scanner and
/// planner (§4.B): quote the pair, build the swap call, and report the price
/// impact of a specific trade size.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    fn venue(&self) -> &Venue;

    /// Quotes the pair from a freshly-fetched pool state, at the given
    /// logical scan tick.
    fn quote_pair(&self, pool: &PoolState, logical_ts: u64, sampled_at_ms: u64) -> Result<Quote, VenueError>;

    /// Builds the venue-specific calldata for trading `amount_in` of the
    /// venue's "token in" side into the pool at `pool_address`.
    fn build_swap(&self, pool_address: &str, amount_in: Decimal, min_amount_out: Decimal) -> CallRequest;

    /// Price impact in bps of trading `amount_in` against `pool`, distinct
    /// from the structural (zero-size) spread `quote_pair` reports.
    fn price_impact(&self, pool: &PoolState, amount_in: Decimal) -> Result<Decimal, VenueError>;
}

pub struct GenericAdapter {
    venue: Venue,
}

impl GenericAdapter {
    pub fn new(venue: Venue) -> Self {
        Self { venue }
    }
}

#[async_trait]
impl VenueAdapter for GenericAdapter {
    fn venue(&self) -> &Venue {
        &self.venue
    }

    fn quote_pair(&self, pool: &PoolState, logical_ts: u64, sampled_at_ms: u64) -> Result<Quote, VenueError> {
        let (mid, buy, sell, spread_bps, fee_bps, depth_at_ceiling, approximate) = match pool {
            PoolState::ConstantProductV2 { reserve0, reserve1, fee_bps } => {
                let s = constant_product::spread(*reserve0, *reserve1, *fee_bps, MIN_LIQUIDITY);
                if !s.valid {
                    return Err(VenueError::InsufficientLiquidity);
                }
                let d = constant_product::depth_at_slippage(*reserve0, *reserve1, *fee_bps, 50.0, MIN_LIQUIDITY);
                (s.mid_price, s.buy_price, s.sell_price, s.spread_bps, *fee_bps, d.max_dx as f64, false)
            }
            PoolState::ConcentratedV3 { liquidity, sqrt_price, fee_bps } => {
                let s = concentrated_v3::spread_v3(*liquidity, *sqrt_price, *fee_bps, MIN_LIQUIDITY);
                if !s.valid {
                    return Err(VenueError::InsufficientLiquidity);
                }
                let d = concentrated_v3::depth_v3(*liquidity, *sqrt_price, *fee_bps, 50.0, MIN_LIQUIDITY);
                (s.mid_price, s.buy_price, s.sell_price, s.spread_bps, *fee_bps, d.max_dx as f64, false)
            }
            PoolState::StableCurve { balance0, balance1, amp, fee_bps } => {
                let s = stable_curve::spread(*balance0, *balance1, *amp, *fee_bps, MIN_LIQUIDITY);
                if !s.valid {
                    return Err(VenueError::InsufficientLiquidity);
                }
                (s.mid_price, s.buy_price, s.sell_price, s.spread_bps, *fee_bps, (*balance0).min(*balance1) as f64 * 0.3, !s.converged)
            }
            PoolState::WeightedPool { balance0, weight0, balance1, weight1, fee_bps } => {
                let s = weighted_pool::spread(*balance0, *weight0, *balance1, *weight1, *fee_bps, MIN_LIQUIDITY);
                if !s.valid {
                    return Err(VenueError::InsufficientLiquidity);
                }
                (s.mid_price, s.buy_price, s.sell_price, s.spread_bps, *fee_bps, (*balance0).min(*balance1) as f64 * 0.3, false)
            }
        };

        let _ = spread_bps;
        Ok(Quote {
            venue: self.venue.clone(),
            logical_ts,
            sampled_at_ms,
            mid_price: to_decimal(mid)?,
            buy_price: to_decimal(buy)?,
            sell_price: to_decimal(sell)?,
            depth_at_ceiling: to_decimal(depth_at_ceiling)?,
            fee_bps,
            approximate,
        })
    }

    fn build_swap(&self, pool_address: &str, amount_in: Decimal, min_amount_out: Decimal) -> CallRequest {
        // Venue-agnostic call shape per §9: no EVM bytecode construction here,
        // just an opaque calldata tag the executor's signer encodes for real.
        CallRequest {
            to: pool_address.to_string(),
            data: format!("swap(amount_in={amount_in},min_amount_out={min_amount_out})"),
            value: None,
        }
    }

    fn price_impact(&self, pool: &PoolState, amount_in: Decimal) -> Result<Decimal, VenueError> {
        let amount_in_f = amount_in.to_f64().ok_or(VenueError::NonFinitePrice)?;
        let impact_bps = match pool {
            PoolState::ConstantProductV2 { reserve0, reserve1, fee_bps } => {
                let d = constant_product::depth_at_slippage(*reserve0, *reserve1, *fee_bps, 10_000.0, MIN_LIQUIDITY);
                if d.max_dx == 0 {
                    return Err(VenueError::InsufficientLiquidity);
                }
                (amount_in_f / d.max_dx as f64) * d.slippage_bps
            }
            PoolState::ConcentratedV3 { liquidity, sqrt_price, fee_bps } => {
                let d = concentrated_v3::depth_v3(*liquidity, *sqrt_price, *fee_bps, 10_000.0, MIN_LIQUIDITY);
                if d.max_dx == 0 {
                    return Err(VenueError::InsufficientLiquidity);
                }
                (amount_in_f / d.max_dx as f64) * d.slippage_bps
            }
            PoolState::StableCurve { balance0, balance1, .. } => {
                let depth = balance0.min(balance1);
                if *depth == 0 {
                    return Err(VenueError::InsufficientLiquidity);
                }
                (amount_in_f / *depth as f64) * 10_000.0
            }
            PoolState::WeightedPool { balance0, balance1, .. } => {
                let depth = balance0.min(balance1);
                if *depth == 0 {
                    return Err(VenueError::InsufficientLiquidity);
                }
                (amount_in_f / *depth as f64) * 10_000.0
            }
        };
        to_decimal(impact_bps)
    }
}
