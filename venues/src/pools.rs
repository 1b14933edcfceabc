use core_model::PricingModel;
use serde::{Deserialize, Serialize};

/// On-chain pool state, one variant per §4.B pricing model. The scanner reads
/// this fresh from `ChainClient::call`/`multicall` each tick; adapters never
/// cache it themselves (see `cache.rs` for the derived-quote cache).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PoolState {
    ConstantProductV2 { reserve0: u128, reserve1: u128, fee_bps: u32 },
    ConcentratedV3 { liquidity: u128, sqrt_price: f64, fee_bps: u32 },
    StableCurve { balance0: u128, balance1: u128, amp: u64, fee_bps: u32 },
    WeightedPool { balance0: u128, weight0: f64, balance1: u128, weight1: f64, fee_bps: u32 },
}

impl PoolState {
    pub fn model(&self) -> PricingModel {
        match self {
            PoolState::ConstantProductV2 { .. } => PricingModel::ConstantProductV2,
            PoolState::ConcentratedV3 { .. } => PricingModel::ConcentratedV3,
            PoolState::StableCurve { .. } => PricingModel::StableCurve,
            PoolState::WeightedPool { .. } => PricingModel::WeightedPool,
        }
    }
}
