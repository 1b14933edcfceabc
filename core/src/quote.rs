use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::venue::Venue;

/// A price sample from one venue for one pair, taken at a logical scan
/// timestamp. All price/amount fields are fixed-point decimals per the
/// design notes; only `logical_ts` is an integer tick counter, not a
/// wall-clock value, so ordering within one scan tick is exact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    pub venue: Venue,
    pub logical_ts: u64,
    pub sampled_at_ms: u64,

    /// Mid price, at least 18 fractional digits.
    pub mid_price: Decimal,
    /// Effective price to buy the reference notional (after pool fee).
    pub buy_price: Decimal,
    /// Effective price to sell the reference notional (after pool fee).
    pub sell_price: Decimal,
    /// Depth available at the configured slippage ceiling, denominated in the
    /// reference notional's unit.
    pub depth_at_ceiling: Decimal,
    /// Pool fee tier in basis points.
    pub fee_bps: u32,
    /// True when the adapter could not fully converge (e.g. StableCurve
    /// Newton iteration hit its bound) and the quote should be treated as
    /// lower confidence by the scanner.
    pub approximate: bool,
}

impl Quote {
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.sampled_at_ms) <= ttl_ms
    }
}
