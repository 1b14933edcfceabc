use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::pair::TokenPair;
use crate::venue::Venue;

/// Risk classification, fixed thresholds applied over (confidence, volatility,
/// impact) by the ranking filter (§4.D).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskClass {
    Low,
    Medium,
    High,
}

/// Bounded ring buffer of the sell-side price trend, mirroring the rolling
/// window used for the teacher's trend pulse, but keyed by capacity instead
/// of age since the scanner already bounds sample count per tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrendSample {
    capacity: usize,
    samples: VecDeque<Decimal>,
}

impl TrendSample {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, price: Decimal) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(price);
    }

    pub fn as_slice(&self) -> &VecDeque<Decimal> {
        &self.samples
    }

    pub fn oldest(&self) -> Option<Decimal> {
        self.samples.front().copied()
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.samples.back().copied()
    }
}

/// The fundamental unit produced by the scanner (§3/§4.C).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub pair: TokenPair,
    pub chain: ChainId,

    pub buy_venue: Venue,
    pub buy_price: Decimal,
    pub sell_venue: Venue,
    pub sell_price: Decimal,

    pub gross_spread_bps: Decimal,
    pub reference_notional: Decimal,
    pub gross_profit: Decimal,

    pub gas_cost_usd: Decimal,
    pub slippage_reserve: Decimal,
    pub flash_fee: Decimal,
    pub net_profit: Decimal,

    pub confidence: u8,
    pub risk_class: RiskClass,
    pub flash_loan_eligible: bool,

    pub trend: TrendSample,
    pub volatility: f64,
    pub market_impact: f64,

    pub freshness_ms: u64,
}

impl Opportunity {
    /// Deterministic content-hash id over the fields named in §3: pair,
    /// buyVenue, sellVenue, chain, and a 1-second-bucketed timestamp. Using
    /// `DefaultHasher` (SipHash with a fixed, zeroed key) rather than a
    /// process-random hasher keeps the id reproducible across calls and
    /// across processes, which `HashMap`'s default `RandomState` does not
    /// guarantee.
    pub fn stable_id(
        pair: &TokenPair,
        buy_venue: &Venue,
        sell_venue: &Venue,
        chain: ChainId,
        bucketed_ts_ms: u64,
    ) -> String {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        pair.id().hash(&mut hasher);
        buy_venue.id().hash(&mut hasher);
        sell_venue.id().hash(&mut hasher);
        format!("{:?}", chain).hash(&mut hasher);
        bucketed_ts_ms.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// The profit identity invariant from §3/§8: net = gross - gas - slippage - flash fee.
    pub fn recompute_net_profit(&mut self) {
        self.net_profit =
            self.gross_profit - self.gas_cost_usd - self.slippage_reserve - self.flash_fee;
    }

    pub fn satisfies_profit_identity(&self) -> bool {
        let expected =
            self.gross_profit - self.gas_cost_usd - self.slippage_reserve - self.flash_fee;
        (self.net_profit - expected).abs() <= Decimal::new(1, 18)
    }

    pub fn is_stale(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.freshness_ms) > ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::Token;
    use crate::venue::PricingModel;
    use rust_decimal_macros::dec;

    fn pair() -> TokenPair {
        TokenPair::new(
            Token::new("0xaaa", 18, "MATIC"),
            Token::new("0xbbb", 6, "USDT"),
        )
    }

    fn venue(name: &str) -> Venue {
        Venue::new(ChainId::Polygon, name, PricingModel::ConstantProductV2)
    }

    #[test]
    fn stable_id_is_deterministic() {
        let id1 = Opportunity::stable_id(&pair(), &venue("QuickSwap"), &venue("SushiSwap"), ChainId::Polygon, 1_000);
        let id2 = Opportunity::stable_id(&pair(), &venue("QuickSwap"), &venue("SushiSwap"), ChainId::Polygon, 1_000);
        assert_eq!(id1, id2);
    }

    #[test]
    fn stable_id_differs_on_bucket() {
        let id1 = Opportunity::stable_id(&pair(), &venue("QuickSwap"), &venue("SushiSwap"), ChainId::Polygon, 1_000);
        let id2 = Opportunity::stable_id(&pair(), &venue("QuickSwap"), &venue("SushiSwap"), ChainId::Polygon, 2_000);
        assert_ne!(id1, id2);
    }

    #[test]
    fn profit_identity_holds_after_recompute() {
        let mut trend = TrendSample::new(5);
        trend.push(dec!(1.0));

        let mut opp = Opportunity {
            id: "x".into(),
            pair: pair(),
            chain: ChainId::Polygon,
            buy_venue: venue("QuickSwap"),
            buy_price: dec!(0.8924),
            sell_venue: venue("SushiSwap"),
            sell_price: dec!(0.8941),
            gross_spread_bps: dec!(19),
            reference_notional: dec!(30000),
            gross_profit: dec!(70.65),
            gas_cost_usd: dec!(12.80),
            slippage_reserve: dec!(3.35),
            flash_fee: dec!(0),
            net_profit: dec!(0),
            confidence: 80,
            risk_class: RiskClass::Low,
            flash_loan_eligible: true,
            trend,
            volatility: 0.01,
            market_impact: 0.001,
            freshness_ms: 0,
        };

        opp.recompute_net_profit();
        assert!(opp.satisfies_profit_identity());
        assert_eq!(opp.net_profit, dec!(54.50));
    }

    #[test]
    fn trend_sample_bounded_ring_buffer() {
        let mut t = TrendSample::new(3);
        for p in [1, 2, 3, 4, 5] {
            t.push(Decimal::from(p));
        }
        assert_eq!(t.as_slice().len(), 3);
        assert_eq!(t.oldest(), Some(Decimal::from(3)));
        assert_eq!(t.latest(), Some(Decimal::from(5)));
    }
}
