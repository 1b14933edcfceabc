use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use common::decimal::{apply_bps, spread_bps};
use common::time::bucket_ms;
use core_model::opportunity::TrendSample;
use core_model::{ChainId, Opportunity, Quote, TokenPair};

use crate::confidence::{classify_risk, compute_confidence};
use crate::config::RiskConfig;

/// Parameters held constant across one scanner tick for one (chain, pair)
/// tuple; broken out from `scan_tick`'s argument list so call sites read
/// like the step list in §4.C.
pub struct ScanContext<'a> {
    pub gas_cost_usd: Decimal,
    pub slippage_reserve_fraction: Decimal,
    pub flash_fee_fraction: Decimal,
    pub flash_loan_min_notional: Decimal,
    pub quote_ttl_ms: u64,
    pub trend_bucket_ms: u64,
    pub now_ms: u64,
    pub risk: &'a RiskConfig,
}

/// Step 3-8 of §4.C, run over the quotes collected for one tick. Requires at
/// least two quotes (partial-result rule); returns one candidate per ordered
/// (buy, sell) venue pair with `sellPrice > buyPrice` and net profit at or
/// above `MIN_PROFIT_USD`.
///
/// `prior_trends` carries the sell-side ring buffer forward across ticks,
/// keyed by stable id: a bucket boundary collapses repeat ticks onto the same
/// id, so the caller's snapshot of the live map doubles as the trend history.
/// An id not present in `prior_trends` starts a fresh window.
pub fn scan_tick(
    pair: &TokenPair,
    chain: ChainId,
    quotes: &[Quote],
    reference_notional: Decimal,
    ctx: &ScanContext,
    prior_trends: &HashMap<String, TrendSample>,
) -> Vec<Opportunity> {
    if quotes.len() < 2 {
        return Vec::new();
    }

    let mut out = Vec::new();

    for buy in quotes {
        for sell in quotes {
            if std::ptr::eq(buy, sell) || sell.sell_price <= buy.buy_price {
                continue;
            }

            let notional = reference_notional.min(buy.depth_at_ceiling).min(sell.depth_at_ceiling);
            if notional <= Decimal::ZERO {
                continue;
            }

            let gross_spread = spread_bps(buy.buy_price, sell.sell_price);
            let gross_profit = apply_bps(notional, gross_spread);

            let flash_loan_eligible = notional >= ctx.flash_loan_min_notional;
            let flash_fee = if flash_loan_eligible { notional * ctx.flash_fee_fraction } else { Decimal::ZERO };
            let slippage_reserve = notional * ctx.slippage_reserve_fraction;

            let id = Opportunity::stable_id(pair, &buy.venue, &sell.venue, chain, bucket_ms(ctx.now_ms, ctx.trend_bucket_ms));
            let mut trend = prior_trends.get(&id).cloned().unwrap_or_else(|| TrendSample::new(20));
            trend.push(sell.sell_price);

            let mut opp = Opportunity {
                id,
                pair: pair.clone(),
                chain,
                buy_venue: buy.venue.clone(),
                buy_price: buy.buy_price,
                sell_venue: sell.venue.clone(),
                sell_price: sell.sell_price,
                gross_spread_bps: gross_spread,
                reference_notional: notional,
                gross_profit,
                gas_cost_usd: ctx.gas_cost_usd,
                slippage_reserve,
                flash_fee,
                net_profit: Decimal::ZERO,
                confidence: 0,
                risk_class: core_model::RiskClass::High,
                flash_loan_eligible,
                trend,
                volatility: 0.0,
                market_impact: 0.0,
                freshness_ms: ctx.now_ms,
            };
            opp.recompute_net_profit();

            if opp.net_profit < ctx.risk.min_profit_usd {
                continue;
            }

            let depth_min = buy.depth_at_ceiling.min(sell.depth_at_ceiling).max(Decimal::ONE);
            let depth_headroom = (Decimal::ONE - notional / depth_min).to_f64().unwrap_or(0.0).clamp(0.0, 1.0);
            let staleness_ms = ctx.now_ms.saturating_sub(buy.sampled_at_ms.min(sell.sampled_at_ms));
            let freshness_score = (1.0 - staleness_ms as f64 / ctx.quote_ttl_ms.max(1) as f64).clamp(0.0, 1.0);
            let venue_class_score = if buy.approximate || sell.approximate { 0.5 } else { 1.0 };
            let volatility = opp.trend.oldest().zip(opp.trend.latest()).map(|(o, l)| {
                let o = o.to_f64().unwrap_or(1.0).max(1e-9);
                let l = l.to_f64().unwrap_or(o);
                ((l - o) / o).abs()
            }).unwrap_or(0.0);
            let inverted_volatility = (1.0 - volatility).clamp(0.0, 1.0);

            opp.volatility = volatility;
            opp.confidence = compute_confidence(depth_headroom, inverted_volatility, venue_class_score, freshness_score, &ctx.risk.weights);
            opp.market_impact = (1.0 - depth_headroom) * 100.0;
            opp.risk_class = classify_risk(opp.confidence, volatility, opp.market_impact, &ctx.risk.thresholds);

            out.push(opp);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{PricingModel, Venue};
    use rust_decimal_macros::dec;

    fn quote(name: &str, buy: Decimal, sell: Decimal, depth: Decimal) -> Quote {
        Quote {
            venue: Venue::new(ChainId::Polygon, name, PricingModel::ConstantProductV2),
            logical_ts: 1,
            sampled_at_ms: 9_900,
            mid_price: (buy + sell) / dec!(2),
            buy_price: buy,
            sell_price: sell,
            depth_at_ceiling: depth,
            fee_bps: 30,
            approximate: false,
        }
    }

    fn pair() -> TokenPair {
        TokenPair::new(core_model::Token::new("0xa", 18, "MATIC"), core_model::Token::new("0xb", 6, "USDT"))
    }

    fn ctx(risk: &RiskConfig) -> ScanContext<'_> {
        ScanContext {
            gas_cost_usd: dec!(12.80),
            slippage_reserve_fraction: dec!(0.01),
            flash_fee_fraction: dec!(0.0009),
            flash_loan_min_notional: dec!(100),
            quote_ttl_ms: 5_000,
            trend_bucket_ms: 1_000,
            now_ms: 10_000,
            risk,
        }
    }

    fn risk_config() -> RiskConfig {
        RiskConfig {
            weights: Default::default(),
            thresholds: Default::default(),
            min_profit_usd: dec!(1),
        }
    }

    #[test]
    fn single_quote_yields_no_candidates() {
        let quotes = vec![quote("A", dec!(1), dec!(1), dec!(1000))];
        let rc = risk_config();
        let out = scan_tick(&pair(), ChainId::Polygon, &quotes, dec!(30000), &ctx(&rc), &HashMap::new());
        assert!(out.is_empty());
    }

    #[test]
    fn profitable_spread_emits_one_candidate_per_direction() {
        let quotes = vec![quote("QuickSwap", dec!(0.8924), dec!(0.8924), dec!(30000)), quote("SushiSwap", dec!(0.8941), dec!(0.8941), dec!(30000))];
        let rc = risk_config();
        let out = scan_tick(&pair(), ChainId::Polygon, &quotes, dec!(30000), &ctx(&rc), &HashMap::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].buy_venue.name.0, "QuickSwap");
        assert_eq!(out[0].sell_venue.name.0, "SushiSwap");
        assert!(out[0].satisfies_profit_identity());
    }

    #[test]
    fn notional_is_capped_by_lesser_depth() {
        let quotes = vec![quote("A", dec!(1.0), dec!(1.0), dec!(50)), quote("B", dec!(1.05), dec!(1.05), dec!(30000))];
        let rc = risk_config();
        let out = scan_tick(&pair(), ChainId::Polygon, &quotes, dec!(30000), &ctx(&rc), &HashMap::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reference_notional, dec!(50));
    }

    #[test]
    fn below_min_profit_threshold_is_dropped() {
        let quotes = vec![quote("A", dec!(1.0), dec!(1.0), dec!(1)), quote("B", dec!(1.0001), dec!(1.0001), dec!(1))];
        let mut rc = risk_config();
        rc.min_profit_usd = dec!(1000);
        let out = scan_tick(&pair(), ChainId::Polygon, &quotes, dec!(30000), &ctx(&rc), &HashMap::new());
        assert!(out.is_empty());
    }

    #[test]
    fn empty_prior_trend_yields_zero_volatility_on_first_sighting() {
        let quotes = vec![quote("QuickSwap", dec!(0.8924), dec!(0.8924), dec!(30000)), quote("SushiSwap", dec!(0.8941), dec!(0.8941), dec!(30000))];
        let rc = risk_config();
        let out = scan_tick(&pair(), ChainId::Polygon, &quotes, dec!(30000), &ctx(&rc), &HashMap::new());
        assert_eq!(out[0].trend.as_slice().len(), 1);
        assert_eq!(out[0].volatility, 0.0);
    }

    #[test]
    fn prior_trend_is_carried_forward_and_moves_volatility() {
        let quotes = vec![quote("QuickSwap", dec!(0.8924), dec!(0.8924), dec!(30000)), quote("SushiSwap", dec!(0.8941), dec!(0.8941), dec!(30000))];
        let rc = risk_config();
        let id = Opportunity::stable_id(&pair(), &quote("QuickSwap", dec!(0), dec!(0), dec!(0)).venue, &quote("SushiSwap", dec!(0), dec!(0), dec!(0)).venue, ChainId::Polygon, bucket_ms(10_000, 1_000));

        let mut prior = HashMap::new();
        let mut t = TrendSample::new(20);
        t.push(dec!(0.5));
        prior.insert(id, t);

        let out = scan_tick(&pair(), ChainId::Polygon, &quotes, dec!(30000), &ctx(&rc), &prior);
        assert_eq!(out[0].trend.as_slice().len(), 2);
        assert!(out[0].volatility > 0.0);
    }
}
