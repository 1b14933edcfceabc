use std::cmp::Ordering;

use core_model::Opportunity;

/// Total order per §4.C: net profit descending, then confidence descending,
/// then gas cost ascending, then pair id lexicographic - total so that
/// sorting the same input twice always yields the same order.
pub fn compare(a: &Opportunity, b: &Opportunity) -> Ordering {
    b.net_profit
        .cmp(&a.net_profit)
        .then_with(|| b.confidence.cmp(&a.confidence))
        .then_with(|| a.gas_cost_usd.cmp(&b.gas_cost_usd))
        .then_with(|| a.pair.id().cmp(&b.pair.id()))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{ChainId, PricingModel, RiskClass, Token, TokenPair, Venue};
    use rust_decimal_macros::dec;

    fn opp(net_profit: rust_decimal::Decimal, confidence: u8, gas: rust_decimal::Decimal, pair_sym: &str, id: &str) -> Opportunity {
        let venue = Venue::new(ChainId::Polygon, "V", PricingModel::ConstantProductV2);
        Opportunity {
            id: id.into(),
            pair: TokenPair::new(Token::new("0xa", 18, pair_sym), Token::new("0xb", 18, "USDT")),
            chain: ChainId::Polygon,
            buy_venue: venue.clone(),
            buy_price: dec!(1),
            sell_venue: venue,
            sell_price: dec!(1),
            gross_spread_bps: dec!(10),
            reference_notional: dec!(1000),
            gross_profit: net_profit,
            gas_cost_usd: gas,
            slippage_reserve: dec!(0),
            flash_fee: dec!(0),
            net_profit,
            confidence,
            risk_class: RiskClass::Low,
            flash_loan_eligible: true,
            trend: core_model::opportunity::TrendSample::new(1),
            volatility: 0.0,
            market_impact: 0.0,
            freshness_ms: 0,
        }
    }

    #[test]
    fn sorts_by_net_profit_descending_primarily() {
        let mut opps = vec![
            opp(dec!(10), 50, dec!(1), "A", "1"),
            opp(dec!(30), 50, dec!(1), "B", "2"),
            opp(dec!(20), 50, dec!(1), "C", "3"),
        ];
        rank(&mut opps);
        assert_eq!(opps[0].id, "2");
        assert_eq!(opps[1].id, "3");
        assert_eq!(opps[2].id, "1");
    }

    #[test]
    fn ties_broken_by_confidence_then_gas_then_pair_id() {
        let mut opps = vec![
            opp(dec!(10), 60, dec!(5), "B", "1"),
            opp(dec!(10), 80, dec!(5), "A", "2"),
            opp(dec!(10), 80, dec!(2), "C", "3"),
        ];
        rank(&mut opps);
        assert_eq!(opps[0].id, "3"); // highest confidence, lowest gas
        assert_eq!(opps[1].id, "2");
        assert_eq!(opps[2].id, "1");
    }

    #[test]
    fn ranking_is_stable_across_repeated_sorts() {
        let mut opps = vec![
            opp(dec!(10), 60, dec!(5), "B", "1"),
            opp(dec!(30), 80, dec!(5), "A", "2"),
            opp(dec!(10), 80, dec!(2), "C", "3"),
        ];
        let mut second = opps.clone();
        rank(&mut opps);
        rank(&mut second);
        let ids: Vec<_> = opps.iter().map(|o| o.id.clone()).collect();
        let ids2: Vec<_> = second.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, ids2);
    }
}
