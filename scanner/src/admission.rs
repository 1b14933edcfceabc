use std::collections::HashMap;

use rust_decimal::Decimal;

use core_model::Opportunity;

use crate::config::AdmissionConfig;

/// Outcome of the admission check (§4.D). Deliberately pure: no IO, no
/// locking, mirroring the teacher's `check_session_eligibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    GasCeilingExceeded,
    PositionTooLarge,
    CooldownActive,
    ConfidenceTooLow,
    RiskClassNotAllowed,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

pub fn check_admission(
    opp: &Opportunity,
    current_gas_price: Decimal,
    cfg: &AdmissionConfig,
    last_attempt_ms: Option<u64>,
    now_ms: u64,
) -> Admission {
    if current_gas_price > cfg.gas_price_ceiling {
        return Admission::GasCeilingExceeded;
    }
    if opp.reference_notional > cfg.max_position_size {
        return Admission::PositionTooLarge;
    }
    if let Some(last) = last_attempt_ms {
        if now_ms.saturating_sub(last) < cfg.cooldown_ms {
            return Admission::CooldownActive;
        }
    }
    if opp.confidence < cfg.min_confidence_auto_execute {
        return Admission::ConfidenceTooLow;
    }
    if !cfg.allowed_risk_classes.contains(&opp.risk_class) {
        return Admission::RiskClassNotAllowed;
    }
    Admission::Admitted
}

/// Tracks the last admission attempt per pair, driving the cooldown check
/// above. Keyed by `TokenPair::id()` since pairs are pinned at configuration
/// time (§3 invariant).
#[derive(Default)]
pub struct CooldownTracker {
    last_attempt_ms: HashMap<String, u64>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_attempt(&self, pair_id: &str) -> Option<u64> {
        self.last_attempt_ms.get(pair_id).copied()
    }

    pub fn record_attempt(&mut self, pair_id: &str, now_ms: u64) {
        self.last_attempt_ms.insert(pair_id.to_string(), now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{ChainId, PricingModel, RiskClass, Token, TokenPair, Venue};
    use rust_decimal_macros::dec;

    fn base_opp() -> Opportunity {
        let venue = Venue::new(ChainId::Polygon, "V", PricingModel::ConstantProductV2);
        Opportunity {
            id: "x".into(),
            pair: TokenPair::new(Token::new("0xa", 18, "MATIC"), Token::new("0xb", 18, "USDT")),
            chain: ChainId::Polygon,
            buy_venue: venue.clone(),
            buy_price: dec!(1),
            sell_venue: venue,
            sell_price: dec!(1),
            gross_spread_bps: dec!(10),
            reference_notional: dec!(1000),
            gross_profit: dec!(50),
            gas_cost_usd: dec!(5),
            slippage_reserve: dec!(2),
            flash_fee: dec!(0),
            net_profit: dec!(43),
            confidence: 80,
            risk_class: RiskClass::Low,
            flash_loan_eligible: true,
            trend: core_model::opportunity::TrendSample::new(1),
            volatility: 0.01,
            market_impact: 0.01,
            freshness_ms: 0,
        }
    }

    fn cfg() -> AdmissionConfig {
        AdmissionConfig {
            gas_price_ceiling: dec!(100),
            max_position_size: dec!(5000),
            cooldown_ms: 5_000,
            min_confidence_auto_execute: 70,
            allowed_risk_classes: vec![RiskClass::Low, RiskClass::Medium],
        }
    }

    #[test]
    fn admits_within_all_bounds() {
        let out = check_admission(&base_opp(), dec!(10), &cfg(), None, 10_000);
        assert_eq!(out, Admission::Admitted);
    }

    #[test]
    fn rejects_above_gas_ceiling() {
        let out = check_admission(&base_opp(), dec!(150), &cfg(), None, 10_000);
        assert_eq!(out, Admission::GasCeilingExceeded);
    }

    #[test]
    fn rejects_during_cooldown() {
        let out = check_admission(&base_opp(), dec!(10), &cfg(), Some(9_000), 10_000);
        assert_eq!(out, Admission::CooldownActive);
    }

    #[test]
    fn rejects_low_confidence() {
        let mut opp = base_opp();
        opp.confidence = 50;
        let out = check_admission(&opp, dec!(10), &cfg(), None, 10_000);
        assert_eq!(out, Admission::ConfidenceTooLow);
    }

    #[test]
    fn rejects_disallowed_risk_class() {
        let mut opp = base_opp();
        opp.risk_class = RiskClass::High;
        let out = check_admission(&opp, dec!(10), &cfg(), None, 10_000);
        assert_eq!(out, Admission::RiskClassNotAllowed);
    }

    #[test]
    fn cooldown_tracker_records_and_reports_last_attempt() {
        let mut t = CooldownTracker::new();
        assert!(t.last_attempt("MATIC/USDT").is_none());
        t.record_attempt("MATIC/USDT", 1_000);
        assert_eq!(t.last_attempt("MATIC/USDT"), Some(1_000));
    }
}
