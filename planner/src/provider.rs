use rust_decimal::Decimal;

/// A flash-loan source the planner can borrow from for one step of a plan.
#[derive(Clone, Debug)]
pub struct FlashLoanProvider {
    pub name: String,
    pub fee_bps: u32,
    pub available_liquidity: Decimal,
}

/// Chooses a provider for `amount_in` per §4.E step 1: zero-fee providers
/// first, then the cheapest fee among providers with enough liquidity. Ties
/// on fee are broken by declaration order so the choice is deterministic.
pub fn select_provider<'a>(providers: &'a [FlashLoanProvider], amount_in: Decimal) -> Option<&'a FlashLoanProvider> {
    let eligible = providers.iter().filter(|p| p.available_liquidity >= amount_in);

    let mut zero_fee = eligible.clone().filter(|p| p.fee_bps == 0);
    if let Some(p) = zero_fee.next() {
        return Some(p);
    }

    eligible.min_by_key(|p| p.fee_bps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn provider(name: &str, fee_bps: u32, liquidity: Decimal) -> FlashLoanProvider {
        FlashLoanProvider { name: name.into(), fee_bps, available_liquidity: liquidity }
    }

    #[test]
    fn prefers_zero_fee_provider_when_eligible() {
        let providers = vec![provider("cheap", 5, dec!(100000)), provider("free", 0, dec!(100000))];
        let chosen = select_provider(&providers, dec!(1000)).unwrap();
        assert_eq!(chosen.name, "free");
    }

    #[test]
    fn falls_back_to_cheapest_fee_with_sufficient_liquidity() {
        let providers = vec![provider("thin", 0, dec!(10)), provider("mid", 9, dec!(100000)), provider("expensive", 30, dec!(100000))];
        let chosen = select_provider(&providers, dec!(1000)).unwrap();
        assert_eq!(chosen.name, "mid");
    }

    #[test]
    fn excludes_providers_without_enough_liquidity() {
        let providers = vec![provider("thin", 0, dec!(10))];
        assert!(select_provider(&providers, dec!(1000)).is_none());
    }

    #[test]
    fn no_providers_returns_none() {
        assert!(select_provider(&[], dec!(1000)).is_none());
    }
}
