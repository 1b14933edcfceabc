use rust_decimal::Decimal;

/// Exponential moving average over sampled gas prices (§4.A: "gasPrice with
/// EMA smoothing"). A short window reacts to base-fee spikes within a couple
/// of samples without chasing every single-block jitter.
#[derive(Clone, Copy, Debug)]
pub struct GasPriceEma {
    alpha: Decimal,
    value: Option<Decimal>,
}

impl GasPriceEma {
    /// `window` is the number of samples the average should weight most
    /// heavily, converted to a smoothing factor alpha = 2 / (window + 1).
    pub fn new(window: u32) -> Self {
        let window = window.max(1);
        let alpha = Decimal::from(2) / Decimal::from(window + 1);
        Self { alpha, value: None }
    }

    pub fn sample(&mut self, price: Decimal) -> Decimal {
        let next = match self.value {
            None => price,
            Some(prev) => prev + self.alpha * (price - prev),
        };
        self.value = Some(next);
        next
    }

    pub fn current(&self) -> Option<Decimal> {
        self.value
    }
}
