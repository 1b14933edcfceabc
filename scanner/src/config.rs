use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Confidence-score weights (§9 open question 3). Defaults sum to 1.0;
/// `RiskConfig::validate` rejects configurations that don't, matching the
/// "unknown/invalid values rejected at startup" rule carried from §6.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub depth_headroom: f64,
    pub inverted_volatility: f64,
    pub venue_class_penalty: f64,
    pub staleness_penalty: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            depth_headroom: 0.35,
            inverted_volatility: 0.30,
            venue_class_penalty: 0.15,
            staleness_penalty: 0.20,
        }
    }
}

impl ConfidenceWeights {
    pub fn sum(&self) -> f64 {
        self.depth_headroom + self.inverted_volatility + self.venue_class_penalty + self.staleness_penalty
    }

    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }
}

/// Fixed thresholds for risk classification over (confidence, volatility, impact).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low_min_confidence: u8,
    pub low_max_volatility: f64,
    pub medium_min_confidence: u8,
    pub medium_max_volatility: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_min_confidence: 75,
            low_max_volatility: 0.02,
            medium_min_confidence: 50,
            medium_max_volatility: 0.06,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RiskConfig {
    pub weights: ConfidenceWeights,
    pub thresholds: RiskThresholds,
    pub min_profit_usd: Decimal,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.weights.is_valid() {
            return Err(format!("confidence weights must sum to 1.0, got {}", self.weights.sum()));
        }
        Ok(())
    }
}

/// Admission-control configuration applied before a candidate may be offered
/// for execution (§4.D).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdmissionConfig {
    pub gas_price_ceiling: Decimal,
    pub max_position_size: Decimal,
    pub cooldown_ms: u64,
    pub min_confidence_auto_execute: u8,
    pub allowed_risk_classes: Vec<core_model::RiskClass>,
}
