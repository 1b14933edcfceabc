use core_model::RiskClass;

use crate::config::{ConfidenceWeights, RiskThresholds};

/// Weighted combination of (depth headroom, inverted volatility, venue-class
/// penalty, staleness penalty), clamped to [0, 100] (§4.C step 6).
///
/// Each input is already normalized to [0, 1] by the caller (1.0 = best).
pub fn compute_confidence(
    depth_headroom: f64,
    inverted_volatility: f64,
    venue_class_score: f64,
    freshness_score: f64,
    weights: &ConfidenceWeights,
) -> u8 {
    let raw = weights.depth_headroom * depth_headroom
        + weights.inverted_volatility * inverted_volatility
        + weights.venue_class_penalty * venue_class_score
        + weights.staleness_penalty * freshness_score;

    (raw * 100.0).clamp(0.0, 100.0) as u8
}

/// Fixed thresholds over (confidence, volatility, impact) (§4.C step 7).
/// `impact_bps` gates High regardless of the other two: large price impact
/// is itself a risk signal no confidence score should paper over.
pub fn classify_risk(confidence: u8, volatility: f64, impact_bps: f64, thresholds: &RiskThresholds) -> RiskClass {
    if impact_bps > 80.0 {
        return RiskClass::High;
    }
    if confidence >= thresholds.low_min_confidence && volatility <= thresholds.low_max_volatility {
        RiskClass::Low
    } else if confidence >= thresholds.medium_min_confidence && volatility <= thresholds.medium_max_volatility {
        RiskClass::Medium
    } else {
        RiskClass::High
    }
}
