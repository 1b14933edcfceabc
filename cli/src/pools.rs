use serde::Deserialize;

use core_model::{ChainId, PricingModel};

/// One venue/pool to scan, loaded from `POOLS_CONFIG_PATH` (default
/// `pools.json`). Which pools exist on which chains is deployment data, not
/// process configuration, so it lives in its own document rather than in
/// `AppConfig` — the same separation `backend/src/config.rs` draws between
/// `AppConfig` (process tuning) and the market/pair wiring chosen in
/// `main.rs` at the call site.
#[derive(Clone, Debug, Deserialize)]
pub struct PoolConfig {
    pub chain: ChainId,
    pub pair_id: String,
    pub base_symbol: String,
    pub base_address: String,
    pub base_decimals: u8,
    pub quote_symbol: String,
    pub quote_address: String,
    pub quote_decimals: u8,
    pub venue_name: String,
    pub pricing_model: PricingModel,
    pub pool_address: String,
    pub fee_bps: u32,
}

pub fn load(path: &str) -> Vec<PoolConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path, error = %e, "pools config malformed, starting with no watched pools");
            Vec::new()
        }),
        Err(_) => {
            tracing::warn!(path, "no pools config found, starting with no watched pools");
            Vec::new()
        }
    }
}
