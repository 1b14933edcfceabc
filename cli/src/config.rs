use std::collections::HashMap;

use core_model::ChainId;
use rust_decimal::Decimal;
use scanner::{AdmissionConfig, RiskConfig};

/// Every configuration key named in the EXTERNAL INTERFACES table, typed and
/// defaulted, grounded on `backend/src/config.rs::AppConfig::from_env`'s
/// shape: flat fields with documented defaults, loaded from the process
/// environment. `validate` is the startup gate that produces exit code 1
/// (§6 Exit codes) on anything out of range.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,

    pub min_profit_usd: Decimal,
    pub max_gas_price_gwei: HashMap<ChainId, Decimal>,
    pub native_usd_price: HashMap<ChainId, Decimal>,
    pub assumed_gas_units: u64,
    pub slippage_tolerance: Decimal,
    pub use_flash_loans: bool,
    pub dry_run_mode: bool,
    pub max_position_size: Decimal,
    pub rpc_endpoints: HashMap<ChainId, Vec<String>>,

    pub rpc_timeout: std::time::Duration,
    pub execution_deadline: std::time::Duration,
    pub max_replacements: u32,
    pub gas_bump_factor: Decimal,
    pub global_execution_concurrency: usize,
    pub executor_queue_capacity: usize,

    pub retention: store::RetentionPolicy,
    pub live_view_ttl: std::time::Duration,
}

fn chain_env_prefix(chain: ChainId) -> &'static str {
    match chain {
        ChainId::Ethereum => "ETHEREUM",
        ChainId::Polygon => "POLYGON",
        ChainId::Arbitrum => "ARBITRUM",
        ChainId::Bsc => "BSC",
        ChainId::Avalanche => "AVALANCHE",
        ChainId::Base => "BASE",
    }
}

/// Rough starting point for `<CHAIN>_NATIVE_USD_PRICE`; operators override
/// per deployment. Only used to turn a sampled gas price into a USD figure
/// for `ScanContext::gas_cost_usd` - not a price feed, not used for sizing.
fn default_native_usd_price(chain: ChainId) -> Decimal {
    match chain {
        ChainId::Ethereum | ChainId::Arbitrum | ChainId::Base => Decimal::from(3_000),
        ChainId::Polygon => Decimal::new(7, 1),
        ChainId::Bsc => Decimal::from(600),
        ChainId::Avalanche => Decimal::from(35),
    }
}

impl AppConfig {
    /// Reads every key from the process environment, substituting the
    /// documented default for anything unset. Unlike `PUT /config`'s
    /// unknown-key rejection (api crate, runtime), an unset env var is not
    /// an error here — it is exactly the "every option has a default" rule.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://arbengine.db".to_string());

        let min_profit_usd = env_decimal("MIN_PROFIT_USD", Decimal::from(5));
        let slippage_tolerance = env_decimal("SLIPPAGE_TOLERANCE", Decimal::new(5, 3));
        let use_flash_loans = env_bool("USE_FLASH_LOANS", true);
        let dry_run_mode = env_bool("DRY_RUN_MODE", true);
        let max_position_size = env_decimal("MAX_POSITION_SIZE", Decimal::from(50_000));

        let mut max_gas_price_gwei = HashMap::new();
        let mut native_usd_price = HashMap::new();
        let mut rpc_endpoints = HashMap::new();
        for chain in ChainId::ALL {
            let prefix = chain_env_prefix(chain);
            max_gas_price_gwei.insert(chain, env_decimal(&format!("{prefix}_MAX_GAS_PRICE_GWEI"), Decimal::from(200)));
            native_usd_price.insert(chain, env_decimal(&format!("{prefix}_NATIVE_USD_PRICE"), default_native_usd_price(chain)));
            let rpc = std::env::var(format!("{prefix}_RPC")).ok();
            rpc_endpoints.insert(chain, rpc.map(|u| vec![u]).unwrap_or_default());
        }

        Self {
            database_url,
            min_profit_usd,
            max_gas_price_gwei,
            native_usd_price,
            assumed_gas_units: 250_000,
            slippage_tolerance,
            use_flash_loans,
            dry_run_mode,
            max_position_size,
            rpc_endpoints,
            rpc_timeout: std::time::Duration::from_secs(5),
            execution_deadline: std::time::Duration::from_secs(60),
            max_replacements: 3,
            gas_bump_factor: Decimal::new(115, 2),
            global_execution_concurrency: 8,
            executor_queue_capacity: 128,
            retention: store::RetentionPolicy::default(),
            live_view_ttl: std::time::Duration::from_secs(2),
        }
    }

    /// Startup validation (exit code 1 on failure, §6): every chain needs at
    /// least one RPC endpoint, fractions must be in `[0, 1]`, and positive
    /// quantities must actually be positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.slippage_tolerance < Decimal::ZERO || self.slippage_tolerance > Decimal::ONE {
            return Err(format!("SLIPPAGE_TOLERANCE must be within [0, 1], got {}", self.slippage_tolerance));
        }
        if self.min_profit_usd < Decimal::ZERO {
            return Err("MIN_PROFIT_USD must be non-negative".to_string());
        }
        if self.max_position_size <= Decimal::ZERO {
            return Err("MAX_POSITION_SIZE must be positive".to_string());
        }
        for chain in ChainId::ALL {
            if self.rpc_endpoints.get(&chain).map(Vec::is_empty).unwrap_or(true) {
                return Err(format!("{:?}_RPC has no configured endpoint", chain));
            }
        }
        Ok(())
    }

    pub fn risk_config(&self, chain: ChainId) -> RiskConfig {
        let _ = chain;
        RiskConfig { weights: Default::default(), thresholds: Default::default(), min_profit_usd: self.min_profit_usd }
    }

    /// Converts a sampled gas price (gwei) into a USD figure for
    /// `ScanContext::gas_cost_usd`, using `assumed_gas_units` as the typical
    /// size of a borrow -> swap -> swap -> repay bundle (§4.E).
    pub fn gas_cost_usd(&self, chain: ChainId, gas_price_gwei: Decimal) -> Decimal {
        let price = *self.native_usd_price.get(&chain).unwrap_or(&Decimal::ZERO);
        let gas_native = gas_price_gwei * Decimal::from(self.assumed_gas_units) / Decimal::from(1_000_000_000u64);
        gas_native * price
    }

    pub fn admission_config(&self, chain: ChainId) -> AdmissionConfig {
        AdmissionConfig {
            gas_price_ceiling: *self.max_gas_price_gwei.get(&chain).unwrap_or(&Decimal::from(200)),
            max_position_size: self.max_position_size,
            cooldown_ms: 5_000,
            min_confidence_auto_execute: 70,
            allowed_risk_classes: vec![core_model::RiskClass::Low, core_model::RiskClass::Medium],
        }
    }
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
