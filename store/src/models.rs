use serde::{Deserialize, Serialize};

/// A stats snapshot row. Raw rows and hourly-downsampled rows share this
/// shape; `downsampled` distinguishes them for retention purposes (§4.G).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ts_ms: u64,
    pub downsampled: bool,
    pub pnl_total: rust_decimal::Decimal,
    pub pnl_today: rust_decimal::Decimal,
    pub win_rate: f64,
    pub avg_profit: rust_decimal::Decimal,
    pub sharpe: f64,
    pub max_drawdown: rust_decimal::Decimal,
    pub active_capital: rust_decimal::Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GasSample {
    pub ts_ms: u64,
    pub chain: core_model::ChainId,
    pub downsampled: bool,
    pub gas_price: rust_decimal::Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainMetric {
    pub ts_ms: u64,
    pub chain: core_model::ChainId,
    pub downsampled: bool,
    pub healthy_endpoint_count: u32,
    pub block_number: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub ts_ms: u64,
    pub severity: AlertSeverity,
    pub message: String,
}
