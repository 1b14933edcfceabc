use thiserror::Error;

use chain::RpcError;

/// Failure modes for plan assembly and simulation (§4.E). All of these reject
/// the plan without submitting; none leave on-chain state touched.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("no flash-loan provider has sufficient liquidity for {0}")]
    NoEligibleProvider(rust_decimal::Decimal),
    #[error("simulation reverted at step {step}: {reason}")]
    SimulationRevert { step: usize, reason: String },
    #[error("simulated final balance {actual} below required repayment + margin {required}")]
    InsufficientMargin { actual: rust_decimal::Decimal, required: rust_decimal::Decimal },
    #[error("chain client error during simulation: {0}")]
    Transport(#[from] RpcError),
}
