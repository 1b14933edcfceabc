use rust_decimal::Decimal;
use tracing::{debug, instrument};

use chain::{CallRequest, ChainClient};
use core_model::execution::{Call, Plan};

use crate::error::PlanError;
use crate::provider::FlashLoanProvider;

fn to_core_call(req: &CallRequest) -> Call {
    Call { to: req.to.clone(), data: req.data.clone(), value: req.value.unwrap_or(Decimal::ZERO) }
}

fn decode_balance(hex: &str) -> Result<Decimal, PlanError> {
    let digits = hex.trim_start_matches("0x");
    let wei = u128::from_str_radix(digits, 16).map_err(|_| PlanError::SimulationRevert { step: 0, reason: format!("non-hex balance: {hex}") })?;
    Ok(Decimal::from(wei) / Decimal::from(1_000_000_000_000_000_000u128))
}

/// Assembles and simulates a borrow -> buy swap -> sell swap -> repay bundle
/// (§4.E steps 1-4) against the current block. Any reverted step, or a final
/// balance below repayment plus `min_margin`, rejects the plan before it
/// ever reaches the executor.
#[instrument(skip(chain_client, buy_swap, sell_swap), fields(provider = %provider.name, amount_in = %amount_in))]
pub async fn assemble_and_simulate(
    chain_client: &dyn ChainClient,
    provider: &FlashLoanProvider,
    buy_swap: CallRequest,
    sell_swap: CallRequest,
    amount_in: Decimal,
    min_margin: Decimal,
) -> Result<Plan, PlanError> {
    let flash_fee = amount_in * Decimal::from(provider.fee_bps) / Decimal::from(10_000);
    let repayment = amount_in + flash_fee;

    let borrow = CallRequest { to: provider.name.clone(), data: format!("flashLoan(amount={amount_in})"), value: None };
    let repay = CallRequest { to: provider.name.clone(), data: format!("repay(amount={repayment})"), value: None };

    let steps = [&borrow, &buy_swap, &sell_swap, &repay];
    let mut simulated_gas: u64 = 0;
    let mut last_result = String::new();

    for (i, req) in steps.iter().enumerate() {
        let result = chain_client.call(req).await.map_err(|e| PlanError::SimulationRevert { step: i, reason: e.to_string() })?;
        let gas = chain_client.estimate_gas(req).await.map_err(|e| PlanError::SimulationRevert { step: i, reason: e.to_string() })?;
        simulated_gas += gas;
        last_result = result;
    }

    let final_balance = decode_balance(&last_result)?;
    let required = repayment + min_margin;
    if final_balance < required {
        return Err(PlanError::InsufficientMargin { actual: final_balance, required });
    }

    let gas_limit = (simulated_gas as f64 * 1.2).ceil() as u64;
    debug!(simulated_gas, gas_limit, "plan simulation succeeded");

    Ok(Plan {
        calls: vec![to_core_call(&borrow), to_core_call(&buy_swap), to_core_call(&sell_swap), to_core_call(&repay)],
        simulated_gas,
        gas_limit,
        flash_loan_provider: Some(provider.name.clone()),
        flash_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chain::{LogEntry, RpcError, TransactionReceipt};
    use core_model::ChainId;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FakeChainClient {
        final_balance_wei: u128,
        gas_per_call: u64,
        revert_at: Option<usize>,
        calls_seen: AtomicU64,
    }

    #[async_trait]
    impl ChainClient for FakeChainClient {
        fn chain(&self) -> ChainId {
            ChainId::Polygon
        }
        async fn block_number(&self) -> Result<u64, RpcError> {
            Ok(1)
        }
        async fn gas_price(&self) -> Result<Decimal, RpcError> {
            Ok(dec!(30))
        }
        async fn call(&self, _req: &CallRequest) -> Result<String, RpcError> {
            let idx = self.calls_seen.fetch_add(1, Ordering::SeqCst) as usize;
            if self.revert_at == Some(idx) {
                return Err(RpcError::Reverted("INSUFFICIENT_OUTPUT_AMOUNT".into()));
            }
            Ok(format!("0x{:x}", self.final_balance_wei))
        }
        async fn estimate_gas(&self, _req: &CallRequest) -> Result<u64, RpcError> {
            Ok(self.gas_per_call)
        }
        async fn send_raw_transaction(&self, _signed_tx_hex: &str) -> Result<String, RpcError> {
            unimplemented!()
        }
        async fn get_transaction_receipt(&self, _tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError> {
            unimplemented!()
        }
        async fn get_logs(&self, _address: &str, _from_block: u64, _to_block: u64) -> Result<Vec<LogEntry>, RpcError> {
            unimplemented!()
        }
        async fn multicall(&self, _reqs: &[CallRequest]) -> Result<Vec<String>, RpcError> {
            unimplemented!()
        }
    }

    fn provider() -> FlashLoanProvider {
        FlashLoanProvider { name: "aave".into(), fee_bps: 9, available_liquidity: dec!(1000000) }
    }

    fn swap_call(to: &str) -> CallRequest {
        CallRequest { to: to.into(), data: "swap(...)".into(), value: None }
    }

    #[tokio::test]
    async fn successful_simulation_produces_a_plan_with_scaled_gas_limit() {
        let client = FakeChainClient { final_balance_wei: 2_000_000_000_000_000_000_000, gas_per_call: 50_000, revert_at: None, calls_seen: AtomicU64::new(0) };
        let plan = assemble_and_simulate(&client, &provider(), swap_call("buy"), swap_call("sell"), dec!(1000), dec!(1))
            .await
            .unwrap();
        assert_eq!(plan.calls.len(), 4);
        assert_eq!(plan.simulated_gas, 200_000);
        assert_eq!(plan.gas_limit, 240_000);
        assert_eq!(plan.flash_loan_provider, Some("aave".to_string()));
    }

    #[tokio::test]
    async fn revert_on_any_step_rejects_the_plan() {
        let client = FakeChainClient { final_balance_wei: 2_000_000_000_000_000_000_000, gas_per_call: 50_000, revert_at: Some(2), calls_seen: AtomicU64::new(0) };
        let err = assemble_and_simulate(&client, &provider(), swap_call("buy"), swap_call("sell"), dec!(1000), dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::SimulationRevert { step: 2, .. }));
    }

    #[tokio::test]
    async fn final_balance_below_repayment_plus_margin_is_rejected() {
        let client = FakeChainClient { final_balance_wei: 1_000_000_000_000_000_000, gas_per_call: 50_000, revert_at: None, calls_seen: AtomicU64::new(0) };
        let err = assemble_and_simulate(&client, &provider(), swap_call("buy"), swap_call("sell"), dec!(1000), dec!(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InsufficientMargin { .. }));
    }
}
