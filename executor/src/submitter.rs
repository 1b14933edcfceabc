use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use chain::{CallRequest, ChainClient, TransactionReceipt};
use core_model::execution::Plan;

use crate::error::ExecutionError;

/// Produces a submittable payload for a plan. Signing and key custody are
/// deliberately kept behind this trait rather than implemented here, the
/// same way the teacher keeps `TonClient`/`SwapBuilder` as injected
/// abstractions rather than concrete transport code in the executor.
pub trait Signer: Send + Sync {
    fn sign(&self, chain: core_model::ChainId, plan: &Plan, nonce: u64, gas_price: Decimal) -> String;
}

/// Everything the executor needs from the chain to move an execution
/// through Submitted -> Pending -> terminal (§4.F).
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, chain: core_model::ChainId, plan: &Plan, nonce: u64, gas_price: Decimal) -> Result<String, ExecutionError>;
    async fn poll_receipt(&self, chain: core_model::ChainId, tx_hash: &str) -> Result<Option<TransactionReceipt>, ExecutionError>;
    async fn replay_for_revert_reason(&self, chain: core_model::ChainId, plan: &Plan) -> Result<String, ExecutionError>;
}

/// Wires `Submitter` to a live `ChainClient` plus an injected `Signer`.
pub struct ChainClientSubmitter<C, S> {
    client: Arc<C>,
    signer: Arc<S>,
}

impl<C, S> ChainClientSubmitter<C, S> {
    pub fn new(client: Arc<C>, signer: Arc<S>) -> Self {
        Self { client, signer }
    }
}

#[async_trait]
impl<C, S> Submitter for ChainClientSubmitter<C, S>
where
    C: ChainClient + 'static,
    S: Signer + 'static,
{
    async fn submit(&self, chain: core_model::ChainId, plan: &Plan, nonce: u64, gas_price: Decimal) -> Result<String, ExecutionError> {
        let signed = self.signer.sign(chain, plan, nonce, gas_price);
        self.client.send_raw_transaction(&signed).await.map_err(ExecutionError::from)
    }

    async fn poll_receipt(&self, _chain: core_model::ChainId, tx_hash: &str) -> Result<Option<TransactionReceipt>, ExecutionError> {
        self.client.get_transaction_receipt(tx_hash).await.map_err(ExecutionError::from)
    }

    async fn replay_for_revert_reason(&self, _chain: core_model::ChainId, plan: &Plan) -> Result<String, ExecutionError> {
        let last = plan.calls.last().ok_or_else(|| ExecutionError::SubmissionFailed("empty plan".into()))?;
        let req = CallRequest { to: last.to.clone(), data: last.data.clone(), value: Some(last.value) };
        match self.client.call(&req).await {
            Ok(_) => Ok("UNKNOWN".to_string()),
            Err(e) => Ok(crate::error::classify_error(&e).to_string()),
        }
    }
}
