use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use chain::{CallRequest, ChainClient, TransactionReceipt};
use core_model::{execution::Plan, ChainId};
use executor::{ExecutionError, Signer, Submitter};

/// One `Submitter` shared across every chain's worker queues, dispatching to
/// the right `ChainClient` by the `chain` argument each trait method already
/// carries. `executor::ChainClientSubmitter` wires a single chain/client
/// pair (handy in its own unit tests); the router itself holds exactly one
/// submitter for every (chain, pair) worker it spawns (§4.F), so the
/// composition root needs the per-chain lookup this type provides.
pub struct MultiChainSubmitter<S: Signer> {
    clients: HashMap<ChainId, Arc<dyn ChainClient>>,
    signer: Arc<S>,
}

impl<S: Signer> MultiChainSubmitter<S> {
    pub fn new(clients: HashMap<ChainId, Arc<dyn ChainClient>>, signer: Arc<S>) -> Self {
        Self { clients, signer }
    }

    fn client(&self, chain: ChainId) -> Result<&Arc<dyn ChainClient>, ExecutionError> {
        self.clients.get(&chain).ok_or_else(|| ExecutionError::SubmissionFailed(format!("no chain client wired for {:?}", chain)))
    }
}

#[async_trait]
impl<S: Signer> Submitter for MultiChainSubmitter<S> {
    async fn submit(&self, chain: ChainId, plan: &Plan, nonce: u64, gas_price: Decimal) -> Result<String, ExecutionError> {
        let client = self.client(chain)?;
        let signed = self.signer.sign(chain, plan, nonce, gas_price);
        client.send_raw_transaction(&signed).await.map_err(ExecutionError::from)
    }

    async fn poll_receipt(&self, chain: ChainId, tx_hash: &str) -> Result<Option<TransactionReceipt>, ExecutionError> {
        self.client(chain)?.get_transaction_receipt(tx_hash).await.map_err(ExecutionError::from)
    }

    async fn replay_for_revert_reason(&self, chain: ChainId, plan: &Plan) -> Result<String, ExecutionError> {
        let client = self.client(chain)?;
        let last = plan.calls.last().ok_or_else(|| ExecutionError::SubmissionFailed("empty plan".into()))?;
        let req = CallRequest { to: last.to.clone(), data: last.data.clone(), value: Some(last.value) };
        match client.call(&req).await {
            Ok(_) => Ok("UNKNOWN".to_string()),
            Err(e) => Ok(executor::classify_error(&e).to_string()),
        }
    }
}
