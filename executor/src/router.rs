use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Sender};
use tokio::sync::{Mutex, Semaphore};
use tracing::info;

use core_model::ChainId;

use crate::nonce::NonceAllocator;
use crate::submitter::Submitter;
use crate::worker::{ExecutorConfig, ExecutorWorker, PendingExecution};

/// Routes incoming executions into per-(chain, pair) worker queues and owns
/// the cross-chain concurrency cap, generalizing the teacher's
/// `PairExecutorRouter` from "one queue per trading pair" to "one queue per
/// (chain, pair)" (§4.F concurrency rules).
pub struct ExecutorRouter<S: Submitter> {
    submitter: Arc<S>,
    nonces: Arc<NonceAllocator>,
    global_permits: Arc<Semaphore>,
    cfg: ExecutorConfig,
    queue_capacity: usize,
    queues: Mutex<HashMap<(ChainId, String), Sender<PendingExecution>>>,
}

impl<S: Submitter + 'static> ExecutorRouter<S> {
    pub fn new(submitter: Arc<S>, cfg: ExecutorConfig, global_concurrency_cap: usize, queue_capacity: usize) -> Self {
        Self {
            submitter,
            nonces: Arc::new(NonceAllocator::new()),
            global_permits: Arc::new(Semaphore::new(global_concurrency_cap.max(1))),
            cfg,
            queue_capacity: queue_capacity.max(1),
            queues: Mutex::new(HashMap::new()),
        }
    }

    pub fn nonces(&self) -> Arc<NonceAllocator> {
        self.nonces.clone()
    }

    /// Enqueues an execution onto its (chain, pair) worker, spawning that
    /// worker on first use.
    pub async fn dispatch(&self, chain: ChainId, pair_id: &str, pending: PendingExecution) -> Result<(), PendingExecution> {
        let tx = self.get_or_spawn(chain, pair_id).await;
        tx.send(pending).await.map_err(|e| e.0)
    }

    async fn get_or_spawn(&self, chain: ChainId, pair_id: &str) -> Sender<PendingExecution> {
        let key = (chain, pair_id.to_string());
        let mut queues = self.queues.lock().await;
        if let Some(tx) = queues.get(&key) {
            return tx.clone();
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let worker = ExecutorWorker {
            chain,
            pair_id: pair_id.to_string(),
            submitter: self.submitter.clone(),
            nonces: self.nonces.clone(),
            global_permits: self.global_permits.clone(),
            cfg: self.cfg.clone(),
        };
        tokio::spawn(worker.run(rx));
        info!(?chain, pair_id, "spawned executor worker");
        queues.insert(key, tx.clone());
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chain::{LogEntry, TransactionReceipt};
    use core_model::execution::{Execution, Plan};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct ImmediateConfirm;

    #[async_trait]
    impl Submitter for ImmediateConfirm {
        async fn submit(&self, _chain: ChainId, _plan: &Plan, _nonce: u64, _gas_price: Decimal) -> Result<String, crate::error::ExecutionError> {
            Ok("tx-1".into())
        }
        async fn poll_receipt(&self, _chain: ChainId, tx_hash: &str) -> Result<Option<TransactionReceipt>, crate::error::ExecutionError> {
            Ok(Some(TransactionReceipt { tx_hash: tx_hash.into(), status: true, gas_used: 21_000, logs: vec![LogEntry { address: "0x".into(), topics: vec![], data: "1.0".into() }] }))
        }
        async fn replay_for_revert_reason(&self, _chain: ChainId, _plan: &Plan) -> Result<String, crate::error::ExecutionError> {
            Ok("UNKNOWN".into())
        }
    }

    #[tokio::test]
    async fn dispatch_spawns_one_worker_per_chain_pair_pair() {
        let cfg = ExecutorConfig { execution_deadline: Duration::from_millis(200), max_replacements: 1, gas_bump_factor: dec!(1.1) };
        let router = ExecutorRouter::new(Arc::new(ImmediateConfirm), cfg, 4, 8);

        let pending = PendingExecution {
            execution: Execution::new("e1", "o1", ChainId::Polygon, 0),
            plan: Plan { calls: vec![], simulated_gas: 21_000, gas_limit: 25_200, flash_loan_provider: None, flash_fee: dec!(0) },
            signer: "0xsigner".into(),
            base_gas_price: dec!(30),
        };
        assert!(router.dispatch(ChainId::Polygon, "MATIC/USDT", pending).await.is_ok());
        assert_eq!(router.queues.lock().await.len(), 1);
    }
}
