use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::Receiver;
use tracing::{info, warn};

use core_model::execution::{Execution, ExecutionStatus, Plan};
use core_model::ChainId;

use crate::error::ExecutionError;
use crate::nonce::NonceAllocator;
use crate::submitter::Submitter;

/// Bounds on the cancel-replacement loop and the wait for confirmation
/// (§4.F "Submitted/Pending -> Failed").
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    pub execution_deadline: Duration,
    pub max_replacements: u32,
    pub gas_bump_factor: Decimal,
}

/// One unit of work handed to a pair worker: the execution shell (already
/// New), its simulated plan, the signer address, and the gas price to start
/// from.
pub struct PendingExecution {
    pub execution: Execution,
    pub plan: Plan,
    pub signer: String,
    pub base_gas_price: Decimal,
}

/// Processes executions for a single (chain, pair) sequentially - mirrors
/// the teacher's per-pair FIFO `ExecutorWorker`, generalized from "one
/// batch at a time" to "one in-flight execution at a time" per §4.F's
/// concurrency rule. `global_permits` enforces the separate cross-chain cap.
pub struct ExecutorWorker<S: Submitter> {
    pub chain: ChainId,
    pub pair_id: String,
    pub submitter: Arc<S>,
    pub nonces: Arc<NonceAllocator>,
    pub global_permits: Arc<Semaphore>,
    pub cfg: ExecutorConfig,
}

impl<S: Submitter> ExecutorWorker<S> {
    pub async fn run(self, mut rx: Receiver<PendingExecution>) {
        info!(chain = ?self.chain, pair = %self.pair_id, "executor worker started");
        while let Some(pending) = rx.recv().await {
            let finished = self.execute_one(pending).await;
            info!(chain = ?self.chain, pair = %self.pair_id, status = ?finished.status, "execution finished");
        }
        warn!(chain = ?self.chain, pair = %self.pair_id, "executor worker exiting");
    }

    /// Drives one execution from Planned through a terminal status,
    /// including the cancel-replacement loop (§4.F).
    pub async fn execute_one(&self, pending: PendingExecution) -> Execution {
        let _permit = self.global_permits.acquire().await;
        let PendingExecution { mut execution, plan, signer, base_gas_price } = pending;
        let now = common::time::now_ms;

        execution.plan = Some(plan.clone());
        if !execution.transition(ExecutionStatus::Planned, now()) {
            return execution;
        }
        if !execution.transition(ExecutionStatus::Simulated, now()) {
            return execution;
        }

        let nonce = match self.nonces.allocate(self.chain, &signer) {
            Ok(n) => n,
            Err(_) => {
                execution.transition(ExecutionStatus::Failed, now());
                return execution;
            }
        };
        execution.nonce = Some(nonce);

        let mut gas_price = base_gas_price;
        let mut attempt = 0u32;

        loop {
            match self.submitter.submit(self.chain, &plan, nonce, gas_price).await {
                Ok(tx_hash) => {
                    execution.tx_hashes.push(tx_hash);
                }
                Err(e) => {
                    self.nonces.release(self.chain, &signer, nonce);
                    execution.transition(ExecutionStatus::Failed, now());
                    warn!(error = %e, "submission failed before broadcast");
                    return execution;
                }
            }

            execution.transition(ExecutionStatus::Submitted, now());
            execution.transition(ExecutionStatus::Pending, now());

            let tx_hash = execution.tx_hashes.last().cloned().unwrap_or_default();
            match tokio::time::timeout(self.cfg.execution_deadline, self.poll_until_mined(&tx_hash)).await {
                Ok(Ok(Some(receipt))) => {
                    self.nonces.settle(self.chain, &signer, nonce);
                    if receipt.status {
                        let realized = estimate_realized_profit(&receipt);
                        execution.settle_confirmed(realized, Decimal::from(receipt.gas_used) * gas_price, now());
                    } else {
                        let reason = self.submitter.replay_for_revert_reason(self.chain, &plan).await.unwrap_or_else(|_| "UNKNOWN".into());
                        execution.settle_reverted(Decimal::from(receipt.gas_used) * gas_price, reason, now());
                    }
                    return execution;
                }
                _ => {
                    if attempt >= self.cfg.max_replacements {
                        self.nonces.settle(self.chain, &signer, nonce);
                        execution.transition(ExecutionStatus::Failed, now());
                        warn!(attempt, "replacements exhausted, marking failed");
                        return execution;
                    }
                    attempt += 1;
                    execution.replacements += 1;
                    gas_price *= self.cfg.gas_bump_factor;
                    warn!(attempt, %nonce, "deadline exceeded, issuing cancel-replacement");
                }
            }
        }
    }

    async fn poll_until_mined(&self, tx_hash: &str) -> Result<Option<chain::TransactionReceipt>, ExecutionError> {
        loop {
            if let Some(receipt) = self.submitter.poll_receipt(self.chain, tx_hash).await? {
                return Ok(Some(receipt));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Sums net balance deltas from receipt logs (§4.F settlement). Real ERC-20
/// transfer-log decoding is out of scope here; this trusts the chain client
/// to have already normalized `data` into a decimal-string amount in the
/// first log entry, matching how `venues::VenueAdapter::build_swap` keeps
/// calldata opaque rather than ABI-encoded.
fn estimate_realized_profit(receipt: &chain::TransactionReceipt) -> Decimal {
    receipt.logs.first().and_then(|l| l.data.parse::<Decimal>().ok()).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chain::LogEntry;
    use core_model::ChainId;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    struct ScriptedSubmitter {
        submits: AtomicU32,
        receipt_after_attempts: u32,
        final_status: bool,
    }

    #[async_trait]
    impl Submitter for ScriptedSubmitter {
        async fn submit(&self, _chain: ChainId, _plan: &Plan, _nonce: u64, _gas_price: Decimal) -> Result<String, ExecutionError> {
            let n = self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(format!("tx-{n}"))
        }

        async fn poll_receipt(&self, _chain: ChainId, tx_hash: &str) -> Result<Option<chain::TransactionReceipt>, ExecutionError> {
            let attempt: u32 = tx_hash.trim_start_matches("tx-").parse().unwrap_or(0);
            if attempt + 1 < self.receipt_after_attempts {
                return Ok(None);
            }
            Ok(Some(chain::TransactionReceipt {
                tx_hash: tx_hash.to_string(),
                status: self.final_status,
                gas_used: 100_000,
                logs: vec![LogEntry { address: "0xpool".into(), topics: vec![], data: "12.5".into() }],
            }))
        }

        async fn replay_for_revert_reason(&self, _chain: ChainId, _plan: &Plan) -> Result<String, ExecutionError> {
            Ok("INSUFFICIENT_OUTPUT_AMOUNT".into())
        }
    }

    fn plan() -> Plan {
        Plan { calls: vec![], simulated_gas: 100_000, gas_limit: 120_000, flash_loan_provider: Some("aave".into()), flash_fee: dec!(0.1) }
    }

    fn worker(submitter: ScriptedSubmitter) -> ExecutorWorker<ScriptedSubmitter> {
        ExecutorWorker {
            chain: ChainId::Polygon,
            pair_id: "MATIC/USDT".into(),
            submitter: Arc::new(submitter),
            nonces: Arc::new(NonceAllocator::new()),
            global_permits: Arc::new(Semaphore::new(4)),
            cfg: ExecutorConfig { execution_deadline: Duration::from_millis(200), max_replacements: 2, gas_bump_factor: dec!(1.15) },
        }
    }

    #[tokio::test]
    async fn confirmed_receipt_settles_with_realized_profit() {
        let w = worker(ScriptedSubmitter { submits: AtomicU32::new(0), receipt_after_attempts: 1, final_status: true });
        let execution = Execution::new("e1", "o1", ChainId::Polygon, 0);
        let pending = PendingExecution { execution, plan: plan(), signer: "0xsigner".into(), base_gas_price: dec!(30) };
        let result = w.execute_one(pending).await;
        assert_eq!(result.status, ExecutionStatus::Confirmed);
        assert_eq!(result.realized_profit, Some(dec!(12.5)));
    }

    #[tokio::test]
    async fn reverted_receipt_settles_negative_gas_with_reason() {
        let w = worker(ScriptedSubmitter { submits: AtomicU32::new(0), receipt_after_attempts: 1, final_status: false });
        let execution = Execution::new("e1", "o1", ChainId::Polygon, 0);
        let pending = PendingExecution { execution, plan: plan(), signer: "0xsigner".into(), base_gas_price: dec!(30) };
        let result = w.execute_one(pending).await;
        assert_eq!(result.status, ExecutionStatus::Reverted);
        assert_eq!(result.revert_reason, Some("INSUFFICIENT_OUTPUT_AMOUNT".into()));
    }

    #[tokio::test]
    async fn nonce_is_released_when_submission_fails_before_broadcast() {
        struct AlwaysFails;
        #[async_trait]
        impl Submitter for AlwaysFails {
            async fn submit(&self, _chain: ChainId, _plan: &Plan, _nonce: u64, _gas_price: Decimal) -> Result<String, ExecutionError> {
                Err(ExecutionError::SubmissionFailed("rpc down".into()))
            }
            async fn poll_receipt(&self, _chain: ChainId, _tx_hash: &str) -> Result<Option<chain::TransactionReceipt>, ExecutionError> {
                unreachable!()
            }
            async fn replay_for_revert_reason(&self, _chain: ChainId, _plan: &Plan) -> Result<String, ExecutionError> {
                unreachable!()
            }
        }

        let nonces = Arc::new(NonceAllocator::new());
        let w = ExecutorWorker {
            chain: ChainId::Polygon,
            pair_id: "MATIC/USDT".into(),
            submitter: Arc::new(AlwaysFails),
            nonces: nonces.clone(),
            global_permits: Arc::new(Semaphore::new(4)),
            cfg: ExecutorConfig { execution_deadline: Duration::from_millis(50), max_replacements: 1, gas_bump_factor: dec!(1.1) },
        };
        let execution = Execution::new("e1", "o1", ChainId::Polygon, 0);
        let pending = PendingExecution { execution, plan: plan(), signer: "0xsigner".into(), base_gas_price: dec!(30) };
        let result = w.execute_one(pending).await;
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(!nonces.is_in_flight(ChainId::Polygon, "0xsigner", 0));
    }

    #[tokio::test]
    async fn confirmed_after_a_cancel_replacement_still_settles() {
        // receipt_after_attempts: 2 means the first broadcast's tx hash never
        // gets a receipt within the deadline, forcing one replacement before
        // the second broadcast's tx hash is mined.
        let w = worker(ScriptedSubmitter { submits: AtomicU32::new(0), receipt_after_attempts: 2, final_status: true });
        let execution = Execution::new("e1", "o1", ChainId::Polygon, 0);
        let pending = PendingExecution { execution, plan: plan(), signer: "0xsigner".into(), base_gas_price: dec!(30) };
        let result = w.execute_one(pending).await;
        assert_eq!(result.status, ExecutionStatus::Confirmed);
        assert_eq!(result.replacements, 1);
        assert!(result.ended_at_ms.is_some());
    }

    #[tokio::test]
    async fn sequential_queue_processes_one_at_a_time() {
        let (tx, rx) = mpsc::channel(4);
        let w = worker(ScriptedSubmitter { submits: AtomicU32::new(0), receipt_after_attempts: 1, final_status: true });
        let run_handle = tokio::spawn(w.run(rx));

        for i in 0..3 {
            let execution = Execution::new(format!("e{i}"), "o1", ChainId::Polygon, 0);
            tx.send(PendingExecution { execution, plan: plan(), signer: "0xsigner".into(), base_gas_price: dec!(30) }).await.unwrap();
        }
        drop(tx);
        run_handle.await.unwrap();
    }
}
