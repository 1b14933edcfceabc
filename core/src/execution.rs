use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// One call in an ordered flash-loan-wrapped bundle (§4.E/§4.F). `value` is
/// denominated in the chain's native unit, as a decimal string-equivalent
/// amount rather than wei, matching the fixed-point convention used
/// everywhere else in the model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Call {
    pub to: String,
    pub data: String,
    pub value: Decimal,
}

/// A simulated, ready-to-submit bundle produced by the planner. `gas_limit`
/// is fixed at simulated gas x1.2 per §4.E before the bundle is handed to the
/// executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub calls: Vec<Call>,
    pub simulated_gas: u64,
    pub gas_limit: u64,
    pub flash_loan_provider: Option<String>,
    pub flash_fee: Decimal,
}

/// Execution lifecycle state (§4.F). Transitions are one-directional except
/// for the cancel-replace loop, which re-enters `Submitted` from `Pending`
/// without changing `status` itself - the executor tracks replacement count
/// separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    New,
    Planned,
    Simulated,
    Submitted,
    Pending,
    Confirmed,
    Reverted,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Confirmed
                | ExecutionStatus::Reverted
                | ExecutionStatus::Failed
                | ExecutionStatus::Cancelled
        )
    }

    /// Whether `self -> next` is a legal transition. Enforced at the single
    /// call site that mutates `Execution::status` so the state machine can't
    /// be driven out of band.
    pub fn can_transition(self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (New, Planned)
                | (Planned, Simulated)
                | (Simulated, Submitted)
                | (Submitted, Pending)
                | (Submitted, Failed)
                | (Pending, Confirmed)
                | (Pending, Reverted)
                | (Pending, Submitted) // cancel-replace resubmission
                | (Pending, Failed) // replacements exhausted
                | (Pending, Cancelled)
                | (Submitted, Cancelled)
        )
    }
}

/// An attempt to realize one opportunity on chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub opportunity_id: String,
    pub chain: ChainId,

    pub plan: Option<Plan>,
    pub nonce: Option<u64>,
    pub tx_hashes: Vec<String>,
    pub replacements: u32,

    pub status: ExecutionStatus,
    pub realized_profit: Option<Decimal>,
    pub gas_paid: Option<Decimal>,
    pub revert_reason: Option<String>,

    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
}

impl Execution {
    pub fn new(id: impl Into<String>, opportunity_id: impl Into<String>, chain: ChainId, started_at_ms: u64) -> Self {
        Self {
            id: id.into(),
            opportunity_id: opportunity_id.into(),
            chain,
            plan: None,
            nonce: None,
            tx_hashes: Vec::new(),
            replacements: 0,
            status: ExecutionStatus::New,
            realized_profit: None,
            gas_paid: None,
            revert_reason: None,
            started_at_ms,
            ended_at_ms: None,
        }
    }

    /// Applies a transition, returning `false` (and leaving state untouched)
    /// if it is illegal from the current status.
    pub fn transition(&mut self, next: ExecutionStatus, now_ms: u64) -> bool {
        if !self.status.can_transition(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.ended_at_ms = Some(now_ms);
        }
        true
    }

    /// Settlement per §4.F: realized profit comes from receipt logs on
    /// confirmation, or is the negative of gas spent on revert.
    pub fn settle_confirmed(&mut self, realized_profit: Decimal, gas_paid: Decimal, now_ms: u64) -> bool {
        if !self.transition(ExecutionStatus::Confirmed, now_ms) {
            return false;
        }
        self.realized_profit = Some(realized_profit);
        self.gas_paid = Some(gas_paid);
        true
    }

    pub fn settle_reverted(&mut self, gas_paid: Decimal, reason: impl Into<String>, now_ms: u64) -> bool {
        if !self.transition(ExecutionStatus::Reverted, now_ms) {
            return false;
        }
        self.realized_profit = Some(-gas_paid);
        self.gas_paid = Some(gas_paid);
        self.revert_reason = Some(reason.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn legal_transitions_follow_the_happy_path() {
        let mut e = Execution::new("e1", "o1", ChainId::Polygon, 0);
        assert!(e.transition(ExecutionStatus::Planned, 1));
        assert!(e.transition(ExecutionStatus::Simulated, 2));
        assert!(e.transition(ExecutionStatus::Submitted, 3));
        assert!(e.transition(ExecutionStatus::Pending, 4));
        assert!(e.transition(ExecutionStatus::Confirmed, 5));
        assert!(e.status.is_terminal());
        assert_eq!(e.ended_at_ms, Some(5));
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut e = Execution::new("e1", "o1", ChainId::Polygon, 0);
        assert!(!e.transition(ExecutionStatus::Confirmed, 1));
        assert_eq!(e.status, ExecutionStatus::New);
    }

    #[test]
    fn cancel_replace_reenters_submitted_from_pending() {
        let mut e = Execution::new("e1", "o1", ChainId::Polygon, 0);
        e.transition(ExecutionStatus::Planned, 1);
        e.transition(ExecutionStatus::Simulated, 1);
        e.transition(ExecutionStatus::Submitted, 1);
        e.transition(ExecutionStatus::Pending, 1);
        assert!(e.transition(ExecutionStatus::Submitted, 2));
        e.replacements += 1;
        assert_eq!(e.replacements, 1);
    }

    #[test]
    fn pending_can_fail_once_replacements_are_exhausted() {
        let mut e = Execution::new("e1", "o1", ChainId::Polygon, 0);
        e.transition(ExecutionStatus::Planned, 1);
        e.transition(ExecutionStatus::Simulated, 1);
        e.transition(ExecutionStatus::Submitted, 1);
        e.transition(ExecutionStatus::Pending, 1);
        assert!(e.transition(ExecutionStatus::Failed, 2));
        assert!(e.status.is_terminal());
        assert_eq!(e.ended_at_ms, Some(2));
    }

    #[test]
    fn reverted_settlement_is_negative_gas() {
        let mut e = Execution::new("e1", "o1", ChainId::Polygon, 0);
        e.transition(ExecutionStatus::Planned, 1);
        e.transition(ExecutionStatus::Simulated, 1);
        e.transition(ExecutionStatus::Submitted, 1);
        e.transition(ExecutionStatus::Pending, 1);
        assert!(e.settle_reverted(dec!(4.20), "INSUFFICIENT_OUTPUT_AMOUNT", 9));
        assert_eq!(e.realized_profit, Some(dec!(-4.20)));
        assert!(e.status.is_terminal());
    }
}
