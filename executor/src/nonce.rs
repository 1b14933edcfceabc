use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use core_model::ChainId;

use crate::error::ExecutionError;

/// Per-(chain, signer) nonce state: the next nonce to hand out, and the set
/// of nonces currently held by an execution in {Simulated, Submitted,
/// Pending}. A nonce is never reused while it's in that set (§5 ordering
/// guarantees); `release` returns an unbroadcast nonce to the pool instead
/// of burning it.
#[derive(Default)]
struct SignerState {
    next: u64,
    in_flight: HashSet<u64>,
}

/// Monotonic nonce allocator keyed by (chain, signer address), grounded on
/// the bounded-allocation shape of `SizingPolicy`-driven chunking: a single
/// mutex-guarded map handing out the next safe value rather than trusting
/// the node's own nonce suggestion, which can race under concurrent
/// executions for the same signer.
pub struct NonceAllocator {
    signers: Mutex<HashMap<(ChainId, String), SignerState>>,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self { signers: Mutex::new(HashMap::new()) }
    }

    pub fn seed(&self, chain: ChainId, signer: &str, starting_nonce: u64) {
        let mut g = self.signers.lock();
        let state = g.entry((chain, signer.to_string())).or_default();
        if state.next < starting_nonce {
            state.next = starting_nonce;
        }
    }

    /// Reserves the next nonce for (chain, signer), marking it in-flight.
    pub fn allocate(&self, chain: ChainId, signer: &str) -> Result<u64, ExecutionError> {
        let mut g = self.signers.lock();
        let state = g.entry((chain, signer.to_string())).or_default();
        let nonce = state.next;
        state.next += 1;
        state.in_flight.insert(nonce);
        Ok(nonce)
    }

    /// Frees a nonce that was allocated but never broadcast, per §5
    /// cancellation rules: the slot returns to the pool rather than leaving
    /// a permanent gap.
    pub fn release(&self, chain: ChainId, signer: &str, nonce: u64) {
        let mut g = self.signers.lock();
        if let Some(state) = g.get_mut(&(chain, signer.to_string())) {
            state.in_flight.remove(&nonce);
            if nonce + 1 == state.next {
                state.next = nonce;
            }
        }
    }

    /// Marks a nonce terminal (confirmed, reverted, or failed past
    /// replacement bounds): it stays consumed and is never reissued.
    pub fn settle(&self, chain: ChainId, signer: &str, nonce: u64) {
        let mut g = self.signers.lock();
        if let Some(state) = g.get_mut(&(chain, signer.to_string())) {
            state.in_flight.remove(&nonce);
        }
    }

    pub fn is_in_flight(&self, chain: ChainId, signer: &str, nonce: u64) -> bool {
        self.signers.lock().get(&(chain, signer.to_string())).map(|s| s.in_flight.contains(&nonce)).unwrap_or(false)
    }
}

impl Default for NonceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_strictly_increasing_nonces_per_signer() {
        let alloc = NonceAllocator::new();
        let a = alloc.allocate(ChainId::Polygon, "0xabc").unwrap();
        let b = alloc.allocate(ChainId::Polygon, "0xabc").unwrap();
        assert_eq!((a, b), (0, 1));
    }

    #[test]
    fn different_signers_have_independent_sequences() {
        let alloc = NonceAllocator::new();
        alloc.allocate(ChainId::Polygon, "0xabc").unwrap();
        let first_for_other = alloc.allocate(ChainId::Polygon, "0xdef").unwrap();
        assert_eq!(first_for_other, 0);
    }

    #[test]
    fn release_of_last_allocated_nonce_returns_it_to_the_pool() {
        let alloc = NonceAllocator::new();
        let n = alloc.allocate(ChainId::Polygon, "0xabc").unwrap();
        alloc.release(ChainId::Polygon, "0xabc", n);
        let reused = alloc.allocate(ChainId::Polygon, "0xabc").unwrap();
        assert_eq!(reused, n);
    }

    #[test]
    fn settle_marks_nonce_no_longer_in_flight() {
        let alloc = NonceAllocator::new();
        let n = alloc.allocate(ChainId::Polygon, "0xabc").unwrap();
        assert!(alloc.is_in_flight(ChainId::Polygon, "0xabc", n));
        alloc.settle(ChainId::Polygon, "0xabc", n);
        assert!(!alloc.is_in_flight(ChainId::Polygon, "0xabc", n));
    }

    #[test]
    fn seed_raises_the_starting_point_without_lowering_it() {
        let alloc = NonceAllocator::new();
        alloc.seed(ChainId::Polygon, "0xabc", 42);
        assert_eq!(alloc.allocate(ChainId::Polygon, "0xabc").unwrap(), 42);
        alloc.seed(ChainId::Polygon, "0xabc", 10);
        assert_eq!(alloc.allocate(ChainId::Polygon, "0xabc").unwrap(), 43);
    }
}
