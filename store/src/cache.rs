use std::time::Duration;

use parking_lot::Mutex;

use core_model::Opportunity;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::StatsSnapshot;

struct Slot<T> {
    value: T,
    written_at_ms: u64,
}

/// Short-TTL read-through cache fronting the hot telemetry views (§4.H):
/// current opportunities, current gas price per chain, and the latest
/// aggregated stats snapshot. Unlike `backend/src/session/cache.rs`'s
/// capacity-bounded RR/DRR eviction (sized for millions of sessions), this
/// cache holds a handful of entries and is invalidated by staleness or by an
/// explicit `invalidate_*` call fired on any execution state transition.
pub struct LiveViewCache {
    ttl_ms: u64,
    opportunities: Mutex<Option<Slot<Vec<Opportunity>>>>,
    gas_prices: Mutex<std::collections::HashMap<core_model::ChainId, Slot<Decimal>>>,
    stats: Mutex<Option<Slot<StatsSnapshot>>>,
}

impl LiveViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: ttl.as_millis() as u64,
            opportunities: Mutex::new(None),
            gas_prices: Mutex::new(std::collections::HashMap::new()),
            stats: Mutex::new(None),
        }
    }

    fn fresh<T>(&self, slot: &Option<Slot<T>>, now_ms: u64) -> bool {
        slot.as_ref().is_some_and(|s| now_ms.saturating_sub(s.written_at_ms) <= self.ttl_ms)
    }

    pub fn get_opportunities(&self, now_ms: u64) -> Option<Vec<Opportunity>> {
        let guard = self.opportunities.lock();
        self.fresh(&guard, now_ms).then(|| guard.as_ref().unwrap().value.clone())
    }

    pub fn put_opportunities(&self, value: Vec<Opportunity>, now_ms: u64) {
        *self.opportunities.lock() = Some(Slot { value, written_at_ms: now_ms });
    }

    pub fn invalidate_opportunities(&self) {
        debug!("live view cache: opportunities invalidated");
        *self.opportunities.lock() = None;
    }

    pub fn get_gas_price(&self, chain: core_model::ChainId, now_ms: u64) -> Option<Decimal> {
        let guard = self.gas_prices.lock();
        guard.get(&chain).filter(|s| now_ms.saturating_sub(s.written_at_ms) <= self.ttl_ms).map(|s| s.value)
    }

    pub fn put_gas_price(&self, chain: core_model::ChainId, value: Decimal, now_ms: u64) {
        self.gas_prices.lock().insert(chain, Slot { value, written_at_ms: now_ms });
    }

    pub fn get_stats(&self, now_ms: u64) -> Option<StatsSnapshot> {
        let guard = self.stats.lock();
        self.fresh(&guard, now_ms).then(|| guard.as_ref().unwrap().value.clone())
    }

    pub fn put_stats(&self, value: StatsSnapshot, now_ms: u64) {
        *self.stats.lock() = Some(Slot { value, written_at_ms: now_ms });
    }

    /// Fired whenever an `Execution` transitions state: the stats snapshot
    /// (win rate, P&L) and the opportunity list both depend on execution
    /// outcomes, so both go stale immediately rather than waiting out the TTL.
    pub fn invalidate_on_execution_transition(&self) {
        *self.stats.lock() = None;
        *self.opportunities.lock() = None;
    }
}
