use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use core_model::Opportunity;

/// The live opportunity map (§3 Ownership, §9): the scanner is its sole
/// writer; every other component reads consistent snapshots. Mirrors
/// `MarketViewStore`'s `Arc<RwLock<HashMap<..>>>` shape, keyed by
/// `Opportunity::id` instead of pair id.
#[derive(Clone, Default)]
pub struct LiveOpportunityMap {
    inner: Arc<RwLock<HashMap<String, Opportunity>>>,
}

impl LiveOpportunityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by stable id (§4.C step 8): replaces the prior entry in place.
    /// The trend ring buffer on `opp` is expected to already carry the prior
    /// entry's window forward — `scan_tick` does this from a snapshot of this
    /// map taken before the tick runs.
    pub async fn upsert(&self, opp: Opportunity) {
        let mut g = self.inner.write().await;
        g.insert(opp.id.clone(), opp);
    }

    pub async fn get(&self, id: &str) -> Option<Opportunity> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn retire(&self, id: &str) -> Option<Opportunity> {
        self.inner.write().await.remove(id)
    }

    pub async fn snapshot(&self) -> Vec<Opportunity> {
        self.inner.read().await.values().cloned().collect()
    }

    pub async fn retire_stale(&self, now_ms: u64, ttl_ms: u64) -> Vec<String> {
        let mut g = self.inner.write().await;
        let stale: Vec<String> = g.iter().filter(|(_, o)| o.is_stale(now_ms, ttl_ms)).map(|(id, _)| id.clone()).collect();
        for id in &stale {
            g.remove(id);
        }
        stale
    }
}
