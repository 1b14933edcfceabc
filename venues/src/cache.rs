use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use core_model::Quote;

/// Per-pool quote cache keyed by `(pool_address, block_number)`, TTL = 1
/// block (§4.B). Bounded by `max_entries`; once full, the oldest-inserted
/// entry not matching the current block is evicted first, same cold-before-
/// warm eviction order as the teacher's session cache, simplified for a
/// single-key TTL instead of a deficit-ranked ring.
pub struct QuoteCache {
    max_entries: usize,
    entries: Mutex<HashMap<String, (u64, Quote)>>,
}

impl QuoteCache {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries: max_entries.max(1), entries: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, pool_address: &str, block_number: u64) -> Option<Quote> {
        let entries = self.entries.lock();
        entries.get(pool_address).and_then(|(b, q)| if *b == block_number { Some(q.clone()) } else { None })
    }

    pub fn insert(&self, pool_address: String, block_number: u64, quote: Quote) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_entries && !entries.contains_key(&pool_address) {
            if let Some(stale_key) = entries.iter().find(|(_, (b, _))| *b != block_number).map(|(k, _)| k.clone()) {
                entries.remove(&stale_key);
                debug!(evicted = %stale_key, "quote cache evicted stale entry");
            } else if let Some(any_key) = entries.keys().next().cloned() {
                entries.remove(&any_key);
            }
        }
        entries.insert(pool_address, (block_number, quote));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
