use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::Breakdown;

/// Cache key for one ranking's breakdown.
pub fn cache_key(ranking_id: i64) -> String {
    format!("score_breakdown:{ranking_id}")
}

/// Object cache the aggregator stores computed breakdowns in. Entries never
/// expire; a shared backend may race on `set`, last writer wins.
pub trait BreakdownCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<Breakdown>>;
    fn set(&self, key: &str, value: Arc<Breakdown>);
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Arc<Breakdown>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BreakdownCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Arc<Breakdown>> {
        // insert never leaves the map half-written, so a poisoned lock is still readable
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: Arc<Breakdown>) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value);
    }
}
