//! Time-bounded memoization of fetched price tables.

use crate::domain::basket::DateRange;
use crate::domain::price_table::PriceTable;
use crate::ports::clock_port::Clock;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub type CacheKey = (BTreeSet<String>, DateRange);

struct Entry {
    table: Arc<PriceTable>,
    stored_at: Instant,
}

/// Price tables keyed by `(symbols, range)`, each valid for `ttl` after it
/// was stored. Inserting over a live entry replaces it.
pub struct PriceCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl PriceCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<PriceTable>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                Some(Arc::clone(&entry.table))
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `table` under `key`, dropping every entry that has expired.
    pub fn insert(&self, key: CacheKey, table: PriceTable) -> Arc<PriceTable> {
        let table = Arc::new(table);
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| now.duration_since(e.stored_at) < self.ttl);
        entries.insert(
            key,
            Entry {
                table: Arc::clone(&table),
                stored_at: now,
            },
        );
        table
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock_port::ManualClock;
    use chrono::NaiveDate;

    fn key(symbols: &[&str]) -> CacheKey {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        (
            symbols.iter().map(|s| s.to_string()).collect(),
            DateRange::new(d(1), d(6)).unwrap(),
        )
    }

    fn table() -> PriceTable {
        let mut t = PriceTable::new();
        t.insert("A", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 10.0);
        t
    }

    #[test]
    fn hit_within_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = PriceCache::new(Duration::from_secs(3600), clock.clone());
        cache.insert(key(&["A"]), table());
        clock.advance(Duration::from_secs(3599));
        assert_eq!(cache.get(&key(&["A"])).as_deref(), Some(&table()));
    }

    #[test]
    fn miss_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = PriceCache::new(Duration::from_secs(3600), clock.clone());
        cache.insert(key(&["A"]), table());
        clock.advance(Duration::from_secs(3600));
        assert!(cache.get(&key(&["A"])).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_distinguish_symbol_sets() {
        let clock = Arc::new(ManualClock::new());
        let cache = PriceCache::new(Duration::from_secs(60), clock);
        cache.insert(key(&["A"]), table());
        assert!(cache.get(&key(&["A", "B"])).is_none());
        assert!(cache.get(&key(&["A"])).is_some());
    }

    #[test]
    fn reinsert_refreshes_entry() {
        let clock = Arc::new(ManualClock::new());
        let cache = PriceCache::new(Duration::from_secs(60), clock.clone());
        cache.insert(key(&["A"]), table());
        clock.advance(Duration::from_secs(50));
        cache.insert(key(&["A"]), table());
        clock.advance(Duration::from_secs(50));
        assert!(cache.get(&key(&["A"])).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_prunes_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let cache = PriceCache::new(Duration::from_secs(60), clock.clone());
        cache.insert(key(&["A"]), table());
        cache.insert(key(&["B"]), table());
        clock.advance(Duration::from_secs(30));
        cache.insert(key(&["C"]), table());
        clock.advance(Duration::from_secs(30));
        cache.insert(key(&["D"]), table());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(&["C"])).is_some());
        assert!(cache.get(&key(&["D"])).is_some());
    }
}
