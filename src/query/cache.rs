//! Client-side query cache store.
//!
//! Values are held as JSON so a rollback snapshot compares bit-for-bit with
//! what was there before. Writers are limited to the query client (fetch
//! completion) and the mutation helpers (optimistic patch, rollback,
//! invalidation).

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use super::key::{KeyFilter, QueryKey};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching,
}

/// One cached query result plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Option<Value>,
    /// When `value` last came from a successful fetch.
    pub fetched_at: Option<Instant>,
    pub updated_at: Option<DateTime<Utc>>,
    pub status: FetchStatus,
    pub error: Option<ClientError>,
    /// Set by invalidation; cleared by the next fetch issued after it.
    pub stale: bool,
    /// Newest request ticket handed out for this key.
    latest_ticket: u64,
    /// Tickets up to this one were issued before the last invalidation.
    invalidated_through: u64,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            updated_at: None,
            status: FetchStatus::Idle,
            error: None,
            stale: false,
            latest_ticket: 0,
            invalidated_through: 0,
        }
    }
}

impl CacheEntry {
    /// Fresh means: has a value, not invalidated, fetched within `stale_time`.
    pub fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.stale
            && self.value.is_some()
            && self
                .fetched_at
                .is_some_and(|at| at.elapsed() < stale_time)
    }
}

/// Proof that a fetch was issued; only the newest ticket per key may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Pre-mutation state of one key, restored verbatim on rollback.
#[derive(Debug, Clone)]
pub struct Snapshot {
    key: QueryKey,
    entry: Option<CacheEntry>,
}

impl Snapshot {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn value(&self) -> Option<&Value> {
        self.entry.as_ref().and_then(|e| e.value.as_ref())
    }
}

#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn value(&self, key: &QueryKey) -> Option<Value> {
        self.entries.get(key).and_then(|e| e.value.clone())
    }

    /// The cached value if it is still fresh.
    pub fn fresh_value(&self, key: &QueryKey, stale_time: Duration) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|e| e.is_fresh(stale_time))
            .and_then(|e| e.value.clone())
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a fetch for `key`. Any earlier in-flight ticket is superseded.
    pub(crate) fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let mut entry = self.entries.entry(key.clone()).or_default();
        entry.latest_ticket += 1;
        entry.status = FetchStatus::Fetching;
        FetchTicket(entry.latest_ticket)
    }

    /// Apply a fetch result if `ticket` is still the newest for `key`.
    /// Returns `false` when the result was superseded and discarded.
    pub(crate) fn complete_fetch(
        &self,
        key: &QueryKey,
        ticket: FetchTicket,
        result: Result<Value, ClientError>,
    ) -> bool {
        let Some(mut entry) = self.entries.get_mut(key) else {
            // Evicted while in flight
            return false;
        };
        if entry.latest_ticket != ticket.0 {
            return false;
        }
        entry.status = FetchStatus::Idle;
        match result {
            Ok(value) => {
                entry.value = Some(value);
                entry.fetched_at = Some(Instant::now());
                entry.updated_at = Some(Utc::now());
                entry.error = None;
                // A response requested before an invalidation is already outdated
                entry.stale = ticket.0 <= entry.invalidated_through;
            }
            Err(e) => {
                // Keep the last good value on screen
                entry.error = Some(e);
            }
        }
        true
    }

    /// Write a value as if it had just been fetched. Supersedes in-flight fetches.
    pub fn populate(&self, key: &QueryKey, value: Value) {
        let mut entry = self.entries.entry(key.clone()).or_default();
        entry.latest_ticket += 1;
        entry.value = Some(value);
        entry.fetched_at = Some(Instant::now());
        entry.updated_at = Some(Utc::now());
        entry.status = FetchStatus::Idle;
        entry.error = None;
        entry.stale = false;
    }

    /// Capture the current state of `key` for a later [`restore`](Self::restore).
    pub(crate) fn snapshot(&self, key: &QueryKey) -> Snapshot {
        Snapshot {
            key: key.clone(),
            entry: self.get(key),
        }
    }

    /// Speculatively replace the value of `key`. Freshness bookkeeping is left
    /// alone so the next real fetch still happens on schedule; in-flight fetches
    /// issued before the patch are superseded.
    pub(crate) fn write_optimistic(&self, key: &QueryKey, value: Value) {
        let mut entry = self.entries.entry(key.clone()).or_default();
        entry.latest_ticket += 1;
        entry.value = Some(value);
        entry.status = FetchStatus::Idle;
    }

    /// Put a key back exactly as captured. A key that did not exist is removed.
    pub(crate) fn restore(&self, snapshot: Snapshot) {
        match snapshot.entry {
            Some(saved) => {
                let mut entry = self.entries.entry(snapshot.key).or_default();
                // Ticket keeps counting up so pre-rollback fetches stay superseded
                let ticket = entry.latest_ticket + 1;
                *entry = saved;
                entry.latest_ticket = ticket;
                entry.status = FetchStatus::Idle;
            }
            None => {
                self.entries.remove(&snapshot.key);
            }
        }
    }

    /// Mark matching entries stale. Returns the affected keys.
    ///
    /// Fetches already in flight still land their value, but the entry stays
    /// stale so the next access asks the backend again.
    pub fn invalidate(&self, filter: &KeyFilter) -> Vec<QueryKey> {
        let mut hit = Vec::new();
        for mut entry in self.entries.iter_mut() {
            if filter.matches(entry.key()) {
                entry.stale = true;
                entry.invalidated_through = entry.latest_ticket;
                hit.push(entry.key().clone());
            }
        }
        hit.sort();
        hit
    }

    /// Drop matching entries. Returns how many were removed.
    pub fn evict(&self, filter: &KeyFilter) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| !filter.matches(k));
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(name: &str) -> QueryKey {
        QueryKey::new([name])
    }

    #[test]
    fn populate_makes_value_fresh() {
        let cache = QueryCache::new();
        cache.populate(&key("ideas"), json!([1, 2]));
        assert_eq!(
            cache.fresh_value(&key("ideas"), Duration::from_secs(60)),
            Some(json!([1, 2]))
        );
        assert_eq!(cache.fresh_value(&key("ideas"), Duration::ZERO), None);
    }

    #[test]
    fn superseded_fetch_is_discarded() {
        let cache = QueryCache::new();
        let k = key("ideas");
        let first = cache.begin_fetch(&k);
        let second = cache.begin_fetch(&k);

        assert!(cache.complete_fetch(&k, second, Ok(json!("new"))));
        assert!(!cache.complete_fetch(&k, first, Ok(json!("old"))));
        assert_eq!(cache.value(&k), Some(json!("new")));
    }

    #[test]
    fn failed_fetch_keeps_last_good_value() {
        let cache = QueryCache::new();
        let k = key("settings");
        cache.populate(&k, json!({"theme": "dark"}));

        let ticket = cache.begin_fetch(&k);
        assert!(cache.complete_fetch(&k, ticket, Err(ClientError::backend("locked"))));

        let entry = cache.get(&k).unwrap();
        assert_eq!(entry.value, Some(json!({"theme": "dark"})));
        assert_eq!(entry.error, Some(ClientError::backend("locked")));
        assert_eq!(entry.status, FetchStatus::Idle);
    }

    #[test]
    fn optimistic_write_supersedes_in_flight_fetch() {
        let cache = QueryCache::new();
        let k = key("draft");
        let ticket = cache.begin_fetch(&k);
        cache.write_optimistic(&k, json!("typed"));
        assert!(!cache.complete_fetch(&k, ticket, Ok(json!("server"))));
        assert_eq!(cache.value(&k), Some(json!("typed")));
    }

    #[test]
    fn restore_puts_back_exact_value_or_removes_new_key() {
        let cache = QueryCache::new();
        let existing = key("a");
        let fresh = key("b");
        cache.populate(&existing, json!({"n": 1.5, "s": "x"}));

        let snap_a = cache.snapshot(&existing);
        let snap_b = cache.snapshot(&fresh);
        cache.write_optimistic(&existing, json!({"n": 2}));
        cache.write_optimistic(&fresh, json!(true));

        cache.restore(snap_a);
        cache.restore(snap_b);
        assert_eq!(cache.value(&existing), Some(json!({"n": 1.5, "s": "x"})));
        assert!(cache.get(&fresh).is_none());
    }

    #[test]
    fn invalidate_marks_matching_entries_stale() {
        let cache = QueryCache::new();
        cache.populate(&QueryKey::new(["news", "sources"]), json!([]));
        cache.populate(&QueryKey::new(["news", "articles"]).with_params(&json!({})), json!([]));
        cache.populate(&key("ideas"), json!([]));

        let hit = cache.invalidate(&KeyFilter::prefix(["news"]));
        assert_eq!(hit.len(), 2);
        assert!(cache.get(&key("ideas")).is_some_and(|e| !e.stale));
        assert!(
            cache
                .fresh_value(&QueryKey::new(["news", "sources"]), Duration::from_secs(60))
                .is_none()
        );
    }

    #[test]
    fn fetch_issued_before_invalidation_lands_but_stays_stale() {
        let cache = QueryCache::new();
        let k = QueryKey::new(["news", "sources"]);
        let before = cache.begin_fetch(&k);
        cache.invalidate(&KeyFilter::prefix(["news"]));

        assert!(cache.complete_fetch(&k, before, Ok(json!("pre-write"))));
        let entry = cache.get(&k).unwrap();
        assert_eq!(entry.value, Some(json!("pre-write")));
        assert_eq!(entry.status, FetchStatus::Idle);
        assert!(entry.stale);

        let after = cache.begin_fetch(&k);
        assert!(cache.complete_fetch(&k, after, Ok(json!("post-write"))));
        assert!(!cache.get(&k).unwrap().stale);
    }

    #[test]
    fn evict_removes_entries() {
        let cache = QueryCache::new();
        cache.populate(&key("a"), json!(1));
        cache.populate(&key("b"), json!(2));
        assert_eq!(cache.evict(&KeyFilter::Exact(key("a"))), 1);
        assert_eq!(cache.keys(), vec![key("b")]);
        assert_eq!(cache.evict(&KeyFilter::All), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn completion_after_eviction_is_dropped() {
        let cache = QueryCache::new();
        let k = key("logs");
        let ticket = cache.begin_fetch(&k);
        cache.evict(&KeyFilter::All);
        assert!(!cache.complete_fetch(&k, ticket, Ok(json!([]))));
        assert!(cache.is_empty());
    }
}
