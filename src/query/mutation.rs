//! Writes: run a command, then invalidate what it could have changed.
//!
//! An optional optimistic update is applied to the cache before the call is
//! sent and rolled back verbatim if the call fails.

use serde_json::Value;
use std::future::Future;

use super::cache::{QueryCache, Snapshot};
use super::client::QueryClient;
use super::key::{KeyFilter, QueryKey};
use crate::error::ClientError;

type KeyPatch = Box<dyn Fn(Option<&Value>) -> Option<Value> + Send + Sync>;
type ValuePatch = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

enum PatchStep {
    /// Patch one key, whether or not it is cached yet.
    Key(QueryKey, KeyPatch),
    /// Patch every cached key matching the filter.
    Matching(KeyFilter, ValuePatch),
}

/// Anticipated cache contents after a mutation succeeds.
///
/// Patch closures return `None` to leave a key untouched.
#[derive(Default)]
pub struct OptimisticUpdate {
    steps: Vec<PatchStep>,
}

impl OptimisticUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of `key` outright.
    pub fn set(self, key: QueryKey, value: Value) -> Self {
        self.update(key, move |_| Some(value.clone()))
    }

    /// Derive the new value of `key` from its current one (`None` if not cached).
    pub fn update<F>(mut self, key: QueryKey, patch: F) -> Self
    where
        F: Fn(Option<&Value>) -> Option<Value> + Send + Sync + 'static,
    {
        self.steps.push(PatchStep::Key(key, Box::new(patch)));
        self
    }

    /// Rewrite every cached entry matching `filter`.
    pub fn update_matching<F>(mut self, filter: KeyFilter, patch: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.steps.push(PatchStep::Matching(filter, Box::new(patch)));
        self
    }

    /// Apply every step, capturing a snapshot of each key right before it is written.
    pub(crate) fn apply(&self, cache: &QueryCache) -> Rollback {
        let mut snapshots = Vec::new();
        for step in &self.steps {
            match step {
                PatchStep::Key(key, patch) => {
                    let current = cache.value(key);
                    if let Some(next) = patch(current.as_ref()) {
                        snapshots.push(cache.snapshot(key));
                        cache.write_optimistic(key, next);
                    }
                }
                PatchStep::Matching(filter, patch) => {
                    for key in cache.keys().into_iter().filter(|k| filter.matches(k)) {
                        let Some(current) = cache.value(&key) else {
                            continue;
                        };
                        if let Some(next) = patch(&current) {
                            snapshots.push(cache.snapshot(&key));
                            cache.write_optimistic(&key, next);
                        }
                    }
                }
            }
        }
        Rollback { snapshots }
    }
}

/// Snapshots taken by one optimistic update.
pub(crate) struct Rollback {
    snapshots: Vec<Snapshot>,
}

impl Rollback {
    pub(crate) fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.snapshots.iter().map(|s| s.key())
    }

    /// Restore in reverse order so a key patched twice ends at its first snapshot.
    pub(crate) fn restore(self, cache: &QueryCache) {
        for snapshot in self.snapshots.into_iter().rev() {
            cache.restore(snapshot);
        }
    }
}

/// Which entries a successful mutation makes stale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Invalidate {
    #[default]
    Nothing,
    Keys(Vec<KeyFilter>),
    /// Arbitrary data may have changed (restore, import).
    All,
}

/// Declarative description of one write.
pub struct Mutation {
    name: &'static str,
    optimistic: Option<OptimisticUpdate>,
    invalidate: Invalidate,
}

impl Mutation {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            optimistic: None,
            invalidate: Invalidate::Nothing,
        }
    }

    pub fn optimistic(mut self, update: OptimisticUpdate) -> Self {
        self.optimistic = Some(update);
        self
    }

    pub fn invalidates(mut self, filter: KeyFilter) -> Self {
        match &mut self.invalidate {
            Invalidate::All => {}
            Invalidate::Keys(filters) => filters.push(filter),
            Invalidate::Nothing => self.invalidate = Invalidate::Keys(vec![filter]),
        }
        self
    }

    pub fn invalidates_all(mut self) -> Self {
        self.invalidate = Invalidate::All;
        self
    }

    pub fn invalidation(&self) -> &Invalidate {
        &self.invalidate
    }

    /// Apply the optimistic patch, await `call`, then invalidate or roll back.
    ///
    /// `call` is not polled until after the patch is in place.
    pub async fn run<T, Fut>(self, client: &QueryClient, call: Fut) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let cache = client.cache();
        let rollback = self.optimistic.as_ref().map(|u| u.apply(cache));

        match call.await {
            Ok(result) => {
                match &self.invalidate {
                    Invalidate::Nothing => {}
                    Invalidate::Keys(filters) => {
                        for filter in filters {
                            client.invalidate(filter);
                        }
                    }
                    Invalidate::All => {
                        client.invalidate(&KeyFilter::All);
                    }
                }
                tracing::debug!(mutation = self.name, "mutation succeeded");
                Ok(result)
            }
            Err(e) => {
                if let Some(rollback) = rollback {
                    let keys: Vec<String> = rollback.keys().map(ToString::to_string).collect();
                    rollback.restore(cache);
                    tracing::warn!(mutation = self.name, error = %e, ?keys, "mutation failed, optimistic update rolled back");
                } else {
                    tracing::warn!(mutation = self.name, error = %e, "mutation failed");
                }
                Err(e)
            }
        }
    }
}
