use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::cache::{FetchStatus, QueryCache};
use super::key::{KeyFilter, QueryKey};
use crate::config::{ClientConfig, RetryConfig};
use crate::error::ClientError;
use crate::http_transport::HttpTransport;
use crate::invoke::Invoker;

/// Per-query behaviour. Defaults come from [`ClientConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// How long a fetched value is served without a new remote call.
    pub stale_time: Duration,
    pub retry: RetryConfig,
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched successfully and no error yet.
    Pending,
    Success,
    Error,
}

/// What a view needs to render a query: data, loading, error, staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub error: Option<ClientError>,
    pub updated_at: Option<DateTime<Utc>>,
}

struct Inner {
    invoker: Invoker,
    cache: QueryCache,
    config: ClientConfig,
}

/// Cached, keyed access to the typed API. Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new(invoker: Invoker, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                invoker,
                cache: QueryCache::new(),
                config,
            }),
        }
    }

    /// Client talking to the backend's HTTP bridge described by `config`.
    pub fn from_config(config: ClientConfig) -> Self {
        let transport = Arc::new(HttpTransport::from_config(&config));
        Self::new(Invoker::new(transport), config)
    }

    pub fn invoker(&self) -> &Invoker {
        &self.inner.invoker
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn default_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: self.inner.config.stale_time(),
            retry: self.inner.config.retry.clone(),
        }
    }

    /// Serve `key` from cache while fresh, otherwise fetch it through `fetcher`.
    ///
    /// A stale entry is refetched while the caller waits; its old value stays
    /// visible through [`query_state`](Self::query_state) until the new one lands.
    /// Use [`fetch_query_stale_while_revalidate`](Self::fetch_query_stale_while_revalidate)
    /// to get the old value back immediately instead.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(cached) = self.inner.cache.fresh_value(key, options.stale_time) {
            tracing::trace!(%key, "query served from cache");
            return decode(key, cached);
        }
        self.refetch(key, options, fetcher).await
    }

    /// Return the cached value of `key` right away, refetching in the background
    /// when it is stale. Waits for the backend only when nothing is cached yet.
    pub async fn fetch_query_stale_while_revalidate<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let Some(entry) = self.inner.cache.get(key) else {
            return self.refetch(key, options, fetcher).await;
        };
        let Some(cached) = entry.value.clone() else {
            return self.refetch(key, options, fetcher).await;
        };

        if !entry.is_fresh(options.stale_time) && entry.status != FetchStatus::Fetching {
            tracing::trace!(%key, "serving stale query, revalidating");
            let client = self.clone();
            let key = key.clone();
            let options = options.clone();
            tokio::spawn(async move {
                if let Err(e) = client.refetch(&key, &options, fetcher).await {
                    tracing::warn!(%key, error = %e, "background revalidation failed");
                }
            });
        }
        decode(key, cached)
    }

    /// Fetch `key` regardless of freshness and store the result.
    ///
    /// If a newer request for the same key was issued (or an optimistic patch
    /// landed) while this one was in flight, the result is returned to the
    /// caller but not written to the cache.
    pub async fn refetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let cache = &self.inner.cache;
        let ticket = cache.begin_fetch(key);
        let result = with_retry(&options.retry, &fetcher).await;

        match result {
            Ok(data) => match serde_json::to_value(&data) {
                Ok(value) => {
                    if !cache.complete_fetch(key, ticket, Ok(value)) {
                        tracing::debug!(%key, "discarded superseded query result");
                    }
                    Ok(data)
                }
                Err(e) => {
                    let err = ClientError::Encode(e.to_string());
                    cache.complete_fetch(key, ticket, Err(err.clone()));
                    Err(err)
                }
            },
            Err(e) => {
                cache.complete_fetch(key, ticket, Err(e.clone()));
                Err(e)
            }
        }
    }

    /// Current cached state of `key`, judged against the default stale time.
    pub fn query_state<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryState<T> {
        let stale_time = self.inner.config.stale_time();
        let Some(entry) = self.inner.cache.get(key) else {
            return QueryState {
                data: None,
                status: QueryStatus::Pending,
                is_fetching: false,
                is_stale: true,
                error: None,
                updated_at: None,
            };
        };

        let data = entry
            .value
            .clone()
            .and_then(|v| serde_json::from_value::<T>(v).ok());
        let status = if entry.error.is_some() {
            QueryStatus::Error
        } else if entry.value.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Pending
        };
        QueryState {
            data,
            status,
            is_fetching: entry.status == FetchStatus::Fetching,
            is_stale: !entry.is_fresh(stale_time),
            error: entry.error,
            updated_at: entry.updated_at,
        }
    }

    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        self.inner
            .cache
            .value(key)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Seed or overwrite a cache entry with an authoritative value.
    pub fn set_query_data<T: Serialize>(&self, key: &QueryKey, data: &T) -> Result<(), ClientError> {
        let value = serde_json::to_value(data).map_err(|e| ClientError::Encode(e.to_string()))?;
        self.inner.cache.populate(key, value);
        Ok(())
    }

    /// Mark matching entries stale so their next access refetches.
    pub fn invalidate(&self, filter: &KeyFilter) -> Vec<QueryKey> {
        let hit = self.inner.cache.invalidate(filter);
        if matches!(filter, KeyFilter::All) {
            tracing::info!(entries = hit.len(), "invalidated entire query cache");
        } else {
            tracing::debug!(?filter, entries = hit.len(), "invalidated queries");
        }
        hit
    }

    /// Refetch `key` every `interval` until the returned handle is dropped.
    /// The first fetch happens immediately.
    pub fn poll<T, F, Fut>(&self, key: QueryKey, interval: Duration, fetcher: F) -> PollHandle
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let client = self.clone();
        let options = self.default_options().retry(RetryConfig::none());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = client.refetch(&key, &options, &fetcher).await {
                    tracing::warn!(%key, error = %e, "polled query failed");
                }
            }
        });
        PollHandle { task }
    }
}

/// Stops its polling task when dropped.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn decode<T: DeserializeOwned>(key: &QueryKey, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode {
        command: key.to_string(),
        message: e.to_string(),
    })
}

/// Run `fetcher`, retrying retryable failures up to `retry.attempts` times.
async fn with_retry<T, F, Fut>(retry: &RetryConfig, fetcher: &F) -> Result<T, ClientError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < retry.attempts && e.is_retryable() => {
                let delay = retry.delay_for(attempt);
                tracing::debug!(attempt, ?delay, error = %e, "retrying query");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
