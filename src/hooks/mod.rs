//! Per-domain queries and mutations.
//!
//! Each submodule owns the cache key layout for its domain (`keys`) and the
//! invalidation set of every write. Views read through the query functions
//! here and render [`QueryClient::query_state`] for loading/error/stale flags.

pub mod ideas;
pub mod logs;
pub mod news;
pub mod settings;
pub mod storage;
pub mod tasks;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

use crate::error::ClientError;
use crate::query::{QueryClient, QueryKey};

/// Read `key` with the client's default options.
pub(crate) async fn cached<T, F, Fut>(
    client: &QueryClient,
    key: QueryKey,
    fetcher: F,
) -> Result<T, ClientError>
where
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    client
        .fetch_query(&key, &client.default_options(), fetcher)
        .await
}
