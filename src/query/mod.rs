//! Client-side request cache on top of the typed API.

pub mod cache;
pub mod client;
pub mod debounce;
pub mod key;
pub mod mutation;

pub use cache::{CacheEntry, FetchStatus, QueryCache, Snapshot};
pub use client::{PollHandle, QueryClient, QueryOptions, QueryState, QueryStatus};
pub use debounce::{Debounced, SaveStatus};
pub use key::{KeyFilter, QueryKey};
pub use mutation::{Invalidate, Mutation, OptimisticUpdate};
