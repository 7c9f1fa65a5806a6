//! Typed client for the Cockpit desktop backend.
//!
//! Three layers, leaves first: the command [`invoke`] adapter, one typed
//! [`api`] module per domain, and the [`query`] cache with per-domain
//! [`hooks`] that know which keys each write invalidates.

pub mod api;
pub mod config;
pub mod error;
pub mod hooks;
pub mod http_transport;
pub mod invoke;
pub mod logging;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind};
pub use http_transport::HttpTransport;
pub use invoke::{Invoker, Transport};
pub use query::{KeyFilter, Mutation, OptimisticUpdate, QueryClient, QueryKey, QueryOptions};
