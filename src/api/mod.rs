//! HTTP plumbing for the message source providers: a reqwest-backed client
//! with bounded retries and a TTL cache (memory-first, optional disk mirror).

mod cache;
mod client;

pub use cache::CacheStore;
pub use client::{ApiClient, FetchError, Fetched, RetryPolicy};
