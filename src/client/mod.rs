//! Typed client for the HTTP API, with read-through caching for the list
//! endpoints.

mod api;
pub mod cache;
mod resource;

pub use api::{ApiClient, ClientError};
pub use cache::{CacheStore, FileCacheStore, MemoryCacheStore};
pub use resource::{Resource, ResourceState};
