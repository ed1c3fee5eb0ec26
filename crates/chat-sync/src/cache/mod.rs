//! Query cache shared by readers and the mutation coordinator.

mod queries;
mod store;

pub use queries::Queries;
pub use store::{CacheEntry, CacheKey, QueryCache, ResourceKind};
