pub mod cache;
pub mod client;
pub mod error;
pub mod links;
pub mod mutation;
pub mod push;
pub mod session;
pub mod traits;
pub mod types;

pub use cache::{CacheKey, Queries, QueryCache, ResourceKind};
pub use client::{ApiClient, ClientConfig};
pub use error::{ChatError, Result};
pub use links::{LinkKind, Span};
pub use mutation::{MutationCoordinator, ReactionBoard, ReactionKey};
pub use push::{ChannelEvent, ConnectionManager, ConnectionState, Phase, PushConfig};
pub use session::{SessionEvent, SessionStore};
pub use types::{Session, UserProfile};
