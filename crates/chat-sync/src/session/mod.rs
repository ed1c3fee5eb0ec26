//! Session credential lifecycle and its durable mirror.

mod storage;
mod store;

pub use storage::{FileStorage, MemoryStorage};
pub use store::{SessionEvent, SessionStore, TOKEN_KEY};
