//! Writes with cache consistency, and local reactions.

mod coordinator;
mod reactions;

pub use coordinator::{validate_content, MutationCoordinator};
pub use reactions::{Reaction, ReactionBoard, ReactionKey};
