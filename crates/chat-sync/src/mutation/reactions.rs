//! Client-local emoji reactions.
//!
//! Nothing here reaches the server or the cache; reactions are lost when the
//! board is dropped.

use crate::types::Message;
use std::collections::{BTreeMap, BTreeSet};

/// Identifies a message by creation time and author name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReactionKey {
    pub created_at: String,
    pub author: String,
}

impl ReactionKey {
    pub fn new(created_at: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            created_at: created_at.into(),
            author: author.into(),
        }
    }

    pub fn for_message(message: &Message) -> Self {
        Self::new(message.created_at.clone(), message.user.username.clone())
    }
}

/// One emoji and the users who picked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: String,
    pub users: BTreeSet<String>,
}

impl Reaction {
    pub fn count(&self) -> usize {
        self.users.len()
    }
}

#[derive(Debug, Default)]
pub struct ReactionBoard {
    messages: BTreeMap<ReactionKey, BTreeMap<String, BTreeSet<String>>>,
}

impl ReactionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `user`'s `emoji` on a message. Returns true if it was added.
    ///
    /// A user holds at most one reaction per message: picking another emoji
    /// moves it, picking the same one again removes it.
    pub fn toggle(&mut self, key: &ReactionKey, emoji: &str, user: &str) -> bool {
        let emojis = self.messages.entry(key.clone()).or_default();
        let had = emojis.get(emoji).is_some_and(|users| users.contains(user));

        for users in emojis.values_mut() {
            users.remove(user);
        }
        emojis.retain(|_, users| !users.is_empty());

        if !had {
            emojis
                .entry(emoji.to_string())
                .or_default()
                .insert(user.to_string());
        }
        if emojis.is_empty() {
            self.messages.remove(key);
        }
        !had
    }

    /// Reactions of one message, ordered by emoji.
    pub fn reactions(&self, key: &ReactionKey) -> Vec<Reaction> {
        self.messages
            .get(key)
            .map(|emojis| {
                emojis
                    .iter()
                    .map(|(emoji, users)| Reaction {
                        emoji: emoji.clone(),
                        users: users.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_reacted(&self, key: &ReactionKey, emoji: &str, user: &str) -> bool {
        self.messages
            .get(key)
            .and_then(|emojis| emojis.get(emoji))
            .is_some_and(|users| users.contains(user))
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ReactionKey {
        ReactionKey::new("2024-01-01T00:00:00Z", "alice")
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut board = ReactionBoard::new();
        assert!(board.toggle(&key(), "👍", "bob"));
        assert!(board.has_reacted(&key(), "👍", "bob"));
        assert!(!board.toggle(&key(), "👍", "bob"));
        assert!(board.reactions(&key()).is_empty());
        assert!(board.is_empty());
    }

    #[test]
    fn test_other_emoji_moves_the_reaction() {
        let mut board = ReactionBoard::new();
        assert!(board.toggle(&key(), "👍", "bob"));
        assert!(board.toggle(&key(), "🎉", "bob"));

        let reactions = board.reactions(&key());
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].emoji, "🎉");
        assert!(!board.has_reacted(&key(), "👍", "bob"));
    }

    #[test]
    fn test_counts_per_emoji() {
        let mut board = ReactionBoard::new();
        board.toggle(&key(), "👍", "bob");
        board.toggle(&key(), "👍", "carol");
        board.toggle(&key(), "🎉", "dave");

        let reactions = board.reactions(&key());
        assert_eq!(reactions.len(), 2);
        let thumbs = reactions.iter().find(|r| r.emoji == "👍").unwrap();
        assert_eq!(thumbs.count(), 2);

        board.toggle(&key(), "🎉", "carol");
        let reactions = board.reactions(&key());
        let thumbs = reactions.iter().find(|r| r.emoji == "👍").unwrap();
        let party = reactions.iter().find(|r| r.emoji == "🎉").unwrap();
        assert_eq!(thumbs.count(), 1);
        assert_eq!(party.count(), 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut board = ReactionBoard::new();
        let other = ReactionKey::new("2024-01-01T00:00:00Z", "bob");
        board.toggle(&key(), "👍", "bob");
        assert!(board.reactions(&other).is_empty());
    }
}
