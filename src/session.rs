//! Per-conversation pending-request state.
//!
//! Holds the single URL awaiting a format decision for each chat. State is
//! in-memory and process-lifetime only: a restart silently drops all
//! pending requests, which the lifecycle treats as a recoverable
//! stale-choice condition rather than an error.

use moka::future::Cache;
use std::time::Duration;
use teloxide::types::ChatId;

/// Maximum number of conversations tracked at once.
const PENDING_MAX_CAPACITY: u64 = 10_000;
/// Time-to-live for a pending URL. An expired entry degrades to the same
/// "send the link again" path as a process restart.
const PENDING_TTL_SECS: u64 = 3600;

/// In-memory store of pending download requests, keyed by chat.
///
/// Last write wins: accepting a new URL silently replaces any prior
/// pending one for the same conversation; there is no queueing. The store
/// is safe under concurrent access from independent conversations.
#[derive(Clone)]
pub struct SessionStore {
    pending: Cache<ChatId, String>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let pending = Cache::builder()
            .max_capacity(PENDING_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(PENDING_TTL_SECS))
            .build();
        Self { pending }
    }

    /// Stores the pending URL for a chat, replacing any previous one.
    pub async fn put(&self, chat: ChatId, url: String) {
        self.pending.insert(chat, url).await;
    }

    /// Returns the pending URL for a chat, if any.
    pub async fn get(&self, chat: ChatId) -> Option<String> {
        self.pending.get(&chat).await
    }

    /// Removes the pending URL for a chat, if any.
    pub async fn clear(&self, chat: ChatId) {
        self.pending.invalidate(&chat).await;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = SessionStore::new();
        store.put(ChatId(1), "https://youtu.be/a".to_string()).await;
        assert_eq!(
            store.get(ChatId(1)).await,
            Some("https://youtu.be/a".to_string())
        );
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = SessionStore::new();
        store.put(ChatId(1), "https://youtu.be/first".to_string()).await;
        store.put(ChatId(1), "https://youtu.be/second".to_string()).await;

        // Only the second URL is retrievable; no queueing
        assert_eq!(
            store.get(ChatId(1)).await,
            Some("https://youtu.be/second".to_string())
        );
        store.clear(ChatId(1)).await;
        assert_eq!(store.get(ChatId(1)).await, None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = SessionStore::new();
        store.clear(ChatId(1)).await;
        store.put(ChatId(1), "https://youtu.be/a".to_string()).await;
        store.clear(ChatId(1)).await;
        store.clear(ChatId(1)).await;
        assert_eq!(store.get(ChatId(1)).await, None);
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let store = SessionStore::new();
        store.put(ChatId(1), "https://youtu.be/one".to_string()).await;
        store.put(ChatId(2), "https://youtu.be/two".to_string()).await;

        store.clear(ChatId(1)).await;
        assert_eq!(store.get(ChatId(1)).await, None);
        assert_eq!(
            store.get(ChatId(2)).await,
            Some("https://youtu.be/two".to_string())
        );
    }
}
