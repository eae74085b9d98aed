//! Implements ConversationStatePort in memory.
//!
//! Tracks the pending report date per user between `/report` and the chat
//! selection reply. Process lifetime only, no expiry.

use crate::ports::ConversationStatePort;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// State: user_id -> pending report date. One mutex for the whole map; one entry per active user.
#[derive(Debug, Default)]
pub struct InMemoryConversationState {
    pending: Mutex<HashMap<u64, NaiveDate>>,
}

impl InMemoryConversationState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ConversationStatePort for InMemoryConversationState {
    async fn set_pending(&self, user_id: u64, date: NaiveDate) {
        self.pending.lock().await.insert(user_id, date);
    }

    async fn get_pending(&self, user_id: u64) -> Option<NaiveDate> {
        self.pending.lock().await.get(&user_id).copied()
    }

    async fn clear_pending(&self, user_id: u64) {
        self.pending.lock().await.remove(&user_id);
    }

    async fn take_pending(&self, user_id: u64) -> Option<NaiveDate> {
        self.pending.lock().await.remove(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let state = InMemoryConversationState::new();
        state.set_pending(1, d(3)).await;
        assert_eq!(state.get_pending(1).await, Some(d(3)));
        assert_eq!(state.get_pending(2).await, None);
    }

    #[tokio::test]
    async fn test_second_set_overwrites() {
        let state = InMemoryConversationState::new();
        state.set_pending(1, d(3)).await;
        state.set_pending(1, d(4)).await;
        assert_eq!(state.get_pending(1).await, Some(d(4)));
    }

    #[tokio::test]
    async fn test_clear_then_get_not_found() {
        let state = InMemoryConversationState::new();
        state.set_pending(1, d(3)).await;
        state.clear_pending(1).await;
        assert_eq!(state.get_pending(1).await, None);
        // clearing again is a no-op
        state.clear_pending(1).await;
    }

    #[tokio::test]
    async fn test_take_consumes_once() {
        let state = InMemoryConversationState::new();
        state.set_pending(1, d(3)).await;
        assert_eq!(state.take_pending(1).await, Some(d(3)));
        assert_eq!(state.take_pending(1).await, None);
    }
}
