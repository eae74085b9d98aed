//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Chat, DomainError, LabelUpdate, Message};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Repository port. Durable storage of chats, messages and labels.
#[async_trait::async_trait]
pub trait RepoPort: Send + Sync {
    /// Store a newly ingested message. Re-delivery of the same (message_id, chat_id) is ignored.
    async fn put_message(&self, message: &Message) -> Result<(), DomainError>;

    /// Overwrite labels, keyed by (message_id, chat_id). Unknown keys are ignored.
    /// A failing write aborts the remaining updates of the call.
    async fn update_labels(&self, updates: &[LabelUpdate]) -> Result<(), DomainError>;

    /// Messages of a chat with `now - 24h <= date <= now`, ascending by date.
    async fn get_messages_for_last_day(
        &self,
        chat_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, DomainError>;

    /// Upsert chat info. Re-insert refreshes title and kind; never a duplicate-key error.
    async fn save_chat_info(&self, chat: &Chat) -> Result<(), DomainError>;

    /// All chats of kind group or supergroup.
    async fn get_group_chats(&self) -> Result<Vec<Chat>, DomainError>;

    /// Messages of a chat whose UTC calendar day equals `date`, ascending by date.
    async fn get_messages_by_chat_and_day(
        &self,
        chat_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<Message>, DomainError>;

    async fn get_chat_info(&self, chat_id: u64) -> Result<Option<Chat>, DomainError>;
}

/// One message of a classification batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub message_id: u64,
    pub text: String,
    pub chat_id: u64,
}

/// One classifier verdict. `label` is the raw wire value (0 unproductive, 1 productive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMessage {
    pub message_id: u64,
    #[serde(default)]
    pub text: String,
    pub label: u32,
    pub chat_id: u64,
}

/// External message classifier.
#[async_trait::async_trait]
pub trait ClassifierPort: Send + Sync {
    /// Classify one batch in a single call. Responses may cover only part of the batch.
    async fn classify(
        &self,
        batch: &[ClassifyRequest],
    ) -> Result<Vec<ClassifiedMessage>, DomainError>;
}

/// Chat transport gateway (bot API). Only what the core needs.
#[async_trait::async_trait]
pub trait TgGateway: Send + Sync {
    /// User ids of the administrators of a (group) chat.
    async fn get_chat_admin_ids(&self, chat_id: u64) -> Result<Vec<u64>, DomainError>;

    /// Deliver a text block to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DomainError>;
}

/// Conversation state port. Pending report date per requesting user.
#[async_trait::async_trait]
pub trait ConversationStatePort: Send + Sync {
    /// Overwrites any pending date of the user.
    async fn set_pending(&self, user_id: u64, date: NaiveDate);

    async fn get_pending(&self, user_id: u64) -> Option<NaiveDate>;

    /// No-op when nothing is pending.
    async fn clear_pending(&self, user_id: u64);

    /// Read and remove in one step.
    async fn take_pending(&self, user_id: u64) -> Option<NaiveDate>;
}
