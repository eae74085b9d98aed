//! Domain entities. Pure data structures for the core business.
//!
//! No transport/storage types here; adapters map into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat observed by the bot (group, supergroup, private dialog or channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ChatType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    /// Group and supergroup chats are the only ones whose messages are stored and classified.
    pub fn is_group(self) -> bool {
        matches!(self, ChatType::Group | ChatType::Supergroup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::Private => "private",
            ChatType::Group => "group",
            ChatType::Supergroup => "supergroup",
            ChatType::Channel => "channel",
        }
    }

    /// Parse the stored/transport representation. Unknown kinds map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "private" => Some(ChatType::Private),
            "group" => Some(ChatType::Group),
            "supergroup" => Some(ChatType::Supergroup),
            "channel" => Some(ChatType::Channel),
            _ => None,
        }
    }
}

/// Classification status of a message.
///
/// Freshly ingested messages are `Unclassified` until the classifier answers;
/// the classifier only ever produces `Unproductive` (wire 0) or `Productive` (wire 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Unclassified,
    Unproductive,
    Productive,
}

impl Label {
    /// Map a classifier label. Values other than 0 and 1 are not labels.
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(Label::Unproductive),
            1 => Some(Label::Productive),
            _ => None,
        }
    }

    /// Storage representation: NULL while unclassified.
    pub fn to_db(self) -> Option<i64> {
        match self {
            Label::Unclassified => None,
            Label::Unproductive => Some(0),
            Label::Productive => Some(1),
        }
    }

    pub fn from_db(value: Option<i64>) -> Self {
        match value {
            Some(0) => Label::Unproductive,
            Some(1) => Label::Productive,
            _ => Label::Unclassified,
        }
    }
}

/// A stored group-chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: u64,
    pub chat_id: u64,
    pub user_full_name: String,
    /// Text with newlines collapsed to spaces.
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub label: Label,
}

/// Label write produced by a classification cycle. Keyed by (message_id, chat_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelUpdate {
    pub message_id: u64,
    pub chat_id: u64,
    pub label: Label,
}

/// Inbound message event as delivered by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: u64,
    pub chat_id: i64,
    #[serde(default)]
    pub chat_title: String,
    #[serde(rename = "chat_type")]
    pub chat_kind: ChatType,
    pub from_user_id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub text: String,
    /// Unix seconds.
    pub date: i64,
}

impl IncomingMessage {
    /// Transport chat ids for groups are negative; storage keys use the absolute value.
    pub fn normalized_chat_id(&self) -> u64 {
        self.chat_id.unsigned_abs()
    }

    pub fn author(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Collapse line breaks to single spaces (message text is stored on one line).
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_wire_mapping() {
        assert_eq!(Label::from_wire(0), Some(Label::Unproductive));
        assert_eq!(Label::from_wire(1), Some(Label::Productive));
        assert_eq!(Label::from_wire(7), None);
    }

    #[test]
    fn test_label_db_mapping_keeps_unclassified_distinct() {
        assert_eq!(Label::Unclassified.to_db(), None);
        assert_eq!(Label::from_db(None), Label::Unclassified);
        assert_eq!(Label::from_db(Some(0)), Label::Unproductive);
        assert_eq!(Label::from_db(Some(1)), Label::Productive);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("a\nb\r\nc"), "a b c");
        assert_eq!(normalize_text("plain"), "plain");
    }

    #[test]
    fn test_incoming_message_identity() {
        let msg = IncomingMessage {
            message_id: 5,
            chat_id: -1001,
            chat_title: "Team".into(),
            chat_kind: ChatType::Supergroup,
            from_user_id: 9,
            first_name: "Ann".into(),
            last_name: String::new(),
            text: "hi".into(),
            date: 0,
        };
        assert_eq!(msg.normalized_chat_id(), 1001);
        assert_eq!(msg.author(), "Ann");
        assert!(msg.chat_kind.is_group());
        assert!(!ChatType::Private.is_group());
    }
}
