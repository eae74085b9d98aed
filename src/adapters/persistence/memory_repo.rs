//! In-memory RepoPort. Used by tests and by `WARDEN_STORAGE=memory` runs.
//!
//! Same semantics as the SQLite repository; nothing survives a restart.

use crate::domain::{Chat, DomainError, LabelUpdate, Message};
use crate::ports::RepoPort;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    chats: BTreeMap<u64, Chat>,
    /// Keyed by (chat_id, message_id).
    messages: BTreeMap<(u64, u64), Message>,
}

/// In-memory repository guarded by one RwLock.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    tables: RwLock<Tables>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    async fn messages_where(
        &self,
        chat_id: u64,
        keep: impl Fn(&Message) -> bool,
    ) -> Vec<Message> {
        let tables = self.tables.read().await;
        let mut out: Vec<Message> = tables
            .messages
            .range((chat_id, 0)..=(chat_id, u64::MAX))
            .map(|(_, m)| m)
            .filter(|m| keep(m))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then(a.message_id.cmp(&b.message_id)));
        out
    }
}

#[async_trait::async_trait]
impl RepoPort for MemoryRepo {
    async fn put_message(&self, message: &Message) -> Result<(), DomainError> {
        self.tables
            .write()
            .await
            .messages
            .entry((message.chat_id, message.message_id))
            .or_insert_with(|| message.clone());
        Ok(())
    }

    async fn update_labels(&self, updates: &[LabelUpdate]) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        for u in updates {
            if let Some(m) = tables.messages.get_mut(&(u.chat_id, u.message_id)) {
                m.label = u.label;
            }
        }
        Ok(())
    }

    async fn get_messages_for_last_day(
        &self,
        chat_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, DomainError> {
        let since = now - Duration::days(1);
        Ok(self
            .messages_where(chat_id, |m| m.date >= since && m.date <= now)
            .await)
    }

    async fn save_chat_info(&self, chat: &Chat) -> Result<(), DomainError> {
        self.tables.write().await.chats.insert(chat.id, chat.clone());
        Ok(())
    }

    async fn get_group_chats(&self) -> Result<Vec<Chat>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .chats
            .values()
            .filter(|c| c.kind.is_group())
            .cloned()
            .collect())
    }

    async fn get_messages_by_chat_and_day(
        &self,
        chat_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<Message>, DomainError> {
        Ok(self
            .messages_where(chat_id, |m| m.date.date_naive() == date)
            .await)
    }

    async fn get_chat_info(&self, chat_id: u64) -> Result<Option<Chat>, DomainError> {
        Ok(self.tables.read().await.chats.get(&chat_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatType, Label};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_memory_repo_matches_repo_contract() {
        let repo = MemoryRepo::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap();
        repo.save_chat_info(&Chat {
            id: 1,
            title: "Ops".into(),
            kind: ChatType::Group,
        })
        .await
        .unwrap();
        repo.save_chat_info(&Chat {
            id: 1,
            title: "Ops team".into(),
            kind: ChatType::Group,
        })
        .await
        .unwrap();

        for (id, hours_ago) in [(1u64, 2i64), (2, 26), (3, 1)] {
            repo.put_message(&Message {
                message_id: id,
                chat_id: 1,
                user_full_name: "U".into(),
                text: "t".into(),
                date: now - Duration::hours(hours_ago),
                label: Label::Unclassified,
            })
            .await
            .unwrap();
        }

        let recent = repo.get_messages_for_last_day(1, now).await.unwrap();
        assert_eq!(
            recent.iter().map(|m| m.message_id).collect::<Vec<_>>(),
            vec![1, 3]
        );

        repo.update_labels(&[LabelUpdate {
            message_id: 3,
            chat_id: 1,
            label: Label::Productive,
        }])
        .await
        .unwrap();
        let day = repo
            .get_messages_by_chat_and_day(1, now.date_naive())
            .await
            .unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[1].label, Label::Productive);
        assert_eq!(repo.get_chat_info(1).await.unwrap().unwrap().title, "Ops team");
        assert_eq!(repo.get_group_chats().await.unwrap().len(), 1);
    }
}
