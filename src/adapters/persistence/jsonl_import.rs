//! JSONL ingestion source. One `IncomingMessage` JSON object per line.
//!
//! Stands in for the bot transport when replaying exported chat logs:
//! every line is fed to the conversation service exactly like a live update.

use crate::domain::{DomainError, IncomingMessage};
use crate::usecases::ConversationService;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Result of one import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Group messages stored.
    pub ingested: usize,
    /// Well-formed events from non-group chats (chat info only).
    pub ignored: usize,
    /// Malformed lines or failed writes.
    pub skipped: usize,
}

/// Read `path` line by line and ingest each message. Bad lines are logged and skipped.
pub async fn import_jsonl(
    path: impl AsRef<Path>,
    conversation: &ConversationService,
) -> Result<ImportStats, DomainError> {
    let path = path.as_ref();
    let file = fs::File::open(path)
        .await
        .map_err(|e| DomainError::Repo(format!("open {}: {}", path.display(), e)))?;
    let mut lines = BufReader::new(file).lines();
    let mut stats = ImportStats::default();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.map_err(|e| DomainError::Repo(e.to_string()))? {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<IncomingMessage>(trimmed) {
            Ok(event) => match conversation.ingest(&event).await {
                Ok(true) => stats.ingested += 1,
                Ok(false) => stats.ignored += 1,
                Err(e) => {
                    warn!(line = line_no, error = %e, "failed to ingest message");
                    stats.skipped += 1;
                }
            },
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed JSONL line");
                stats.skipped += 1;
            }
        }
    }

    info!(
        path = %path.display(),
        ingested = stats.ingested,
        ignored = stats.ignored,
        skipped = stats.skipped,
        "JSONL import complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::{InMemoryConversationState, MemoryRepo};
    use crate::domain::DomainError;
    use crate::ports::{RepoPort, TgGateway};
    use std::sync::Arc;

    struct NoAdmins;

    #[async_trait::async_trait]
    impl TgGateway for NoAdmins {
        async fn get_chat_admin_ids(&self, _chat_id: u64) -> Result<Vec<u64>, DomainError> {
            Ok(Vec::new())
        }

        async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_import_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.jsonl");
        let lines = [
            r#"{"message_id":1,"chat_id":-100,"chat_title":"Dev","chat_type":"supergroup","from_user_id":5,"first_name":"Bo","text":"hi\nall","date":1709632800}"#,
            "",
            "not json",
            r#"{"message_id":2,"chat_id":5,"chat_type":"private","from_user_id":5,"text":"/help","date":1709632800}"#,
        ];
        tokio::fs::write(&path, lines.join("\n")).await.unwrap();

        let repo = Arc::new(MemoryRepo::new());
        let conversation = ConversationService::new(
            repo.clone(),
            Arc::new(NoAdmins),
            Arc::new(InMemoryConversationState::new()),
        );

        let stats = import_jsonl(&path, &conversation).await.unwrap();

        assert_eq!(
            stats,
            ImportStats {
                ingested: 1,
                ignored: 1,
                skipped: 1
            }
        );
        let chats = repo.get_group_chats().await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, 100);
        assert_eq!(chats[0].title, "Dev");
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let conversation = ConversationService::new(
            Arc::new(MemoryRepo::new()),
            Arc::new(NoAdmins),
            Arc::new(InMemoryConversationState::new()),
        );
        let err = import_jsonl("/nonexistent/warden.jsonl", &conversation)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Repo(_)));
    }
}
