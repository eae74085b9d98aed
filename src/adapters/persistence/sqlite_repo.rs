//! SQLite-backed repository via libsql. Implements RepoPort.
//!
//! Two tables: `chats` keyed by chat_id and `messages` keyed by (chat_id, message_id).
//! Dates are unix seconds (UTC); `label` is NULL until the classifier answers.
//! All chats share one database file: data/warden.db
//!
//! Writes go through one async mutex; every connection also waits on a busy
//! database instead of failing with SQLITE_BUSY.

use crate::domain::{Chat, ChatType, DomainError, Label, LabelUpdate, Message};
use crate::ports::RepoPort;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use libsql::{Connection, Database, Row, Value, params};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// How long a connection waits for a lock held by another writer.
const BUSY_TIMEOUT_MS: u64 = 5000;

const CHATS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    chat_id INTEGER PRIMARY KEY,
    type TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT ''
)"#;

const MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    chat_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    user_full_name TEXT NOT NULL DEFAULT '',
    text TEXT NOT NULL DEFAULT '',
    date INTEGER NOT NULL,
    label INTEGER,
    PRIMARY KEY (chat_id, message_id)
)"#;
const MESSAGES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_chat_date ON messages (chat_id, date)";

const SELECT_MESSAGE_COLUMNS: &str =
    "SELECT chat_id, message_id, user_full_name, text, date, label FROM messages";

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

/// SQLite repository. One database file (warden.db) in the given base directory.
pub struct SqliteRepo {
    db: Database,
    write_lock: Mutex<()>,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL: the scheduler writes labels while
    /// the conversation flow reads reports.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("warden.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let repo = Self {
            db,
            write_lock: Mutex::new(()),
        };
        let conn = repo.conn().await?;

        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            run_pragma(&conn, pragma).await?;
        }

        for ddl in [CHATS_TABLE, MESSAGES_TABLE, MESSAGES_INDEX] {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(repo)
    }

    /// New connection with the busy timeout applied.
    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        run_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
        Ok(conn)
    }

    fn row_to_message(row: &Row) -> Result<Message, DomainError> {
        let chat_id: i64 = row.get(0).map_err(repo_err)?;
        let message_id: i64 = row.get(1).map_err(repo_err)?;
        let user_full_name: String = row.get(2).map_err(repo_err)?;
        let text: String = row.get(3).map_err(repo_err)?;
        let date: i64 = row.get(4).map_err(repo_err)?;
        let label = match row.get_value(5).map_err(repo_err)? {
            Value::Null => None,
            Value::Integer(v) => Some(v),
            other => {
                return Err(DomainError::Repo(format!(
                    "message {} in chat {}: unexpected label value {:?}",
                    message_id, chat_id, other
                )));
            }
        };
        let date = DateTime::<Utc>::from_timestamp(date, 0)
            .ok_or_else(|| DomainError::Repo(format!("invalid timestamp {}", date)))?;
        Ok(Message {
            message_id: message_id as u64,
            chat_id: chat_id as u64,
            user_full_name,
            text,
            date,
            label: Label::from_db(label),
        })
    }

    fn row_to_chat(row: &Row) -> Result<Chat, DomainError> {
        let chat_id: i64 = row.get(0).map_err(repo_err)?;
        let kind: String = row.get(1).map_err(repo_err)?;
        let title: String = row.get(2).map_err(repo_err)?;
        let kind = ChatType::parse(&kind)
            .ok_or_else(|| DomainError::Repo(format!("unknown chat type '{}'", kind)))?;
        Ok(Chat {
            id: chat_id as u64,
            title,
            kind,
        })
    }

    async fn query_messages(
        &self,
        chat_id: u64,
        from_ts: i64,
        to_ts: i64,
        inclusive_end: bool,
    ) -> Result<Vec<Message>, DomainError> {
        let conn = self.conn().await?;
        let end_op = if inclusive_end { "<=" } else { "<" };
        let sql = format!(
            "{} WHERE chat_id = ?1 AND date >= ?2 AND date {} ?3 ORDER BY date ASC, message_id ASC",
            SELECT_MESSAGE_COLUMNS, end_op
        );
        let mut rows = conn
            .query(&sql, params![chat_id as i64, from_ts, to_ts])
            .await
            .map_err(repo_err)?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            messages.push(Self::row_to_message(&row)?);
        }
        Ok(messages)
    }
}

/// PRAGMAs return a row; use query and drain it (execute fails when rows are returned).
async fn run_pragma(conn: &Connection, pragma: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(pragma, ())
        .await
        .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
    while rows.next().await.map_err(repo_err)?.is_some() {}
    Ok(())
}

#[async_trait::async_trait]
impl RepoPort for SqliteRepo {
    async fn put_message(&self, message: &Message) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO messages (chat_id, message_id, user_full_name, text, date, label)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (chat_id, message_id) DO NOTHING
            "#,
            params![
                message.chat_id as i64,
                message.message_id as i64,
                message.user_full_name.as_str(),
                message.text.as_str(),
                message.date.timestamp(),
                message.label.to_db()
            ],
        )
        .await
        .map_err(repo_err)?;
        debug!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            "message stored"
        );
        Ok(())
    }

    async fn update_labels(&self, updates: &[LabelUpdate]) -> Result<(), DomainError> {
        if updates.is_empty() {
            return Ok(());
        }
        let persist_err = |e: libsql::Error| DomainError::Persistence(e.to_string());
        let _guard = self.write_lock.lock().await;
        let conn = self
            .conn()
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        let tx = conn.transaction().await.map_err(persist_err)?;
        for u in updates {
            tx.execute(
                "UPDATE messages SET label = ?1 WHERE message_id = ?2 AND chat_id = ?3",
                params![u.label.to_db(), u.message_id as i64, u.chat_id as i64],
            )
            .await
            .map_err(|e| {
                DomainError::Persistence(format!(
                    "failed to update message ID {}: {}",
                    u.message_id, e
                ))
            })?;
        }
        tx.commit().await.map_err(persist_err)?;
        Ok(())
    }

    async fn get_messages_for_last_day(
        &self,
        chat_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, DomainError> {
        let since = now - Duration::days(1);
        self.query_messages(chat_id, since.timestamp(), now.timestamp(), true)
            .await
    }

    async fn save_chat_info(&self, chat: &Chat) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO chats (chat_id, type, title)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (chat_id) DO UPDATE SET
                type = excluded.type,
                title = excluded.title
            "#,
            params![chat.id as i64, chat.kind.as_str(), chat.title.as_str()],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn get_group_chats(&self) -> Result<Vec<Chat>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT chat_id, type, title FROM chats WHERE type IN ('group', 'supergroup') ORDER BY chat_id",
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut chats = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            chats.push(Self::row_to_chat(&row)?);
        }
        Ok(chats)
    }

    async fn get_messages_by_chat_and_day(
        &self,
        chat_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<Message>, DomainError> {
        let start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DomainError::Repo(format!("invalid date {}", date)))?
            .and_utc();
        let end = start + Duration::days(1);
        self.query_messages(chat_id, start.timestamp(), end.timestamp(), false)
            .await
    }

    async fn get_chat_info(&self, chat_id: u64) -> Result<Option<Chat>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT chat_id, type, title FROM chats WHERE chat_id = ?1",
                params![chat_id as i64],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::row_to_chat(&row)?)),
            None => Ok(None),
        }
    }
}
