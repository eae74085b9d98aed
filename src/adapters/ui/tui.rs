//! Implements InputPort. Inquire-based console transport for a local operator.
//!
//! Plays the role of the bot's private chat: `/report` becomes a date prompt,
//! the chat keyboard becomes a Select, and replies go through TgGateway.

use crate::adapters::persistence::import_jsonl;
use crate::domain::DomainError;
use crate::ports::{InputPort, TgGateway};
use crate::usecases::{ClassificationService, ConversationService};
use async_trait::async_trait;
use inquire::{InquireError, Select, Text};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

const MENU_REPORT: &str = "Request report";
const MENU_CLASSIFY: &str = "Run classification cycle now";
const MENU_IMPORT: &str = "Import messages (JSONL)";
const MENU_HELP: &str = "Help";
const MENU_QUIT: &str = "Quit";

/// The operator's private chat with the bot.
const OPERATOR_CHAT_ID: i64 = 0;

fn prompt_err(e: InquireError) -> DomainError {
    DomainError::Gateway(format!("prompt failed: {}", e))
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// User-facing reply for an error: its message for input/data errors, a generic line otherwise.
pub fn reply_for_error(e: &DomainError) -> String {
    if e.is_user_facing() {
        e.to_string()
    } else {
        error!(error = %e, "request failed");
        format!("Something went wrong: {}", e)
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    operator_id: u64,
    gateway: Arc<dyn TgGateway>,
    conversation: Arc<ConversationService>,
    classification: Arc<ClassificationService>,
    shutdown: watch::Receiver<bool>,
}

impl TuiInputPort {
    pub fn new(
        operator_id: u64,
        gateway: Arc<dyn TgGateway>,
        conversation: Arc<ConversationService>,
        classification: Arc<ClassificationService>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            operator_id,
            gateway,
            conversation,
            classification,
            shutdown,
        }
    }

    async fn reply(&self, text: &str) -> Result<(), DomainError> {
        self.gateway.send_message(OPERATOR_CHAT_ID, text).await
    }

    async fn report_flow(&self) -> Result<(), DomainError> {
        let args = match Text::new("Report date (YYYY-MM-DD, empty = previous day):").prompt() {
            Ok(s) => s,
            Err(e) if is_cancel(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };

        let prompt = match self
            .conversation
            .request_report(self.operator_id, &args)
            .await
        {
            Ok(p) => p,
            Err(e) => return self.reply(&reply_for_error(&e)).await,
        };

        let selected = match Select::new(
            &format!("Select a chat (report for {}):", prompt.date),
            prompt.options,
        )
        .prompt()
        {
            Ok(s) => s,
            Err(e) if is_cancel(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };

        match self
            .conversation
            .select_chat(self.operator_id, &selected)
            .await
        {
            Ok(Some(report)) => self.reply(&report).await,
            Ok(None) => Ok(()),
            Err(e) => self.reply(&reply_for_error(&e)).await,
        }
    }

    async fn classify_now(&self) -> Result<(), DomainError> {
        match self.classification.run_cycle(&self.shutdown).await {
            Ok(stats) => {
                self.reply(&format!(
                    "Classification cycle: {} chats, {} classified, {} empty, {} failed, {} messages labeled",
                    stats.chats,
                    stats.classified,
                    stats.skipped,
                    stats.failed,
                    stats.messages_updated
                ))
                .await
            }
            Err(e) => self.reply(&reply_for_error(&e)).await,
        }
    }

    async fn import_flow(&self) -> Result<(), DomainError> {
        let path = match Text::new("Path to JSONL export:").prompt() {
            Ok(s) => s,
            Err(e) if is_cancel(&e) => return Ok(()),
            Err(e) => return Err(prompt_err(e)),
        };
        match import_jsonl(path.trim(), &self.conversation).await {
            Ok(stats) => {
                self.reply(&format!(
                    "Imported {} messages ({} from non-group chats ignored, {} lines skipped)",
                    stats.ingested, stats.ignored, stats.skipped
                ))
                .await
            }
            Err(e) => self.reply(&reply_for_error(&e)).await,
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let options = vec![MENU_REPORT, MENU_CLASSIFY, MENU_IMPORT, MENU_HELP, MENU_QUIT];
            let choice = match Select::new("Warden bot", options).prompt() {
                Ok(c) => c,
                Err(e) if is_cancel(&e) => return Ok(()),
                Err(e) => return Err(prompt_err(e)),
            };

            match choice {
                MENU_REPORT => self.report_flow().await?,
                MENU_CLASSIFY => self.classify_now().await?,
                MENU_IMPORT => self.import_flow().await?,
                MENU_HELP => self.reply(self.conversation.help_text()).await?,
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_reply_for_user_facing_error() {
        let e = DomainError::NoDataForPeriod {
            chat_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        assert_eq!(reply_for_error(&e), "no messages in chat 1 on 2024-03-05");
    }

    #[test]
    fn test_reply_for_internal_error() {
        let e = DomainError::Repo("locked".into());
        assert!(reply_for_error(&e).starts_with("Something went wrong"));
    }
}
