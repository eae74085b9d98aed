//! Conversation flow driven by inbound transport events.
//!
//! - Group messages are stored (unclassified) and chat info is refreshed
//! - `/report [YYYY-MM-DD]` records a pending date and offers the user's admin chats
//! - The reply `"<chat_id>:<title>"` consumes the pending date and yields the rendered report

use crate::domain::{Chat, DomainError, IncomingMessage, Label, Message, normalize_text};
use crate::ports::{ConversationStatePort, RepoPort, TgGateway};
use crate::usecases::report_renderer::render_report;
use crate::usecases::report_service::ReportService;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

const HELP_TEXT: &str = "Available commands:\n\n\
    /report [YYYY-MM-DD] - build a productivity report (default: previous day)\n\
    /help - show this help";

/// A started report request: the date that is now pending and the chats to choose from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPrompt {
    pub date: NaiveDate,
    /// `"<chat_id>:<title>"`, one per selectable chat.
    pub options: Vec<String>,
}

pub struct ConversationService {
    repo: Arc<dyn RepoPort>,
    gateway: Arc<dyn TgGateway>,
    state: Arc<dyn ConversationStatePort>,
    reports: ReportService,
}

impl ConversationService {
    pub fn new(
        repo: Arc<dyn RepoPort>,
        gateway: Arc<dyn TgGateway>,
        state: Arc<dyn ConversationStatePort>,
    ) -> Self {
        let reports = ReportService::new(Arc::clone(&repo));
        Self {
            repo,
            gateway,
            state,
            reports,
        }
    }

    pub fn help_text(&self) -> &'static str {
        HELP_TEXT
    }

    /// Handle one inbound message. Returns true when the message was stored.
    ///
    /// Chat info is refreshed for every chat (failures only logged); only
    /// group/supergroup messages are stored.
    pub async fn ingest(&self, event: &IncomingMessage) -> Result<bool, DomainError> {
        let chat = Chat {
            id: event.normalized_chat_id(),
            title: event.chat_title.clone(),
            kind: event.chat_kind,
        };
        if let Err(e) = self.repo.save_chat_info(&chat).await {
            warn!(chat_id = chat.id, error = %e, "failed to save chat info");
        }

        if !chat.kind.is_group() {
            return Ok(false);
        }

        let date = DateTime::<Utc>::from_timestamp(event.date, 0)
            .ok_or(DomainError::InvalidTimestamp(event.date))?;
        let message = Message {
            message_id: event.message_id,
            chat_id: chat.id,
            user_full_name: event.author(),
            text: normalize_text(&event.text),
            date,
            label: Label::Unclassified,
        };
        self.repo.put_message(&message).await?;
        debug!(chat_id = chat.id, message_id = message.message_id, "message ingested");
        Ok(true)
    }

    /// Group chats administered by `user_id`. A chat whose admin lookup fails is skipped.
    pub async fn admin_chats(&self, user_id: u64) -> Result<Vec<Chat>, DomainError> {
        let group_chats = self.repo.get_group_chats().await?;
        let mut admin_chats = Vec::new();
        for chat in group_chats {
            match self.gateway.get_chat_admin_ids(chat.id).await {
                Ok(admins) if admins.contains(&user_id) => admin_chats.push(chat),
                Ok(_) => {}
                Err(e) => {
                    warn!(chat_id = chat.id, error = %e, "failed to fetch chat administrators");
                }
            }
        }
        Ok(admin_chats)
    }

    /// `/report [YYYY-MM-DD]`. Overwrites any earlier pending request of the user.
    pub async fn request_report(&self, user_id: u64, args: &str) -> Result<ReportPrompt, DomainError> {
        let chats = self.admin_chats(user_id).await?;
        if chats.is_empty() {
            return Err(DomainError::NoAdminChats);
        }

        let date = parse_report_date(args, Utc::now().date_naive())?;
        self.state.set_pending(user_id, date).await;
        info!(user_id, date = %date, chats = chats.len(), "report requested");

        Ok(ReportPrompt {
            date,
            options: chats
                .iter()
                .map(|c| format!("{}:{}", c.id, c.title))
                .collect(),
        })
    }

    /// Chat selection reply. `Ok(None)` when the user has no pending request.
    ///
    /// A malformed or unauthorized selection keeps the pending date so the user can retry.
    pub async fn select_chat(&self, user_id: u64, reply: &str) -> Result<Option<String>, DomainError> {
        if self.state.get_pending(user_id).await.is_none() {
            return Ok(None);
        }

        let chat_id = parse_selection(reply)?;
        let admins = self.gateway.get_chat_admin_ids(chat_id).await?;
        if !admins.contains(&user_id) {
            return Err(DomainError::InvalidSelection(reply.to_string()));
        }

        let Some(date) = self.state.take_pending(user_id).await else {
            return Ok(None);
        };

        let report = self.reports.generate(chat_id, date).await?;
        Ok(Some(render_report(&report)))
    }
}

/// Parse the first argument token as `YYYY-MM-DD`; no argument means the day before `today`.
pub fn parse_report_date(args: &str, today: NaiveDate) -> Result<NaiveDate, DomainError> {
    match args.split_whitespace().next() {
        None => Ok(today.pred_opt().unwrap_or(today)),
        Some(token) => NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .map_err(|_| DomainError::InvalidDate(token.to_string())),
    }
}

/// Extract the chat id from `"<chat_id>:<anything>"`.
pub fn parse_selection(reply: &str) -> Result<u64, DomainError> {
    reply
        .split_once(':')
        .and_then(|(id, _)| id.trim().parse::<u64>().ok())
        .ok_or_else(|| DomainError::InvalidSelection(reply.to_string()))
}
