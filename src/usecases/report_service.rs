//! Report use case: load one chat's day from the repository and aggregate it.

use crate::domain::{DomainError, Report, aggregate};
use crate::ports::RepoPort;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

pub struct ReportService {
    repo: Arc<dyn RepoPort>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn RepoPort>) -> Self {
        Self { repo }
    }

    /// Build the report for `chat_id` on `date`.
    ///
    /// # Errors
    /// `NoDataForPeriod` / `AwaitingClassification` from aggregation, `ChatNotFound`
    /// when messages exist for an unknown chat, `Repo` on storage failure.
    pub async fn generate(&self, chat_id: u64, date: NaiveDate) -> Result<Report, DomainError> {
        let messages = self.repo.get_messages_by_chat_and_day(chat_id, date).await?;
        if messages.is_empty() {
            return Err(DomainError::NoDataForPeriod { chat_id, date });
        }

        let chat = self
            .repo
            .get_chat_info(chat_id)
            .await?
            .ok_or(DomainError::ChatNotFound(chat_id))?;

        let report = aggregate(&chat, date, &messages)?;
        info!(
            chat_id,
            date = %date,
            total = report.total_messages,
            unproductive = report.unproductive_messages,
            pending = report.pending_messages,
            "report generated"
        );
        Ok(report)
    }
}
