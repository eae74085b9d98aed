//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Repository error: {0}")]
    Repo(String),

    /// Non-2xx response, transport failure or timeout from the classifier.
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Classifier answered 200 with a body we cannot decode.
    #[error("Classifier protocol error: {0}")]
    ClassifierProtocol(String),

    /// Writing labels back to the repository failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Chat gateway error: {0}")]
    Gateway(String),

    #[error("no messages in chat {chat_id} on {date}")]
    NoDataForPeriod { chat_id: u64, date: NaiveDate },

    #[error("{pending} messages in chat {chat_id} on {date} are still awaiting classification")]
    AwaitingClassification {
        chat_id: u64,
        date: NaiveDate,
        pending: usize,
    },

    /// Transport event carried a unix time outside the representable range.
    #[error("invalid message timestamp {0}")]
    InvalidTimestamp(i64),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid chat selection '{0}'")]
    InvalidSelection(String),

    #[error("you are not an administrator of any group chat")]
    NoAdminChats,

    #[error("chat {0} not found")]
    ChatNotFound(u64),
}

impl DomainError {
    /// Errors caused by user input or missing data. The transport replies with
    /// these instead of treating them as failures.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            DomainError::NoDataForPeriod { .. }
                | DomainError::AwaitingClassification { .. }
                | DomainError::InvalidDate(_)
                | DomainError::InvalidSelection(_)
                | DomainError::NoAdminChats
                | DomainError::ChatNotFound(_)
        )
    }
}
