//! Inbound port. Transport/UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: the console or bot transport drives the conversation flow.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive loop until the operator quits.
    async fn run(&self) -> Result<(), DomainError>;
}
