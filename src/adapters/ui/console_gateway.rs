//! Console TgGateway. The local operator administers every chat; replies go to stdout.

use crate::domain::DomainError;
use crate::ports::TgGateway;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

pub struct ConsoleGateway {
    operator_id: u64,
}

impl ConsoleGateway {
    pub fn new(operator_id: u64) -> Self {
        Self { operator_id }
    }
}

#[async_trait]
impl TgGateway for ConsoleGateway {
    async fn get_chat_admin_ids(&self, _chat_id: u64) -> Result<Vec<u64>, DomainError> {
        Ok(vec![self.operator_id])
    }

    async fn send_message(&self, _chat_id: i64, text: &str) -> Result<(), DomainError> {
        let mut out = tokio::io::stdout();
        out.write_all(format!("\n{}\n\n", text).as_bytes())
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))
    }
}
