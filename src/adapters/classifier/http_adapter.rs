//! HTTP adapter for the external classification service.
//!
//! `POST {base_url}/classify` with one chat batch per call. Anything but
//! HTTP 200 fails the batch.

use crate::domain::DomainError;
use crate::ports::{ClassifiedMessage, ClassifierPort, ClassifyRequest};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Classifier adapter over reqwest. The client-level timeout bounds every call.
pub struct HttpClassifier {
    client: reqwest::Client,
    classify_url: String,
}

impl HttpClassifier {
    /// Create a classifier client.
    ///
    /// # Arguments
    /// * `base_url` - Service root (e.g. "http://classifier:8000"); `/classify` is appended
    /// * `timeout` - Upper bound for one batch call, connect included
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::ClassifierUnavailable(format!("build client: {}", e)))?;
        Ok(Self {
            client,
            classify_url: Self::classify_url(base_url),
        })
    }

    fn classify_url(base_url: &str) -> String {
        format!("{}/classify", base_url.trim_end_matches('/'))
    }
}

/// Request body: `{"messages": [...]}`.
#[derive(Serialize)]
struct ClassifyBody<'a> {
    messages: &'a [ClassifyRequest],
}

/// Response body: `{"messages": [...]}`.
#[derive(Deserialize)]
struct ClassifiedBody {
    messages: Vec<ClassifiedMessage>,
}

fn parse_response(raw: &str) -> Result<Vec<ClassifiedMessage>, DomainError> {
    serde_json::from_str::<ClassifiedBody>(raw)
        .map(|b| b.messages)
        .map_err(|e| {
            warn!(error = %e, body = %raw.chars().take(200).collect::<String>(), "classifier JSON parse failed");
            DomainError::ClassifierProtocol(format!("decode response: {}", e))
        })
}

#[async_trait::async_trait]
impl ClassifierPort for HttpClassifier {
    async fn classify(
        &self,
        batch: &[ClassifyRequest],
    ) -> Result<Vec<ClassifiedMessage>, DomainError> {
        debug!(url = %self.classify_url, count = batch.len(), "sending batch to classifier");

        let response = self
            .client
            .post(&self.classify_url)
            .json(&ClassifyBody { messages: batch })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::ClassifierUnavailable(format!("request timed out: {}", e))
                } else {
                    DomainError::ClassifierUnavailable(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "classifier returned error");
            return Err(DomainError::ClassifierUnavailable(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| DomainError::ClassifierUnavailable(format!("read body: {}", e)))?;
        let classified = parse_response(&raw)?;

        info!(
            requested = batch.len(),
            classified = classified.len(),
            "classifier batch complete"
        );
        Ok(classified)
    }
}
