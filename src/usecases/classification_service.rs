//! Classification cycle: group chats -> last-24h batch per chat -> classifier -> label writes.
//!
//! - One classifier call per chat, at most `max_concurrent` in flight
//! - A failing chat (read, classifier) is logged and skipped; siblings still run
//! - Label write failures are returned after every chat has been attempted
//! - The shutdown signal is checked before each chat starts

use crate::domain::{DomainError, Label, LabelUpdate, Message};
use crate::ports::{ClassifiedMessage, ClassifierPort, ClassifyRequest, RepoPort};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Outcome of one cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleStats {
    pub chats: usize,
    pub classified: usize,
    /// Chats without messages in the window.
    pub skipped: usize,
    pub failed: usize,
    pub messages_updated: usize,
    /// Shutdown was requested before every chat was started.
    pub cancelled: bool,
}

enum ChatOutcome {
    Empty,
    Classified { requested: usize, updated: usize },
}

/// Classification orchestrator. Stateless between cycles.
pub struct ClassificationService {
    repo: Arc<dyn RepoPort>,
    classifier: Arc<dyn ClassifierPort>,
    max_concurrent: usize,
}

impl ClassificationService {
    pub fn new(
        repo: Arc<dyn RepoPort>,
        classifier: Arc<dyn ClassifierPort>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            repo,
            classifier,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run one cycle over all group chats.
    ///
    /// # Errors
    /// * `Repo` if the chat list cannot be read (nothing was processed).
    /// * The first `Persistence` error, once all chats have been attempted.
    pub async fn run_cycle(&self, shutdown: &watch::Receiver<bool>) -> Result<CycleStats, DomainError> {
        let chats = self.repo.get_group_chats().await?;
        let mut stats = CycleStats {
            chats: chats.len(),
            ..Default::default()
        };
        if chats.is_empty() {
            info!("no group chats; nothing to classify");
            return Ok(stats);
        }

        let now = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for chat in chats {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| DomainError::Repo(format!("semaphore closed: {}", e)))?;
            if *shutdown.borrow() {
                info!(chat_id = chat.id, "shutdown requested; remaining chats skipped");
                stats.cancelled = true;
                break;
            }

            let repo = Arc::clone(&self.repo);
            let classifier = Arc::clone(&self.classifier);
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = classify_chat(&*repo, &*classifier, chat.id, now).await;
                (chat.id, outcome)
            });
        }

        let mut first_persistence_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((chat_id, Ok(ChatOutcome::Empty))) => {
                    debug!(chat_id, "no messages in window; skipped");
                    stats.skipped += 1;
                }
                Ok((chat_id, Ok(ChatOutcome::Classified { requested, updated }))) => {
                    info!(chat_id, requested, updated, "chat classified");
                    stats.classified += 1;
                    stats.messages_updated += updated;
                }
                Ok((chat_id, Err(e @ DomainError::Persistence(_)))) => {
                    error!(chat_id, error = %e, "label update failed");
                    stats.failed += 1;
                    first_persistence_error.get_or_insert(e);
                }
                Ok((chat_id, Err(e))) => {
                    warn!(chat_id, error = %e, "chat skipped this cycle");
                    stats.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "classification task panicked");
                    stats.failed += 1;
                }
            }
        }

        info!(
            chats = stats.chats,
            classified = stats.classified,
            skipped = stats.skipped,
            failed = stats.failed,
            updated = stats.messages_updated,
            cancelled = stats.cancelled,
            "classification cycle complete"
        );

        match first_persistence_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Periodic trigger. Runs until `shutdown` flips to true (or its sender is dropped).
    pub async fn run_loop(
        &self,
        period: Duration,
        run_immediately: bool,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            period_secs = period.as_secs(),
            run_immediately,
            max_concurrent = self.max_concurrent,
            "classification scheduler started"
        );

        if *shutdown.borrow() {
            info!("classification scheduler stopped");
            return;
        }
        if run_immediately {
            self.run_logged(&shutdown).await;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(period) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            if *shutdown.borrow() {
                break;
            }
            self.run_logged(&shutdown).await;
        }

        info!("classification scheduler stopped");
    }

    async fn run_logged(&self, shutdown: &watch::Receiver<bool>) {
        if let Err(e) = self.run_cycle(shutdown).await {
            error!(error = %e, "classification cycle failed");
        }
    }
}

/// Classify one chat's window. Read errors stay `Repo`, write errors become `Persistence`.
async fn classify_chat(
    repo: &dyn RepoPort,
    classifier: &dyn ClassifierPort,
    chat_id: u64,
    now: DateTime<Utc>,
) -> Result<ChatOutcome, DomainError> {
    let messages = repo.get_messages_for_last_day(chat_id, now).await?;
    if messages.is_empty() {
        return Ok(ChatOutcome::Empty);
    }

    let batch = build_batch(&messages);
    let classified = classifier.classify(&batch).await?;
    let updates = to_label_updates(&classified);

    repo.update_labels(&updates).await.map_err(|e| match e {
        DomainError::Persistence(_) => e,
        other => DomainError::Persistence(other.to_string()),
    })?;

    Ok(ChatOutcome::Classified {
        requested: batch.len(),
        updated: updates.len(),
    })
}

/// Project messages to the minimal wire record, keeping order.
fn build_batch(messages: &[Message]) -> Vec<ClassifyRequest> {
    messages
        .iter()
        .map(|m| ClassifyRequest {
            message_id: m.message_id,
            text: m.text.clone(),
            chat_id: m.chat_id,
        })
        .collect()
}

/// One update per verdict. Unknown label values are dropped; the message keeps its label.
fn to_label_updates(classified: &[ClassifiedMessage]) -> Vec<LabelUpdate> {
    classified
        .iter()
        .filter_map(|c| match Label::from_wire(c.label) {
            Some(label) => Some(LabelUpdate {
                message_id: c.message_id,
                chat_id: c.chat_id,
                label,
            }),
            None => {
                warn!(
                    chat_id = c.chat_id,
                    message_id = c.message_id,
                    label = c.label,
                    "unknown label from classifier; ignored"
                );
                None
            }
        })
        .collect()
}
