//! Wiring & DI. Entry point: bootstrap adapters, inject into services, start the
//! classification scheduler, run the console transport. No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use warden_bot::adapters::classifier::{HttpClassifier, MockClassifier};
use warden_bot::adapters::persistence::{InMemoryConversationState, MemoryRepo, SqliteRepo};
use warden_bot::adapters::ui::{ConsoleGateway, TuiInputPort};
use warden_bot::ports::{ClassifierPort, ConversationStatePort, InputPort, RepoPort, TgGateway};
use warden_bot::shared::config::AppConfig;
use warden_bot::usecases::{ClassificationService, ConversationService};

/// User id of the local console operator.
const OPERATOR_ID: u64 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    });

    let data_path = PathBuf::from(cfg.data_dir_or_default());

    // --- Storage ---
    let repo: Arc<dyn RepoPort> = if cfg.use_sqlite() {
        Arc::new(
            SqliteRepo::connect(&data_path)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
        )
    } else {
        warn!("WARDEN_STORAGE=memory, messages are lost on exit");
        Arc::new(MemoryRepo::new())
    };
    let state: Arc<dyn ConversationStatePort> = Arc::new(InMemoryConversationState::new());

    // --- Classifier ---
    let classifier: Arc<dyn ClassifierPort> = match cfg.classifier_url() {
        Some(url) => {
            let timeout_secs = cfg.classifier_timeout_secs_or_default();
            info!(url = %url, timeout_secs, "using HTTP classifier");
            Arc::new(
                HttpClassifier::new(&url, Duration::from_secs(timeout_secs))
                    .map_err(|e| anyhow::anyhow!("{}", e))?,
            )
        }
        None => {
            warn!("WARDEN_CLASSIFIER_URL not set, using mock classifier");
            Arc::new(MockClassifier::new())
        }
    };

    let gateway: Arc<dyn TgGateway> = Arc::new(ConsoleGateway::new(OPERATOR_ID));

    // --- Services ---
    let classification = Arc::new(ClassificationService::new(
        Arc::clone(&repo),
        classifier,
        cfg.max_concurrent_classifications_or_default(),
    ));
    let conversation = Arc::new(ConversationService::new(
        Arc::clone(&repo),
        Arc::clone(&gateway),
        state,
    ));

    // --- Scheduler ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let period = Duration::from_secs(cfg.cycle_secs_or_default());
    let scheduler = {
        let classification = Arc::clone(&classification);
        let run_immediately = cfg.run_immediately();
        let rx = shutdown_rx.clone();
        tokio::spawn(async move {
            classification.run_loop(period, run_immediately, rx).await;
        })
    };

    {
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping scheduler");
                let _ = tx.send(true);
            }
        });
    }

    // --- Run (main menu -> Report / Classify / Import / Help) ---
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        OPERATOR_ID,
        gateway,
        conversation,
        classification,
        shutdown_rx,
    ));
    let result = input_port.run().await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        error!(error = %e, "scheduler task panicked");
    }

    result.map_err(|e| anyhow::anyhow!("{}", e))
}
