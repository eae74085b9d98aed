//! Application configuration. Storage location, classifier endpoint, cycle timing.

use serde::Deserialize;

/// Default classifier call timeout. A batch exceeding it is skipped for the cycle.
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

/// Default number of classifier calls in flight during one cycle.
pub const DEFAULT_MAX_CONCURRENT_CLASSIFICATIONS: usize = 4;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub data_dir: Option<String>,

    /// Storage backend: "sqlite" (default) or "memory". Read from WARDEN_STORAGE.
    #[serde(default)]
    pub storage: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Classifier
    // ─────────────────────────────────────────────────────────────────────────
    /// Base URL of the classification service; `/classify` is appended. Read from WARDEN_CLASSIFIER_URL.
    #[serde(default)]
    pub classifier_url: Option<String>,

    /// Per-call timeout in seconds. Read from WARDEN_CLASSIFIER_TIMEOUT_SECS.
    #[serde(default)]
    pub classifier_timeout_secs: Option<u64>,

    /// Max classifier calls in flight per cycle. Read from WARDEN_MAX_CONCURRENT_CLASSIFICATIONS.
    #[serde(default)]
    pub max_concurrent_classifications: Option<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // Scheduler
    // ─────────────────────────────────────────────────────────────────────────
    /// Seconds between classification cycles (default 3600). Read from WARDEN_CYCLE_SECS.
    #[serde(default)]
    pub cycle_secs: Option<u64>,

    /// Run a cycle at startup instead of waiting one period. Also set by the `--run` argument.
    #[serde(default)]
    pub run_immediately: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("WARDEN").try_parsing(true));
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // `--run` on the command line forces a cycle at startup
        if std::env::args().any(|a| a == "--run") {
            cfg.run_immediately = Some(true);
        }
        Ok(cfg)
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// True unless WARDEN_STORAGE=memory.
    pub fn use_sqlite(&self) -> bool {
        !matches!(self.storage.as_deref(), Some(s) if s.eq_ignore_ascii_case("memory"))
    }

    /// Returns the classifier base URL if configured (trailing slash removed).
    pub fn classifier_url(&self) -> Option<String> {
        self.classifier_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
    }

    pub fn classifier_timeout_secs_or_default(&self) -> u64 {
        self.classifier_timeout_secs
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS)
    }

    /// Never below 1 (a zero-permit semaphore would stall the cycle).
    pub fn max_concurrent_classifications_or_default(&self) -> usize {
        self.max_concurrent_classifications
            .unwrap_or(DEFAULT_MAX_CONCURRENT_CLASSIFICATIONS)
            .max(1)
    }

    pub fn cycle_secs_or_default(&self) -> u64 {
        self.cycle_secs.filter(|&s| s > 0).unwrap_or(3600)
    }

    pub fn run_immediately(&self) -> bool {
        self.run_immediately.unwrap_or(false)
    }
}
