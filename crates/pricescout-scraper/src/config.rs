use std::time::Duration;

use pricescout_core::{AppConfig, DedupConfig};

use crate::pacing::Pacing;
use crate::retry::RetryPolicy;

/// Settings handed to every adapter run and to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub currency: String,
    pub fetch_timeout: Duration,
    /// Deadline for one source's whole search.
    pub source_timeout: Duration,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    pub max_results_per_source: usize,
    pub max_pages: u32,
    pub headless: bool,
    pub dedup: DedupConfig,
}

impl ScraperConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            source_timeout: Duration::from_secs(config.source_timeout_secs),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                base_delay: Duration::from_millis(config.backoff_base_ms),
                jitter: config.backoff_jitter,
            },
            pacing: Pacing::new(config.pacing_min_ms, config.pacing_max_ms),
            max_results_per_source: config.max_results_per_source.max(1),
            max_pages: config.max_pages.max(1),
            headless: config.headless,
            dedup: config.dedup(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}
