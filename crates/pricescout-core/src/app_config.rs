use rust_decimal::Decimal;

use crate::DedupConfig;

/// Runtime settings shared by the scraper and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    /// Currency code stamped on every product, e.g. `AED`.
    pub currency: String,
    /// Deadline for a single page fetch.
    pub fetch_timeout_secs: u64,
    /// Deadline for one source's whole search, retries included.
    pub source_timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    /// Relative jitter applied to each back-off delay, e.g. `0.3` for ±30%.
    pub backoff_jitter: f64,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
    pub max_results_per_source: usize,
    pub max_pages: u32,
    pub dedup_title_threshold: f64,
    pub dedup_price_tolerance: Decimal,
    pub inter_query_delay_ms: u64,
    pub headless: bool,
}

impl AppConfig {
    #[must_use]
    pub fn dedup(&self) -> DedupConfig {
        DedupConfig {
            title_threshold: self.dedup_title_threshold,
            price_tolerance: self.dedup_price_tolerance,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            currency: "AED".to_string(),
            fetch_timeout_secs: 30,
            source_timeout_secs: 60,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_jitter: 0.3,
            pacing_min_ms: 800,
            pacing_max_ms: 2500,
            max_results_per_source: 10,
            max_pages: 1,
            dedup_title_threshold: 0.8,
            dedup_price_tolerance: Decimal::new(5, 2),
            inter_query_delay_ms: 2000,
            headless: true,
        }
    }
}
