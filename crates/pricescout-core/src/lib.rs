//! Domain types and pure pipeline stages for multi-source price search.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! configuration loading: budget filtering, cross-source deduplication,
//! ranking, and report aggregation all operate on in-memory values produced
//! by the scraper crate.

pub mod app_config;
pub mod config;
pub mod dedup;
pub mod filter;
pub mod products;
pub mod queries;
pub mod report;
pub mod source;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use dedup::{merge, merge_listings, DedupConfig, MergeOutcome};
pub use filter::apply_budget;
pub use products::{DuplicateRecord, FilteredProduct, Product, SourceError, SourceResult};
pub use queries::{load_queries, parse_max_price, parse_queries, Query, QueryError, QuerySpec};
pub use report::{aggregate, Report, ReportSummary, SourceSummary};
pub use source::SourceId;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read query file {path}: {source}")]
    QueryFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("query file {path}: {source}")]
    QueryFileParse {
        path: String,
        #[source]
        source: QueryError,
    },
}
