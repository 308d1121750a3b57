use pricescout_core::{QueryError, SourceId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("could not open a fetcher session for {site}: {reason}")]
    SessionUnavailable { site: SourceId, reason: String },
}

/// Per-entry failures. These drop the entry and are never surfaced past the
/// adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no numeric value in price text \"{price_text}\" for \"{title}\"")]
    UnparsablePrice { title: String, price_text: String },

    #[error("listing URL {url} is not on {domain}")]
    ForeignUrl { url: String, domain: String },

    #[error("cannot resolve listing link \"{href}\": {reason}")]
    InvalidUrl { href: String, reason: String },
}

/// Whole-operation failures. Everything else is recorded per source on the
/// report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("search cancelled")]
    Cancelled,
}
