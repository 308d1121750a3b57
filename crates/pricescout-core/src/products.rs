use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Query, SourceId};

/// A normalized product listing from one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    #[serde(rename = "site")]
    pub source: SourceId,
    pub title: String,
    /// Display price as shown by the storefront, e.g. `AED 2,999.00`.
    #[serde(rename = "price")]
    pub price_text: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_value: Option<Decimal>,
    pub currency: String,
    pub url: String,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub brand: Option<String>,
    pub delivery_info: Option<String>,
    pub in_stock: Option<bool>,
    /// Markdown text as shown on the card, e.g. `(7% off)`. JSON only.
    pub discount_info: Option<String>,
}

impl Product {
    /// Stable key identifying a listing: SHA-256 of `source|url`, hex-encoded.
    #[must_use]
    pub fn listing_key(&self) -> String {
        make_listing_key(self.source, &self.url)
    }
}

/// Compute the listing key for a source and absolute product URL.
#[must_use]
pub fn make_listing_key(source: SourceId, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A product annotated against the query budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredProduct {
    #[serde(flatten)]
    pub product: Product,
    pub within_budget: bool,
    /// `max_price - price_value`, present only when both are known.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub savings: Option<Decimal>,
}

/// Why a source produced no usable listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceError {
    /// Every attempt exceeded its deadline.
    Timeout,
    /// Anti-bot challenge or rate limiting.
    Blocked,
    /// The page loaded but no parse strategy recognized any listing.
    NoResultsOrLayoutChanged,
    /// Non-retriable HTTP status or a fetcher that could not be opened.
    Unavailable { detail: String },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Timeout => write!(f, "timeout"),
            SourceError::Blocked => write!(f, "blocked"),
            SourceError::NoResultsOrLayoutChanged => write!(f, "no results or layout changed"),
            SourceError::Unavailable { detail } => write!(f, "unavailable: {detail}"),
        }
    }
}

/// Outcome of running one source adapter for one query.
///
/// `error` being set implies `products` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    pub source: SourceId,
    #[serde(skip)]
    pub query: Query,
    pub products: Vec<FilteredProduct>,
    pub error: Option<SourceError>,
}

impl SourceResult {
    #[must_use]
    pub fn completed(source: SourceId, query: Query, products: Vec<FilteredProduct>) -> Self {
        Self {
            source,
            query,
            products,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(source: SourceId, query: Query, error: SourceError) -> Self {
        Self {
            source,
            query,
            products: Vec::new(),
            error: Some(error),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// A listing removed during deduplication, with a pointer to the one kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateRecord {
    pub kept_source: SourceId,
    pub kept_url: String,
    pub kept_key: String,
    pub title_similarity: f64,
    pub dropped: FilteredProduct,
}
