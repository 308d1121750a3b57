use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::dedup::{merge, DedupConfig};
use crate::{DuplicateRecord, FilteredProduct, Query, SourceError, SourceId, SourceResult};

/// The assembled outcome of one query across every enabled source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub query: Query,
    pub generated_at: DateTime<Utc>,
    pub results: BTreeMap<SourceId, SourceResult>,
    pub merged: Vec<FilteredProduct>,
    pub duplicates: Vec<DuplicateRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub product_count: usize,
    pub error: Option<SourceError>,
}

/// Derived statistics over a [`Report`]. Price figures cover `merged`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub per_source: BTreeMap<SourceId, SourceSummary>,
    pub merged_count: usize,
    pub within_budget_count: usize,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub min_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub median_price: Option<Decimal>,
}

impl Report {
    /// Sources that ended with an error, in priority order.
    pub fn failures(&self) -> impl Iterator<Item = (SourceId, &SourceError)> {
        self.results
            .iter()
            .filter_map(|(source, result)| result.error.as_ref().map(|e| (*source, e)))
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.failures().next().is_some()
    }

    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let per_source = self
            .results
            .iter()
            .map(|(source, result)| {
                (
                    *source,
                    SourceSummary {
                        product_count: result.products.len(),
                        error: result.error.clone(),
                    },
                )
            })
            .collect();

        let mut prices: Vec<Decimal> = self
            .merged
            .iter()
            .filter_map(|p| p.product.price_value)
            .collect();
        prices.sort();

        ReportSummary {
            per_source,
            merged_count: self.merged.len(),
            within_budget_count: self.merged.iter().filter(|p| p.within_budget).count(),
            min_price: prices.first().copied(),
            max_price: prices.last().copied(),
            median_price: median(&prices),
        }
    }
}

fn median(sorted: &[Decimal]) -> Option<Decimal> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / Decimal::TWO)
    }
}

/// Assemble a report from per-source results.
///
/// Never fails: a source with an error simply contributes no products and
/// its error is kept on the report.
#[must_use]
pub fn aggregate(
    query: Query,
    results: BTreeMap<SourceId, SourceResult>,
    config: &DedupConfig,
) -> Report {
    let outcome = merge(&results, config);

    for (source, error) in results
        .iter()
        .filter_map(|(s, r)| r.error.as_ref().map(|e| (s, e)))
    {
        tracing::warn!(source = %source, term = %query.term(), error = %error, "source returned no results");
    }
    tracing::info!(
        term = %query.term(),
        sources = results.len(),
        merged = outcome.merged.len(),
        duplicates = outcome.duplicates.len(),
        "aggregated search results"
    );

    Report {
        query,
        generated_at: Utc::now(),
        results,
        merged: outcome.merged,
        duplicates: outcome.duplicates,
    }
}
