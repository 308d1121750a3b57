//! Cross-source duplicate detection and final ranking.
//!
//! Retailers share no product identifiers, so "same product" is approximated:
//! two listings from different sources are duplicates when their normalized
//! title token sets have a Jaccard similarity at or above
//! [`DedupConfig::title_threshold`] AND their prices differ by no more than
//! [`DedupConfig::price_tolerance`] of the lower price. Listings without a
//! price never match anything. The thresholds lean towards missing duplicates
//! rather than merging distinct products.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::products::make_listing_key;
use crate::{DuplicateRecord, FilteredProduct, SourceId, SourceResult};

#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    /// Minimum title-token Jaccard similarity, in `[0, 1]`.
    pub title_threshold: f64,
    /// Maximum relative price difference, e.g. `0.05` for ±5%.
    pub price_tolerance: Decimal,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_threshold: 0.8,
            price_tolerance: Decimal::new(5, 2),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Deduplicated, ranked listings.
    pub merged: Vec<FilteredProduct>,
    /// Listings that lost to a cheaper (or higher priority) equivalent.
    pub duplicates: Vec<DuplicateRecord>,
}

struct Candidate {
    discovery: usize,
    tokens: BTreeSet<String>,
    item: FilteredProduct,
}

impl Candidate {
    fn source(&self) -> SourceId {
        self.item.product.source
    }

    fn price(&self) -> Option<Decimal> {
        self.item.product.price_value
    }
}

/// Lowercase, punctuation-stripped title tokens.
#[must_use]
pub fn title_tokens(title: &str) -> BTreeSet<String> {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of two token sets. Two empty sets score zero.
#[must_use]
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    #[allow(clippy::cast_precision_loss)]
    let score = intersection as f64 / union as f64;
    score
}

/// Whether two prices differ by at most `tolerance` of the lower one.
#[must_use]
pub fn prices_within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    let low = a.min(b);
    (a - b).abs() <= low * tolerance
}

/// Merge every source's products into one deduplicated, ranked list.
///
/// Iteration order of `results` does not affect the outcome.
#[must_use]
pub fn merge(results: &BTreeMap<SourceId, SourceResult>, config: &DedupConfig) -> MergeOutcome {
    merge_listings(
        results.values().flat_map(|r| r.products.iter().cloned()),
        config,
    )
}

/// Merge a flat sequence of listings.
///
/// Discovery order is the order in which each source's listings appear in
/// `listings`. Listings with a known price above the budget are left out of
/// `merged`; they stay visible on their `SourceResult`.
pub fn merge_listings(
    listings: impl IntoIterator<Item = FilteredProduct>,
    config: &DedupConfig,
) -> MergeOutcome {
    let mut seen_per_source: HashMap<SourceId, usize> = HashMap::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for item in listings {
        let counter = seen_per_source.entry(item.product.source).or_insert(0);
        let discovery = *counter;
        *counter += 1;

        if !item.within_budget && item.product.price_value.is_some() {
            continue;
        }
        candidates.push(Candidate {
            discovery,
            tokens: title_tokens(&item.product.title),
            item,
        });
    }

    // Cheapest first so the first member of a cluster to be kept is its
    // representative.
    candidates.sort_by(|a, b| {
        cmp_price(a.price(), b.price())
            .then_with(|| a.source().cmp(&b.source()))
            .then_with(|| a.discovery.cmp(&b.discovery))
    });

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut duplicates = Vec::new();

    for candidate in candidates {
        let matched = kept.iter().find_map(|k| {
            let similarity = duplicate_score(k, &candidate, config)?;
            Some((k, similarity))
        });
        match matched {
            Some((winner, similarity)) => {
                tracing::debug!(
                    kept_source = %winner.source(),
                    dropped_source = %candidate.source(),
                    similarity,
                    title = %candidate.item.product.title,
                    "dropping cross-source duplicate"
                );
                duplicates.push(DuplicateRecord {
                    kept_source: winner.source(),
                    kept_url: winner.item.product.url.clone(),
                    kept_key: make_listing_key(winner.source(), &winner.item.product.url),
                    title_similarity: similarity,
                    dropped: candidate.item,
                });
            }
            None => kept.push(candidate),
        }
    }

    kept.sort_by(|a, b| {
        b.item
            .within_budget
            .cmp(&a.item.within_budget)
            .then_with(|| cmp_price(a.price(), b.price()))
            .then_with(|| a.source().cmp(&b.source()))
            .then_with(|| a.discovery.cmp(&b.discovery))
    });

    MergeOutcome {
        merged: kept.into_iter().map(|c| c.item).collect(),
        duplicates,
    }
}

/// Similarity score when `b` duplicates `a`, `None` otherwise.
fn duplicate_score(a: &Candidate, b: &Candidate, config: &DedupConfig) -> Option<f64> {
    if a.source() == b.source() {
        return None;
    }
    let (Some(pa), Some(pb)) = (a.price(), b.price()) else {
        return None;
    };
    if !prices_within_tolerance(pa, pb, config.price_tolerance) {
        return None;
    }
    let similarity = jaccard(&a.tokens, &b.tokens);
    (similarity >= config.title_threshold).then_some(similarity)
}

/// Ascending price with unknown prices last.
fn cmp_price(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
