//! Query orchestration: fan out to every enabled source concurrently, wait
//! for all of them (or their deadlines), then aggregate.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use pricescout_core::{aggregate, Query, Report, SourceError, SourceId, SourceResult};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::adapter::SourceAdapter;
use crate::config::ScraperConfig;
use crate::error::SearchError;
use crate::fetch::FetcherProvider;

/// Explicit per-run context shared by every adapter invocation.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub provider: &'a dyn FetcherProvider,
    pub config: &'a ScraperConfig,
    pub cancel: &'a CancellationToken,
}

/// Validate a raw term and run it.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] before any fetcher is opened when
/// the term, budget, or source selection is invalid, and
/// [`SearchError::Cancelled`] when the run is cancelled.
pub async fn search_term(
    term: &str,
    max_price: Option<Decimal>,
    sources: impl IntoIterator<Item = SourceId>,
    ctx: &SearchContext<'_>,
) -> Result<Report, SearchError> {
    let query = Query::new(term, max_price, sources)?;
    run_search(&query, ctx).await
}

/// Run `query` against each enabled source concurrently.
///
/// A source exceeding `ctx.config.source_timeout` is recorded as
/// [`SourceError::Timeout`] without affecting the others. Aggregation starts
/// only once every source has finished.
///
/// # Errors
///
/// Returns [`SearchError::Cancelled`] when `ctx.cancel` fires before the
/// report is assembled. Partial results are discarded.
pub async fn run_search(query: &Query, ctx: &SearchContext<'_>) -> Result<Report, SearchError> {
    if ctx.cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let adapters: Vec<SourceAdapter> = query.sources().map(SourceAdapter::for_source).collect();
    let concurrency = adapters.len().max(1);
    let deadline = ctx.config.source_timeout;
    tracing::info!(
        term = %query.term(),
        max_price = ?query.max_price(),
        sources = adapters.len(),
        "starting search"
    );

    let outcomes: Vec<Result<(SourceId, SourceResult), SearchError>> = stream::iter(adapters)
        .map(|adapter| async move {
            let source = adapter.source();
            match tokio::time::timeout(deadline, adapter.search(query, ctx)).await {
                Ok(result) => result.map(|r| (source, r)),
                Err(_) => {
                    tracing::warn!(
                        source = %source,
                        timeout_secs = deadline.as_secs(),
                        "source search exceeded its deadline"
                    );
                    Ok((
                        source,
                        SourceResult::failed(source, query.clone(), SourceError::Timeout),
                    ))
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    if ctx.cancel.is_cancelled() {
        tracing::info!(term = %query.term(), "search cancelled; discarding partial results");
        return Err(SearchError::Cancelled);
    }

    let mut results = BTreeMap::new();
    for outcome in outcomes {
        let (source, result) = outcome?;
        results.insert(source, result);
    }

    Ok(aggregate(query.clone(), results, &ctx.config.dedup))
}
