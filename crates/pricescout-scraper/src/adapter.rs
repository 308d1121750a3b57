//! One source's search: fetch, parse, normalize, annotate.
//!
//! An adapter run never fails past its boundary. Fetch, block, and layout
//! problems end up as [`SourceError`] on the returned [`SourceResult`]; only
//! caller cancellation is reported as an error.

use std::collections::HashSet;

use pricescout_core::{apply_budget, Product, Query, SourceError, SourceId, SourceResult};
use reqwest::Url;

use crate::config::ScraperConfig;
use crate::error::SearchError;
use crate::fetch::{looks_like_bot_challenge, FetchOptions, FetchSession};
use crate::normalize::{normalize, NormalizeContext};
use crate::pacing::BrowserProfile;
use crate::retry::{classify_failure, fetch_with_retry};
use crate::search::SearchContext;
use crate::sources::{profile, SourceProfile};
use crate::strategy::parse_entries;

#[derive(Debug, Clone, Copy)]
pub struct SourceAdapter {
    profile: &'static SourceProfile,
}

impl SourceAdapter {
    #[must_use]
    pub fn for_source(source: SourceId) -> Self {
        Self {
            profile: profile(source),
        }
    }

    #[must_use]
    pub fn source(&self) -> SourceId {
        self.profile.source
    }

    /// Run the search for `query` on this source.
    ///
    /// The fetcher session is released before returning, whether the run
    /// succeeded, failed, or was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cancelled`] when `ctx.cancel` fires.
    pub async fn search(
        &self,
        query: &Query,
        ctx: &SearchContext<'_>,
    ) -> Result<SourceResult, SearchError> {
        let source = self.source();
        if ctx.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let browser = BrowserProfile::randomized(ctx.config.headless);
        let opened = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => None,
            opened = ctx.provider.open(source, &browser) => Some(opened),
        };
        let fetcher = match opened {
            None => {
                tracing::info!(source = %source, "search cancelled while opening session");
                return Err(SearchError::Cancelled);
            }
            Some(Ok(fetcher)) => fetcher,
            Some(Err(err)) => {
                tracing::warn!(source = %source, error = %err, "could not open fetcher session");
                return Ok(SourceResult::failed(
                    source,
                    query.clone(),
                    SourceError::Unavailable {
                        detail: err.to_string(),
                    },
                ));
            }
        };
        let mut session = FetchSession::new(source, fetcher);

        let outcome = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => None,
            result = self.collect(&mut session, query, ctx.config) => Some(result),
        };
        session.release().await;

        match outcome {
            None => {
                tracing::info!(source = %source, "search cancelled");
                Err(SearchError::Cancelled)
            }
            Some(Ok(products)) => {
                tracing::info!(source = %source, term = %query.term(), count = products.len(), "source search complete");
                Ok(SourceResult::completed(
                    source,
                    query.clone(),
                    apply_budget(products, query.max_price()),
                ))
            }
            Some(Err(error)) => {
                tracing::warn!(source = %source, term = %query.term(), error = %error, "source search failed");
                Ok(SourceResult::failed(source, query.clone(), error))
            }
        }
    }

    async fn collect(
        &self,
        session: &mut FetchSession,
        query: &Query,
        config: &ScraperConfig,
    ) -> Result<Vec<Product>, SourceError> {
        let source = self.source();
        let base_url = Url::parse(self.profile.base_url).map_err(|e| SourceError::Unavailable {
            detail: format!("invalid base URL: {e}"),
        })?;
        let mut options = FetchOptions {
            timeout: config.fetch_timeout,
            headless: config.headless,
            referer: Some(self.profile.base_url.to_string()),
        };

        let mut products: Vec<Product> = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();

        for page in 1..=config.max_pages {
            let url = self.profile.search_url(query.term(), page);
            config.pacing.pause().await;

            let html = match fetch_with_retry(session, &url, &options, &config.retry).await {
                Ok(html) => html,
                Err(status) if page == 1 => return Err(classify_failure(status)),
                Err(status) => {
                    tracing::debug!(source = %source, page, status = ?status, "stopping pagination");
                    break;
                }
            };

            if looks_like_bot_challenge(&html) {
                if page == 1 {
                    return Err(SourceError::Blocked);
                }
                tracing::debug!(source = %source, page, "challenge page; stopping pagination");
                break;
            }

            let Some((strategy, entries)) = parse_entries(&html, self.profile.strategies) else {
                if page == 1 {
                    return Err(SourceError::NoResultsOrLayoutChanged);
                }
                break;
            };
            tracing::debug!(source = %source, page, strategy, count = entries.len(), "parsed results page");

            let ctx = NormalizeContext {
                source,
                base_url: &base_url,
                fallback_url: &url,
                currency: &config.currency,
                locale: self.profile.locale,
                prefix_brand: self.profile.prefix_brand,
            };
            for raw in entries {
                if products.len() >= config.max_results_per_source {
                    break;
                }
                match normalize(raw, &ctx) {
                    // Cards without a link share the page URL, so only linked
                    // listings can be recognized as repeats.
                    Ok(product) => {
                        let linked = product.url != url;
                        if !linked || seen_keys.insert(product.listing_key()) {
                            products.push(product);
                        }
                    }
                    Err(err) => {
                        tracing::debug!(source = %source, error = %err, "dropping entry");
                    }
                }
            }

            if products.len() >= config.max_results_per_source {
                break;
            }
            options.referer = Some(url);
        }

        if products.is_empty() {
            return Err(SourceError::NoResultsOrLayoutChanged);
        }
        Ok(products)
    }
}
