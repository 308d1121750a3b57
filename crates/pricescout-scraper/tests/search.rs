//! End-to-end query runs across all three sources with scripted fetchers.

mod common;

use std::time::Duration;

use common::{
    fast_config, ScriptedProvider, AMAZON_CAPTCHA, NAMSHI_SEARCH, NOON_SEARCH,
};
use pricescout_core::{Query, QueryError, SourceError, SourceId};
use pricescout_scraper::{
    run_search, search_term, ScraperConfig, SearchContext, SearchError,
};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

fn noon_card(href: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div data-qa="plp-product-box"><a class="ProductBoxLinkHandler_productBoxLink__FPhjp" href="{href}"><h2 data-qa="plp-product-box-name">{title}</h2><div data-qa="plp-product-box-price"><span>AED</span> <strong>{price}</strong></div></a></div>"#
    )
}

fn amazon_card(href: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div data-component-type="s-search-result" data-asin="B0TEST"><h2><a href="{href}"><span>{title}</span></a></h2><span class="a-price"><span class="a-offscreen">AED {price}</span></span></div>"#
    )
}

fn page(cards: &[String]) -> String {
    format!("<html><head><title>results</title></head><body>{}</body></html>", cards.join("\n"))
}

const NO_LISTINGS: &str = "<html><head><title>Namshi</title></head><body><p>No products found</p></body></html>";

fn all_sources() -> [SourceId; 3] {
    SourceId::ALL
}

// ---------------------------------------------------------------------------
// Aggregated reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn budgeted_query_keeps_only_affordable_listing() {
    let provider = ScriptedProvider::new()
        .with_page(
            SourceId::Noon,
            &page(&[noon_card(
                "/uae-en/apple-iphone-15-pro-128gb/N1/p/",
                "Apple iPhone 15 Pro 128GB",
                "2,999.00",
            )]),
        )
        .with_page(SourceId::Namshi, NO_LISTINGS)
        .with_page(
            SourceId::Amazon,
            &page(&[amazon_card(
                "/Apple-iPhone-15-Pro/dp/B0TEST",
                "Apple iPhone 15 Pro 128GB Black",
                "3,199.00",
            )]),
        );
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let report = search_term("iPhone 15 Pro", Some(Decimal::from(3000)), all_sources(), &ctx)
        .await
        .unwrap();

    assert_eq!(report.merged.len(), 1);
    let best = &report.merged[0];
    assert_eq!(best.product.source, SourceId::Noon);
    assert_eq!(best.product.price_value, Some(Decimal::from(2999)));
    assert!(best.within_budget);
    assert_eq!(best.savings, Some(Decimal::ONE));

    let amazon = &report.results[&SourceId::Amazon];
    assert!(amazon.error.is_none());
    assert_eq!(amazon.products.len(), 1);
    assert!(!amazon.products[0].within_budget);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(
        failures,
        vec![(SourceId::Namshi, &SourceError::NoResultsOrLayoutChanged)]
    );
    assert!(report.duplicates.is_empty());
    assert_eq!(provider.opened(), 3);
    assert_eq!(provider.released(), 3);
}

#[tokio::test]
async fn one_blocked_source_yields_partial_report() {
    let provider = ScriptedProvider::new()
        .with_page(SourceId::Noon, NOON_SEARCH)
        .with_page(SourceId::Namshi, NAMSHI_SEARCH)
        .with_page(SourceId::Amazon, AMAZON_CAPTCHA);
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };
    let query = Query::new("shoes and phones", None, all_sources()).unwrap();

    let report = run_search(&query, &ctx).await.unwrap();

    assert!(report.is_partial());
    assert_eq!(
        report.results[&SourceId::Amazon].error,
        Some(SourceError::Blocked)
    );
    let prices: Vec<Option<Decimal>> = report
        .merged
        .iter()
        .map(|item| item.product.price_value)
        .collect();
    assert_eq!(
        prices,
        vec![
            Some(Decimal::new(22950, 2)),
            Some(Decimal::from(549)),
            Some(Decimal::from(3599)),
            Some(Decimal::from(4899)),
        ]
    );

    let summary = report.summary();
    assert_eq!(summary.per_source[&SourceId::Noon].product_count, 2);
    assert_eq!(summary.per_source[&SourceId::Amazon].product_count, 0);
    assert_eq!(summary.merged_count, 4);
}

#[tokio::test]
async fn cross_source_duplicate_keeps_cheaper_listing() {
    let title = "Apple iPhone 15 Pro 128GB Natural Titanium 5G With FaceTime - Middle East Version";
    let provider = ScriptedProvider::new()
        .with_page(SourceId::Noon, NOON_SEARCH)
        .with_page(
            SourceId::Amazon,
            &page(&[amazon_card("/dp/B0CHX1W1XY", title, "3,650.00")]),
        );
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let report = search_term(title, None, [SourceId::Noon, SourceId::Amazon], &ctx)
        .await
        .unwrap();

    assert_eq!(report.merged.len(), 2);
    assert_eq!(report.merged[0].product.source, SourceId::Noon);
    assert_eq!(report.merged[0].product.price_value, Some(Decimal::from(3599)));
    assert_eq!(report.duplicates.len(), 1);
    let duplicate = &report.duplicates[0];
    assert_eq!(duplicate.kept_source, SourceId::Noon);
    assert_eq!(duplicate.dropped.product.source, SourceId::Amazon);
    assert!((duplicate.title_similarity - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn only_enabled_sources_are_queried() {
    let provider = ScriptedProvider::new().with_page(SourceId::Namshi, NAMSHI_SEARCH);
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let report = search_term("nike", None, [SourceId::Namshi], &ctx)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(report.results.contains_key(&SourceId::Namshi));
    assert_eq!(provider.opened(), 1);
    assert!(provider
        .requested()
        .iter()
        .all(|url| url.starts_with("https://www.namshi.com/")));
}

// ---------------------------------------------------------------------------
// Deadlines, validation, and cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn every_source_timing_out_still_produces_report() {
    let provider = ScriptedProvider::new()
        .with_hang(SourceId::Noon)
        .with_hang(SourceId::Namshi)
        .with_hang(SourceId::Amazon);
    let config = ScraperConfig {
        source_timeout: Duration::from_secs(2),
        ..fast_config()
    };
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let report = search_term("kettle", None, all_sources(), &ctx).await.unwrap();

    assert!(report.merged.is_empty());
    assert_eq!(report.results.len(), 3);
    assert!(report
        .results
        .values()
        .all(|r| r.error == Some(SourceError::Timeout) && r.products.is_empty()));
    assert_eq!(provider.released(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_without_holding_back_others() {
    let provider = ScriptedProvider::new()
        .with_page(SourceId::Noon, NOON_SEARCH)
        .with_page(SourceId::Namshi, NAMSHI_SEARCH)
        .with_hang(SourceId::Amazon);
    let config = ScraperConfig {
        source_timeout: Duration::from_secs(5),
        ..fast_config()
    };
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let report = search_term("gifts", None, all_sources(), &ctx).await.unwrap();

    assert_eq!(report.results[&SourceId::Amazon].error, Some(SourceError::Timeout));
    assert_eq!(report.merged.len(), 4);
}

#[tokio::test]
async fn blank_term_is_rejected_before_any_fetch() {
    let provider = ScriptedProvider::new().with_page(SourceId::Noon, NOON_SEARCH);
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let outcome = search_term("   ", None, all_sources(), &ctx).await;

    assert_eq!(outcome, Err(SearchError::InvalidQuery(QueryError::EmptyTerm)));
    assert_eq!(provider.opened(), 0);
    assert!(provider.requested().is_empty());
}

#[tokio::test]
async fn no_enabled_sources_is_rejected() {
    let provider = ScriptedProvider::new();
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let outcome = search_term("kettle", None, Vec::<SourceId>::new(), &ctx).await;

    assert_eq!(
        outcome,
        Err(SearchError::InvalidQuery(QueryError::NoSourcesEnabled))
    );
    assert_eq!(provider.opened(), 0);
}

#[tokio::test]
async fn non_positive_budget_is_rejected() {
    let provider = ScriptedProvider::new();
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let outcome = search_term("kettle", Some(Decimal::ZERO), all_sources(), &ctx).await;

    assert_eq!(
        outcome,
        Err(SearchError::InvalidQuery(QueryError::NonPositiveMaxPrice(
            Decimal::ZERO
        )))
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_discards_results_and_releases_every_session() {
    let provider = ScriptedProvider::new()
        .with_page(SourceId::Noon, NOON_SEARCH)
        .with_hang(SourceId::Namshi)
        .with_hang(SourceId::Amazon);
    let config = fast_config();
    let cancel = CancellationToken::new();
    let ctx = SearchContext {
        provider: &provider,
        config: &config,
        cancel: &cancel,
    };

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = search_term("kettle", None, all_sources(), &ctx).await;

    assert_eq!(outcome, Err(SearchError::Cancelled));
    assert_eq!(provider.opened(), 3);
    assert_eq!(provider.released(), 3);
}
