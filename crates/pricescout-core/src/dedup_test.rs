use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::*;
use crate::{apply_budget, Product, Query, SourceError, SourceResult};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn product(source: SourceId, title: &str, price: Option<&str>, slug: &str) -> Product {
    Product {
        source,
        title: title.to_string(),
        price_text: price.map_or_else(String::new, |p| format!("AED {p}")),
        price_value: price.map(dec),
        currency: "AED".to_string(),
        url: format!("https://www.{}/{slug}", source.domain()),
        image_url: None,
        rating: None,
        review_count: None,
        brand: None,
        delivery_info: None,
        in_stock: None,
        discount_info: None,
    }
}

fn unbudgeted(products: Vec<Product>) -> Vec<FilteredProduct> {
    apply_budget(products, None)
}

fn titles(items: &[FilteredProduct]) -> Vec<(SourceId, String)> {
    items
        .iter()
        .map(|p| (p.product.source, p.product.title.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// similarity helpers
// ---------------------------------------------------------------------------

#[test]
fn title_tokens_strip_case_and_punctuation() {
    let tokens = title_tokens("Apple iPhone-15 Pro, 128GB (Black)");
    let expected: BTreeSet<String> = ["apple", "iphone", "15", "pro", "128gb", "black"]
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(tokens, expected);
}

#[test]
fn jaccard_of_near_identical_titles() {
    let a = title_tokens("Apple iPhone 15 Pro 128GB");
    let b = title_tokens("Apple iPhone 15 Pro 128GB Black");
    let score = jaccard(&a, &b);
    assert!((score - 5.0 / 6.0).abs() < 1e-9, "score was {score}");
}

#[test]
fn jaccard_of_empty_sets_is_zero() {
    assert!(jaccard(&BTreeSet::new(), &BTreeSet::new()).abs() < f64::EPSILON);
}

#[test]
fn price_tolerance_is_relative_to_lower_price() {
    let tol = dec("0.05");
    assert!(prices_within_tolerance(dec("1000"), dec("1050"), tol));
    assert!(!prices_within_tolerance(dec("1000"), dec("1051"), tol));
    assert!(prices_within_tolerance(dec("1050"), dec("1000"), tol));
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn duplicate_keeps_cheapest_listing() {
    let listings = unbudgeted(vec![
        product(SourceId::Noon, "Sony WH-1000XM5 Wireless Headphones", Some("1199"), "a"),
        product(SourceId::Amazon, "Sony WH-1000XM5 Wireless Headphones", Some("1149"), "b"),
    ]);
    let outcome = merge_listings(listings, &DedupConfig::default());

    assert_eq!(outcome.merged.len(), 1);
    assert_eq!(outcome.merged[0].product.source, SourceId::Amazon);
    assert_eq!(outcome.duplicates.len(), 1);
    assert_eq!(outcome.duplicates[0].kept_source, SourceId::Amazon);
    assert_eq!(outcome.duplicates[0].dropped.product.source, SourceId::Noon);
}

#[test]
fn equal_prices_break_ties_by_source_priority() {
    let listings = unbudgeted(vec![
        product(SourceId::Amazon, "Dyson V15 Detect Vacuum", Some("2999"), "a"),
        product(SourceId::Namshi, "Dyson V15 Detect Vacuum", Some("2999"), "b"),
    ]);
    let outcome = merge_listings(listings, &DedupConfig::default());

    assert_eq!(outcome.merged.len(), 1);
    assert_eq!(outcome.merged[0].product.source, SourceId::Namshi);
}

#[test]
fn same_source_listings_are_never_merged() {
    let listings = unbudgeted(vec![
        product(SourceId::Noon, "Apple AirPods Pro 2", Some("899"), "a"),
        product(SourceId::Noon, "Apple AirPods Pro 2", Some("899"), "b"),
    ]);
    let outcome = merge_listings(listings, &DedupConfig::default());
    assert_eq!(outcome.merged.len(), 2);
    assert!(outcome.duplicates.is_empty());
}

#[test]
fn similar_titles_with_distant_prices_are_kept() {
    let listings = unbudgeted(vec![
        product(SourceId::Noon, "Apple iPhone 15 Pro 128GB", Some("2999"), "a"),
        product(SourceId::Amazon, "Apple iPhone 15 Pro 128GB Black", Some("3199"), "b"),
    ]);
    let outcome = merge_listings(listings, &DedupConfig::default());
    assert_eq!(outcome.merged.len(), 2);
}

#[test]
fn unpriced_listings_never_match() {
    let listings = unbudgeted(vec![
        product(SourceId::Noon, "Kindle Paperwhite", None, "a"),
        product(SourceId::Amazon, "Kindle Paperwhite", None, "b"),
    ]);
    let outcome = merge_listings(listings, &DedupConfig::default());
    assert_eq!(outcome.merged.len(), 2);
}

#[test]
fn over_budget_listings_are_excluded_from_merged() {
    let listings = apply_budget(
        vec![
            product(SourceId::Noon, "Galaxy S24", Some("2800"), "a"),
            product(SourceId::Amazon, "Galaxy S24 Ultra", Some("4500"), "b"),
            product(SourceId::Namshi, "Galaxy Buds", None, "c"),
        ],
        Some(dec("3000")),
    );
    let outcome = merge_listings(listings, &DedupConfig::default());
    assert_eq!(
        titles(&outcome.merged),
        vec![
            (SourceId::Noon, "Galaxy S24".to_string()),
            (SourceId::Namshi, "Galaxy Buds".to_string()),
        ]
    );
    assert!(outcome.merged[0].within_budget);
    assert!(!outcome.merged[1].within_budget);
}

#[test]
fn ranking_is_by_price_with_unknown_last() {
    let listings = unbudgeted(vec![
        product(SourceId::Noon, "Kettle steel", None, "a"),
        product(SourceId::Noon, "Toaster two slice", Some("150"), "b"),
        product(SourceId::Amazon, "Blender pro", Some("90"), "c"),
        product(SourceId::Namshi, "Mixer stand", None, "d"),
        product(SourceId::Namshi, "Air fryer", Some("300"), "e"),
    ]);
    let outcome = merge_listings(listings, &DedupConfig::default());
    let order: Vec<&str> = outcome
        .merged
        .iter()
        .map(|p| p.product.title.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "Blender pro",
            "Toaster two slice",
            "Air fryer",
            "Kettle steel",
            "Mixer stand"
        ]
    );
}

#[test]
fn merge_is_idempotent() {
    let config = DedupConfig::default();
    let listings = apply_budget(
        vec![
            product(SourceId::Noon, "Apple Watch Series 9 45mm", Some("1699"), "a"),
            product(SourceId::Amazon, "Apple Watch Series 9 45mm", Some("1650"), "b"),
            product(SourceId::Namshi, "Apple Watch Sport Band", Some("199"), "c"),
            product(SourceId::Noon, "Apple Watch Charger", None, "d"),
            product(SourceId::Amazon, "Apple Watch Ultra 2", Some("3299"), "e"),
            product(SourceId::Noon, "Apple Watch Sport Band", Some("199"), "f"),
        ],
        Some(dec("2000")),
    );
    let first = merge_listings(listings, &config);
    let second = merge_listings(first.merged.clone(), &config);

    assert_eq!(first.merged, second.merged);
    assert!(second.duplicates.is_empty());
}

#[test]
fn merge_is_independent_of_source_order() {
    let config = DedupConfig::default();
    let noon = unbudgeted(vec![
        product(SourceId::Noon, "Nike Air Max 90", Some("549"), "a"),
        product(SourceId::Noon, "Nike Air Force 1", Some("449"), "b"),
    ]);
    let namshi = unbudgeted(vec![
        product(SourceId::Namshi, "Nike Air Max 90", Some("539"), "c"),
        product(SourceId::Namshi, "Nike Air Force 1", Some("449"), "d"),
    ]);
    let amazon = unbudgeted(vec![product(SourceId::Amazon, "Nike Dunk Low", Some("449"), "e")]);

    let forward: Vec<FilteredProduct> = noon
        .iter()
        .chain(&namshi)
        .chain(&amazon)
        .cloned()
        .collect();
    let backward: Vec<FilteredProduct> = amazon
        .iter()
        .chain(&namshi)
        .chain(&noon)
        .cloned()
        .collect();

    let a = merge_listings(forward, &config);
    let b = merge_listings(backward, &config);
    assert_eq!(a.merged, b.merged);
    assert_eq!(
        titles(&a.merged),
        vec![
            (SourceId::Noon, "Nike Air Force 1".to_string()),
            (SourceId::Amazon, "Nike Dunk Low".to_string()),
            (SourceId::Namshi, "Nike Air Max 90".to_string()),
        ]
    );
}

#[test]
fn merge_reads_products_from_source_results() {
    let query = Query::new("headphones", None, SourceId::ALL).unwrap();
    let mut results = BTreeMap::new();
    results.insert(
        SourceId::Noon,
        SourceResult::completed(
            SourceId::Noon,
            query.clone(),
            unbudgeted(vec![product(SourceId::Noon, "Bose QC45", Some("999"), "a")]),
        ),
    );
    results.insert(
        SourceId::Amazon,
        SourceResult::failed(SourceId::Amazon, query, SourceError::Blocked),
    );

    let outcome = merge(&results, &DedupConfig::default());
    assert_eq!(outcome.merged.len(), 1);
    assert_eq!(outcome.merged[0].product.title, "Bose QC45");
}
