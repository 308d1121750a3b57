use pricescout_core::SourceId;

use super::SourceProfile;
use crate::normalize::AED_LOCALE;
use crate::strategy::{FieldSelectors, ParseStrategy};

const TITLE: &[&str] = &[
    "h2 a span",
    "[data-cy='title-recipe'] h2 span",
    "h2 span",
    ".s-line-clamp-4 span",
];

const LINK: &[&str] = &["h2 a", "a.s-link-style", "a[href*='/dp/']"];

const RATING: &[&str] = &[".a-icon-alt", "[aria-label*='out of 5 stars']"];

const REVIEWS: &[&str] = &["[aria-label*='ratings']", ".s-underline-text"];

const DELIVERY: &[&str] = &["[data-cy='delivery-recipe']", ".udm-delivery-block"];

const AVAILABILITY: &[&str] = &["[class*='stock']", ".a-color-price"];

const DISCOUNT: &[&str] = &[".a-color-secondary", "[class*='discount']"];

/// Full price from the screen-reader text, e.g. `AED 3,199.00`.
const OFFSCREEN_FIELDS: FieldSelectors = FieldSelectors {
    title: TITLE,
    price: &[".a-price .a-offscreen"],
    price_fraction: None,
    link: LINK,
    image: &["img.s-image"],
    rating: RATING,
    review_count: REVIEWS,
    brand: &[],
    delivery: DELIVERY,
    availability: AVAILABILITY,
    discount: DISCOUNT,
};

/// Visible price split across whole and fraction spans.
const SPLIT_PRICE_FIELDS: FieldSelectors = FieldSelectors {
    price: &[".a-price-whole"],
    price_fraction: Some(".a-price-fraction"),
    ..OFFSCREEN_FIELDS
};

pub(super) static PROFILE: SourceProfile = SourceProfile {
    source: SourceId::Amazon,
    base_url: "https://www.amazon.ae/",
    search_path: "/s",
    query_param: "k",
    extra_params: &[("ref", "nb_sb_noss")],
    strategies: &[
        ParseStrategy {
            name: "amazon/search-result",
            container: "[data-component-type='s-search-result']",
            fields: OFFSCREEN_FIELDS,
        },
        ParseStrategy {
            name: "amazon/search-result-split-price",
            container: "[data-component-type='s-search-result']",
            fields: SPLIT_PRICE_FIELDS,
        },
        ParseStrategy {
            name: "amazon/result-item",
            container: ".s-result-item[data-asin]",
            fields: SPLIT_PRICE_FIELDS,
        },
        ParseStrategy {
            name: "amazon/card-container",
            container: ".s-card-container",
            fields: SPLIT_PRICE_FIELDS,
        },
    ],
    locale: &AED_LOCALE,
    prefix_brand: false,
};
