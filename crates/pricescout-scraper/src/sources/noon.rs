use pricescout_core::SourceId;

use super::SourceProfile;
use crate::normalize::AED_LOCALE;
use crate::strategy::{FieldSelectors, ParseStrategy};

const TITLE: &[&str] = &[
    "[data-qa='plp-product-box-name']",
    "[class*='ProductDetailsSection_title']",
    "h2[title]",
    "h2",
    "[class*='title']",
];

const PRICE: &[&str] = &[
    "[data-qa='plp-product-box-price'] strong",
    "[class*='Price_amount']",
    "[class*='sellingPrice'] strong",
    "[class*='price'] strong",
];

const LINK: &[&str] = &[
    "a[class*='ProductBoxLinkHandler_productBoxLink']",
    "a[href*='/p/']",
    "a[href*='/uae-en/']",
];

const IMAGE: &[&str] = &["img[src*='nooncdn']", "img"];

const RATING: &[&str] = &[
    "[class*='RatingPreviewStar_textCtr']",
    "[class*='RatingPreview'] [class*='textCtr']",
];

const REVIEWS: &[&str] = &["[class*='RatingPreviewStar_countText']"];

const DELIVERY: &[&str] = &["[class*='EstimatedDelivery']", "[data-qa*='delivery']"];

const FIELDS: FieldSelectors = FieldSelectors {
    title: TITLE,
    price: PRICE,
    price_fraction: None,
    link: LINK,
    image: IMAGE,
    rating: RATING,
    review_count: REVIEWS,
    brand: &[],
    delivery: DELIVERY,
    availability: &[],
    discount: &[],
};

pub(super) static PROFILE: SourceProfile = SourceProfile {
    source: SourceId::Noon,
    base_url: "https://www.noon.com/",
    search_path: "/uae-en/search",
    query_param: "q",
    extra_params: &[],
    strategies: &[
        ParseStrategy {
            name: "noon/plp-product-box",
            container: "[data-qa='plp-product-box']",
            fields: FIELDS,
        },
        ParseStrategy {
            name: "noon/link-wrapper",
            container: "[class*='ProductBoxLinkHandler_linkWrapper']",
            fields: FIELDS,
        },
        ParseStrategy {
            name: "noon/product-link",
            container: "a[class*='ProductBoxLinkHandler_productBoxLink']",
            fields: FIELDS,
        },
    ],
    locale: &AED_LOCALE,
    prefix_brand: false,
};
