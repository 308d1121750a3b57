use pricescout_core::SourceId;

use super::SourceProfile;
use crate::normalize::AED_LOCALE;
use crate::strategy::{FieldSelectors, ParseStrategy};

const FIELDS: FieldSelectors = FieldSelectors {
    title: &[
        "[class*='ProductBox_productTitle']",
        "[class*='productTitle']",
        "h2",
        "h3",
    ],
    price: &[
        "[class*='ProductPrice_value']",
        "[class*='sellingPrice'] [class*='value']",
        "[class*='price']",
    ],
    price_fraction: None,
    link: &["a[href*='/buy-']", "a[href*='/uae-en/']"],
    image: &["img[src*='namshi']", "img[src*='cloudfront']", "img"],
    rating: &["[class*='Rating_value']"],
    review_count: &["[class*='Rating_count']"],
    brand: &["[class*='ProductBox_brand']", "[class*='brand']"],
    delivery: &["[class*='DeliveryEstimate']", "[class*='delivery']"],
    availability: &["[class*='OutOfStock']", "[class*='stock']"],
    discount: &["[class*='discount']", "[class*='Discount']"],
};

pub(super) static PROFILE: SourceProfile = SourceProfile {
    source: SourceId::Namshi,
    base_url: "https://www.namshi.com/",
    search_path: "/uae-en/search",
    query_param: "q",
    extra_params: &[],
    strategies: &[
        ParseStrategy {
            name: "namshi/product-box",
            container: "a[class*='ProductBox_productBox']",
            fields: FIELDS,
        },
        ParseStrategy {
            name: "namshi/details-container",
            container: "[class*='ProductBox_detailsContainer']",
            fields: FIELDS,
        },
        ParseStrategy {
            name: "namshi/product-testid",
            container: "[data-testid*='product-box']",
            fields: FIELDS,
        },
        ParseStrategy {
            name: "namshi/product-card",
            container: ".product-card, .product-item",
            fields: FIELDS,
        },
    ],
    locale: &AED_LOCALE,
    prefix_brand: true,
};
