//! Per-retailer search endpoints and selector strategies.

mod amazon;
mod namshi;
mod noon;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use pricescout_core::SourceId;

use crate::normalize::PriceLocale;
use crate::strategy::ParseStrategy;

/// Static description of how to search and read one retailer.
#[derive(Debug)]
pub struct SourceProfile {
    pub source: SourceId,
    /// Storefront root, used to resolve relative links.
    pub base_url: &'static str,
    pub search_path: &'static str,
    pub query_param: &'static str,
    /// Fixed query parameters appended after the term.
    pub extra_params: &'static [(&'static str, &'static str)],
    pub strategies: &'static [ParseStrategy],
    pub locale: &'static PriceLocale,
    /// Titles on this storefront may omit the brand shown beside them.
    pub prefix_brand: bool,
}

impl SourceProfile {
    /// Results URL for `term` on `page` (1-based). Page 1 carries no page
    /// parameter.
    #[must_use]
    pub fn search_url(&self, term: &str, page: u32) -> String {
        let encoded = utf8_percent_encode(term.trim(), NON_ALPHANUMERIC);
        let mut url = format!(
            "{}{}?{}={encoded}",
            self.base_url.trim_end_matches('/'),
            self.search_path,
            self.query_param
        );
        for (key, value) in self.extra_params {
            url.push_str(&format!("&{key}={value}"));
        }
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }
}

/// The profile for `source`.
#[must_use]
pub fn profile(source: SourceId) -> &'static SourceProfile {
    match source {
        SourceId::Noon => &noon::PROFILE,
        SourceId::Namshi => &namshi::PROFILE,
        SourceId::Amazon => &amazon::PROFILE,
    }
}
