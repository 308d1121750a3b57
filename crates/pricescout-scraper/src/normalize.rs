//! Conversion of source-native [`RawEntry`] values into unified [`Product`]s.

use pricescout_core::{Product, SourceId};
use regex::Regex;
use reqwest::Url;
use rust_decimal::Decimal;

use crate::error::NormalizeError;
use crate::strategy::collapse_whitespace;
use crate::types::RawEntry;

const MAX_TITLE_CHARS: usize = 150;
const MAX_DELIVERY_CHARS: usize = 120;

/// Number formatting rules for a storefront's prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLocale {
    pub thousands_separator: char,
    pub decimal_separator: char,
    /// Currency markers that may appear around the amount.
    pub currency_markers: &'static [&'static str],
}

/// UAE dirham formatting: `AED 2,999.00` or `د.إ 2,999.00`.
pub const AED_LOCALE: PriceLocale = PriceLocale {
    thousands_separator: ',',
    decimal_separator: '.',
    currency_markers: &["AED", "د.إ"],
};

impl PriceLocale {
    fn amount_pattern(&self) -> Regex {
        let thousands = regex::escape(&self.thousands_separator.to_string());
        let decimal = regex::escape(&self.decimal_separator.to_string());
        let pattern = format!(r"\d(?:[\d{thousands}]*\d)?(?:{decimal}\d+)?");
        Regex::new(&pattern).expect("escaped separators form a valid pattern")
    }

    fn has_currency_marker(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        self.currency_markers
            .iter()
            .any(|marker| upper.contains(&marker.to_uppercase()))
    }
}

/// Parse the first amount in `text`, ignoring currency markers and
/// thousands separators.
#[must_use]
pub fn parse_price(text: &str, locale: &PriceLocale) -> Option<Decimal> {
    let amount = locale.amount_pattern().find(text)?.as_str();
    let canonical: String = amount
        .chars()
        .filter(|c| *c != locale.thousands_separator)
        .map(|c| if c == locale.decimal_separator { '.' } else { c })
        .collect();
    canonical.parse::<Decimal>().ok()
}

/// Render `value` as `"{currency} 1,234.50"` using the locale's separators.
#[must_use]
pub fn format_price(value: Decimal, locale: &PriceLocale, currency: &str) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(locale.thousands_separator);
        }
        grouped.push(*digit);
    }
    format!(
        "{currency} {grouped}{}{fraction}",
        locale.decimal_separator
    )
}

/// Parse `"4.6 out of 5 stars"`, `"8/10"`, or a bare `"4.3"` onto a 0–5 scale.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let scaled = Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:out\s+of|/|من)\s*(\d+(?:\.\d+)?)")
        .expect("valid rating regex");
    let value = if let Some(caps) = scaled.captures(text) {
        let score = parse_float(&caps[1])?;
        let scale = parse_float(&caps[2])?;
        if scale <= 0.0 {
            return None;
        }
        score / scale * 5.0
    } else {
        let bare = Regex::new(r"\d+(?:[.,]\d+)?").expect("valid number regex");
        parse_float(bare.find(text)?.as_str())?
    };
    (0.0..=5.0).contains(&value).then_some(value)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Parse `"91,260 ratings"`, `"(91.2K)"`, or `"(2,345)"`.
#[must_use]
pub fn parse_review_count(text: &str) -> Option<u64> {
    use rust_decimal::prelude::ToPrimitive;

    let pattern = Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kKmM])?").expect("valid review regex");
    let caps = pattern.captures(text)?;
    let number: Decimal = caps[1].replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k" | "K") => Decimal::from(1_000),
        Some("m" | "M") => Decimal::from(1_000_000),
        _ => Decimal::ONE,
    };
    (number * multiplier).round().to_u64()
}

/// Interpret stock wording. `None` when the text says nothing either way.
#[must_use]
pub fn parse_availability(text: &str) -> Option<bool> {
    let lowered = text.to_lowercase();
    let negative = ["out of stock", "unavailable", "sold out", "not available"];
    if negative.iter().any(|m| lowered.contains(m)) {
        return Some(false);
    }
    let positive = ["in stock", "left in stock", "only", "available"];
    if positive.iter().any(|m| lowered.contains(m)) {
        return Some(true);
    }
    None
}

/// Whether `url`'s host is `domain` or one of its subdomains.
#[must_use]
pub fn is_on_domain(url: &Url, domain: &str) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

/// Resolve a listing link against `base`, requiring the result to stay on
/// `domain`. Fragments are dropped.
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidUrl`] when the link cannot be resolved
/// to an http(s) URL and [`NormalizeError::ForeignUrl`] when it leaves the
/// domain.
pub fn resolve_listing_url(href: &str, base: &Url, domain: &str) -> Result<String, NormalizeError> {
    let mut url = base.join(href.trim()).map_err(|e| NormalizeError::InvalidUrl {
        href: href.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(NormalizeError::InvalidUrl {
            href: href.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    if !is_on_domain(&url, domain) {
        return Err(NormalizeError::ForeignUrl {
            url: url.to_string(),
            domain: domain.to_string(),
        });
    }
    url.set_fragment(None);
    Ok(url.to_string())
}

fn resolve_image_url(src: &str, base: &Url) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    let url = base.join(src).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// Everything the normalizer needs to know about the source being read.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub source: SourceId,
    /// Base for resolving relative links, normally the storefront root.
    pub base_url: &'a Url,
    /// Used as the listing URL when a card carries no link.
    pub fallback_url: &'a str,
    pub currency: &'a str,
    pub locale: &'a PriceLocale,
    /// Prefix the brand onto titles that omit it.
    pub prefix_brand: bool,
}

/// Turn one raw entry into a [`Product`].
///
/// # Errors
///
/// Returns [`NormalizeError`] when the price has no number in it or the
/// listing link is unusable. Callers drop the entry.
pub fn normalize(raw: RawEntry, ctx: &NormalizeContext<'_>) -> Result<Product, NormalizeError> {
    let brand = raw
        .brand
        .as_deref()
        .map(collapse_whitespace)
        .filter(|b| !b.is_empty());

    let mut title = collapse_whitespace(&raw.title);
    if ctx.prefix_brand {
        if let Some(brand) = &brand {
            if !title.to_lowercase().contains(&brand.to_lowercase()) {
                title = format!("{brand} {title}");
            }
        }
    }
    let title = truncate_chars(&title, MAX_TITLE_CHARS);

    let raw_price = collapse_whitespace(&raw.price_text);
    let Some(price_value) = parse_price(&raw_price, ctx.locale) else {
        return Err(NormalizeError::UnparsablePrice {
            title,
            price_text: raw_price,
        });
    };
    let price_text = if ctx.locale.has_currency_marker(&raw_price) {
        raw_price
    } else {
        format_price(price_value, ctx.locale, ctx.currency)
    };

    let url = match raw.href.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        Some(href) => resolve_listing_url(href, ctx.base_url, ctx.source.domain())?,
        None => ctx.fallback_url.to_string(),
    };

    Ok(Product {
        source: ctx.source,
        title,
        price_text,
        price_value: Some(price_value),
        currency: ctx.currency.to_string(),
        url,
        image_url: raw
            .image_src
            .as_deref()
            .and_then(|src| resolve_image_url(src, ctx.base_url)),
        rating: raw.rating_text.as_deref().and_then(parse_rating),
        review_count: raw.review_text.as_deref().and_then(parse_review_count),
        brand,
        delivery_info: raw
            .delivery_text
            .as_deref()
            .map(collapse_whitespace)
            .filter(|d| !d.is_empty() && d.chars().count() <= MAX_DELIVERY_CHARS),
        in_stock: raw.availability_text.as_deref().and_then(parse_availability),
        discount_info: raw
            .discount_text
            .as_deref()
            .map(collapse_whitespace)
            .filter(|d| !d.is_empty()),
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
