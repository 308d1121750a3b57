//! Ordered CSS-selector strategies for lifting product cards out of a
//! results page.
//!
//! Each source declares several [`ParseStrategy`] values, newest markup
//! first. [`parse_entries`] tries them in order and returns the entries of
//! the first strategy that yields any, so markup drift on one layout falls
//! through to older or more generic selectors.

use scraper::{ElementRef, Html, Selector};

use crate::types::RawEntry;

/// Candidate selectors for each field of a product card, tried in order.
#[derive(Debug, Clone, Copy)]
pub struct FieldSelectors {
    pub title: &'static [&'static str],
    pub price: &'static [&'static str],
    /// Appended as the decimal part of the matched price, for layouts that
    /// split whole and fractional units into separate elements.
    pub price_fraction: Option<&'static str>,
    pub link: &'static [&'static str],
    pub image: &'static [&'static str],
    pub rating: &'static [&'static str],
    pub review_count: &'static [&'static str],
    pub brand: &'static [&'static str],
    pub delivery: &'static [&'static str],
    pub availability: &'static [&'static str],
    /// Only elements whose text reads like a markdown (`%` or `off`) count.
    pub discount: &'static [&'static str],
}

impl FieldSelectors {
    pub const EMPTY: FieldSelectors = FieldSelectors {
        title: &[],
        price: &[],
        price_fraction: None,
        link: &[],
        image: &[],
        rating: &[],
        review_count: &[],
        brand: &[],
        delivery: &[],
        availability: &[],
        discount: &[],
    };
}

#[derive(Debug, Clone, Copy)]
pub struct ParseStrategy {
    pub name: &'static str,
    /// Selector matching one element per product card.
    pub container: &'static str,
    pub fields: FieldSelectors,
}

/// Run `strategies` in order over `html`.
///
/// Returns the winning strategy's name and its entries, or `None` when every
/// strategy yields zero entries.
#[must_use]
pub fn parse_entries(
    html: &str,
    strategies: &[ParseStrategy],
) -> Option<(&'static str, Vec<RawEntry>)> {
    let document = Html::parse_document(html);
    for strategy in strategies {
        let entries = strategy.extract(&document);
        if entries.is_empty() {
            tracing::debug!(strategy = strategy.name, "strategy matched no entries");
            continue;
        }
        return Some((strategy.name, entries));
    }
    None
}

impl ParseStrategy {
    /// Extract every card that has both a title and a price.
    #[must_use]
    pub fn extract(&self, document: &Html) -> Vec<RawEntry> {
        let Some(container) = compile(self.container) else {
            return Vec::new();
        };
        document
            .select(&container)
            .filter_map(|card| self.extract_card(card))
            .collect()
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Option<RawEntry> {
        let f = &self.fields;
        let title = first_text(card, f.title).or_else(|| first_attr(card, f.title, &["title"]))?;
        let mut price_text = first_text(card, f.price)?;
        if let Some(fraction) = f.price_fraction.and_then(|sel| first_text(card, &[sel])) {
            price_text = join_split_price(&price_text, &fraction);
        }

        Some(RawEntry {
            title,
            price_text,
            href: first_attr(card, f.link, &["href"]).or_else(|| enclosing_href(card)),
            image_src: first_attr(card, f.image, &["src", "data-src"]),
            rating_text: first_text(card, f.rating)
                .or_else(|| first_attr(card, f.rating, &["aria-label"])),
            review_text: first_attr(card, f.review_count, &["aria-label"])
                .or_else(|| first_text(card, f.review_count)),
            brand: first_text(card, f.brand),
            delivery_text: first_text(card, f.delivery),
            availability_text: first_text(card, f.availability),
            discount_text: first_text_where(card, f.discount, looks_like_discount),
        })
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            tracing::warn!(selector, error = %err, "invalid selector skipped");
            None
        }
    }
}

/// Collapsed, trimmed text of the first matching element with any text.
fn first_text(card: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = compile(raw)?;
        card.select(&selector).find_map(|el| {
            let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
            (!text.is_empty()).then_some(text)
        })
    })
}

/// Like [`first_text`], but skips matches whose text fails `accept`.
fn first_text_where(
    card: ElementRef<'_>,
    selectors: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = compile(raw)?;
        card.select(&selector).find_map(|el| {
            let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
            (!text.is_empty() && accept(&text)).then_some(text)
        })
    })
}

fn looks_like_discount(text: &str) -> bool {
    text.contains('%') || text.to_lowercase().contains("off")
}

/// First non-empty value of any of `attrs` on an element matching `selectors`.
/// The card itself is considered when it matches.
fn first_attr(card: ElementRef<'_>, selectors: &[&str], attrs: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = compile(raw)?;
        let own = selector.matches(&card).then_some(card);
        own.into_iter()
            .chain(card.select(&selector))
            .find_map(|el| attr_value(el, attrs))
    })
}

fn attr_value(el: ElementRef<'_>, attrs: &[&str]) -> Option<String> {
    attrs.iter().find_map(|name| {
        let value = el.value().attr(name)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// `href` of the card itself or its nearest enclosing anchor.
fn enclosing_href(card: ElementRef<'_>) -> Option<String> {
    std::iter::once(card)
        .chain(card.ancestors().filter_map(ElementRef::wrap))
        .filter(|el| el.value().name() == "a")
        .find_map(|el| attr_value(el, &["href"]))
}

/// `"2,999."` + `"00"` becomes `"2,999.00"`.
fn join_split_price(whole: &str, fraction: &str) -> String {
    let whole = whole.trim().trim_end_matches('.').trim_end();
    let digits: String = fraction.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{digits}")
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
