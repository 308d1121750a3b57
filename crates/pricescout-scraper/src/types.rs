//! Source-native listing data as lifted from a search results page.
//!
//! Every field is the trimmed text (or attribute value) found by the
//! matching selector. Nothing is parsed here; prices, ratings, and links are
//! interpreted by [`crate::normalize`].

/// One product card extracted from a results page.
///
/// `title` and `price_text` are mandatory: a card missing either is skipped
/// during extraction rather than represented here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub price_text: String,
    /// `href` of the listing link, possibly relative.
    pub href: Option<String>,
    pub image_src: Option<String>,
    /// e.g. `4.6 out of 5 stars` or `4.3`.
    pub rating_text: Option<String>,
    /// e.g. `91,260 ratings` or `(1.2K)`.
    pub review_text: Option<String>,
    pub brand: Option<String>,
    pub delivery_text: Option<String>,
    pub availability_text: Option<String>,
    /// e.g. `(7% off)`.
    pub discount_text: Option<String>,
}
