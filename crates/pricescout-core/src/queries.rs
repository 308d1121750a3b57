use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::{ConfigError, SourceId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("search term is empty")]
    EmptyTerm,

    #[error("max price must be positive, got {0}")]
    NonPositiveMaxPrice(Decimal),

    #[error("malformed max price \"{0}\"")]
    MalformedMaxPrice(String),

    #[error("no sources enabled")]
    NoSourcesEnabled,

    #[error("line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
}

/// A validated search request.
///
/// Fields are private so a `Query` can only exist with a non-empty term, a
/// positive budget (when set), and at least one enabled source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    term: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    max_price: Option<Decimal>,
    sources: BTreeSet<SourceId>,
}

impl Query {
    /// Build a query, trimming the term.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the term is blank, the budget is zero or
    /// negative, or `sources` is empty.
    pub fn new(
        term: &str,
        max_price: Option<Decimal>,
        sources: impl IntoIterator<Item = SourceId>,
    ) -> Result<Self, QueryError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(QueryError::EmptyTerm);
        }
        if let Some(price) = max_price {
            if price <= Decimal::ZERO {
                return Err(QueryError::NonPositiveMaxPrice(price));
            }
        }
        let sources: BTreeSet<SourceId> = sources.into_iter().collect();
        if sources.is_empty() {
            return Err(QueryError::NoSourcesEnabled);
        }
        Ok(Self {
            term: term.to_string(),
            max_price,
            sources,
        })
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn max_price(&self) -> Option<Decimal> {
        self.max_price
    }

    /// Enabled sources in priority order.
    pub fn sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().copied()
    }
}

/// An unvalidated `(term, max_price)` pair read from a query list or the
/// command line. Sources are attached when it becomes a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub term: String,
    pub max_price: Option<Decimal>,
}

impl QuerySpec {
    /// Parse `term` or `term,max_price`.
    ///
    /// The budget is split on the last comma so terms may contain commas as
    /// long as a price follows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] for a blank term or a budget that is not a
    /// positive decimal.
    pub fn parse(line: &str) -> Result<Self, QueryError> {
        let (term, max_price) = match line.rsplit_once(',') {
            Some((term, raw_price)) if !raw_price.trim().is_empty() => {
                (term, Some(parse_max_price(raw_price)?))
            }
            Some((term, _)) => (term, None),
            None => (line, None),
        };
        let term = term.trim();
        if term.is_empty() {
            return Err(QueryError::EmptyTerm);
        }
        Ok(Self {
            term: term.to_string(),
            max_price,
        })
    }

    /// Attach enabled sources, validating the combination.
    ///
    /// # Errors
    ///
    /// See [`Query::new`].
    pub fn into_query(
        self,
        sources: impl IntoIterator<Item = SourceId>,
    ) -> Result<Query, QueryError> {
        Query::new(&self.term, self.max_price, sources)
    }
}

/// Parse a user-supplied budget such as `3000` or `2499.50`.
///
/// # Errors
///
/// Returns [`QueryError::MalformedMaxPrice`] when the value is not a decimal
/// and [`QueryError::NonPositiveMaxPrice`] when it is zero or negative.
pub fn parse_max_price(raw: &str) -> Result<Decimal, QueryError> {
    let trimmed = raw.trim();
    let price = Decimal::from_str(trimmed)
        .map_err(|_| QueryError::MalformedMaxPrice(trimmed.to_string()))?;
    if price <= Decimal::ZERO {
        return Err(QueryError::NonPositiveMaxPrice(price));
    }
    Ok(price)
}

/// Parse a line-oriented query list.
///
/// Blank lines and lines starting with `#` are skipped. Each remaining line
/// is `term` or `term,max_price`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidLine`] naming the first bad line (1-based).
pub fn parse_queries(text: &str) -> Result<Vec<QuerySpec>, QueryError> {
    let mut specs = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let spec = QuerySpec::parse(line).map_err(|e| QueryError::InvalidLine {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        specs.push(spec);
    }
    Ok(specs)
}

/// Read and parse a query list file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or a line is invalid.
pub fn load_queries(path: &Path) -> Result<Vec<QuerySpec>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::QueryFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let specs = parse_queries(&content).map_err(|e| ConfigError::QueryFileParse {
        path: path.display().to_string(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), count = specs.len(), "loaded query list");
    Ok(specs)
}

#[cfg(test)]
#[path = "queries_test.rs"]
mod tests;
