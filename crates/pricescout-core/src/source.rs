use serde::{Deserialize, Serialize};

/// Identifies one of the fixed retailer sources.
///
/// Declaration order is the source priority used to break ties when ranking
/// and deduplicating: Noon before Namshi before Amazon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Noon,
    Namshi,
    Amazon,
}

impl SourceId {
    /// All sources in priority order.
    pub const ALL: [SourceId; 3] = [SourceId::Noon, SourceId::Namshi, SourceId::Amazon];

    /// Stable lowercase identifier used in exports and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Noon => "noon",
            SourceId::Namshi => "namshi",
            SourceId::Amazon => "amazon",
        }
    }

    /// Human-facing storefront name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::Noon => "Noon.com",
            SourceId::Namshi => "Namshi.com",
            SourceId::Amazon => "Amazon.ae",
        }
    }

    /// Registrable domain that product links must belong to.
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            SourceId::Noon => "noon.com",
            SourceId::Namshi => "namshi.com",
            SourceId::Amazon => "amazon.ae",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noon" => Ok(SourceId::Noon),
            "namshi" => Ok(SourceId::Namshi),
            "amazon" => Ok(SourceId::Amazon),
            other => Err(format!("unknown source: {other}")),
        }
    }
}
