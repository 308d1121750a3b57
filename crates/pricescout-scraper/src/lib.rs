pub mod adapter;
pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pacing;
pub mod retry;
pub mod search;
pub mod sources;
pub mod strategy;
pub mod types;

pub use adapter::SourceAdapter;
pub use config::ScraperConfig;
pub use error::{NormalizeError, ScraperError, SearchError};
pub use fetch::{
    FetchOptions, FetchResponse, FetchSession, FetchStatus, FetcherProvider, HttpFetcherProvider,
    PageFetcher,
};
pub use pacing::{BrowserProfile, Pacing};
pub use retry::RetryPolicy;
pub use search::{run_search, search_term, SearchContext};
pub use types::RawEntry;
