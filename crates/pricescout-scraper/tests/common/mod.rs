//! In-memory fetcher provider and fixtures shared by the scraper integration
//! tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pricescout_core::SourceId;
use pricescout_scraper::{
    BrowserProfile, FetchOptions, FetchResponse, FetcherProvider, Pacing, PageFetcher,
    RetryPolicy, ScraperConfig, ScraperError,
};

pub const NOON_SEARCH: &str = include_str!("../fixtures/noon_search.html");
pub const NOON_SEARCH_PAGE_2: &str = include_str!("../fixtures/noon_search_page2.html");
pub const NOON_NO_RESULTS: &str = include_str!("../fixtures/noon_no_results.html");
pub const NAMSHI_SEARCH: &str = include_str!("../fixtures/namshi_search.html");
pub const AMAZON_SEARCH: &str = include_str!("../fixtures/amazon_search.html");
pub const AMAZON_SPLIT_PRICE: &str = include_str!("../fixtures/amazon_split_price.html");
pub const AMAZON_CAPTCHA: &str = include_str!("../fixtures/amazon_captcha.html");

/// A config with no pacing and no back-off, so scripted runs finish at once.
pub fn fast_config() -> ScraperConfig {
    ScraperConfig {
        pacing: Pacing::none(),
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            jitter: 0.0,
        },
        ..ScraperConfig::default()
    }
}

enum Script {
    Pages(VecDeque<FetchResponse>),
    /// Every fetch sleeps for an hour.
    Hang,
}

/// Hands out fetchers that replay scripted responses per source, counting
/// every session opened and released.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<SourceId, Script>>,
    refuse: HashSet<SourceId>,
    open_delay: Option<Duration>,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses returned in order; once exhausted every fetch times out.
    pub fn with_pages(self, source: SourceId, pages: Vec<FetchResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(source, Script::Pages(pages.into()));
        self
    }

    pub fn with_page(self, source: SourceId, html: &str) -> Self {
        self.with_pages(source, vec![FetchResponse::success(html)])
    }

    pub fn with_hang(self, source: SourceId) -> Self {
        self.scripts.lock().unwrap().insert(source, Script::Hang);
        self
    }

    /// Fail to open a session for `source`.
    pub fn refusing(mut self, source: SourceId) -> Self {
        self.refuse.insert(source);
        self
    }

    /// Every session takes `delay` to start, like a slow browser launch.
    pub fn opening_slowly(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetcherProvider for ScriptedProvider {
    async fn open(
        &self,
        source: SourceId,
        _profile: &BrowserProfile,
    ) -> Result<Box<dyn PageFetcher>, ScraperError> {
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse.contains(&source) {
            return Err(ScraperError::SessionUnavailable {
                site: source,
                reason: "no browser available".to_string(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .remove(&source)
            .unwrap_or(Script::Pages(VecDeque::new()));
        Ok(Box::new(ScriptedFetcher {
            script,
            released: Arc::clone(&self.released),
            requested: Arc::clone(&self.requested),
            done: false,
        }))
    }
}

struct ScriptedFetcher {
    script: Script,
    released: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<String>>>,
    done: bool,
}

impl ScriptedFetcher {
    fn mark_released(&mut self) {
        if !self.done {
            self.done = true;
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&mut self, url: &str, _options: &FetchOptions) -> FetchResponse {
        self.requested.lock().unwrap().push(url.to_string());
        match &mut self.script {
            Script::Pages(pages) => pages.pop_front().unwrap_or_else(FetchResponse::timeout),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                FetchResponse::timeout()
            }
        }
    }

    async fn close(&mut self) {
        self.mark_released();
    }

    fn abort(&mut self) {
        self.mark_released();
    }
}
