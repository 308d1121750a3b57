//! Page fetcher contract.
//!
//! A [`FetcherProvider`] hands each adapter run its own [`PageFetcher`]
//! session. How pages are obtained (plain HTTP, a browser, a fixture) is the
//! implementation's business; adapters only see a [`FetchResponse`].

mod http;

use std::time::Duration;

use async_trait::async_trait;
use pricescout_core::SourceId;

use crate::error::ScraperError;
use crate::pacing::BrowserProfile;

pub use http::{HttpFetcher, HttpFetcherProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    Timeout,
    /// Anti-bot challenge or access denial.
    Blocked,
    HttpError(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: FetchStatus,
    /// Page body; empty unless `status` is `Success`.
    pub html: String,
}

impl FetchResponse {
    #[must_use]
    pub fn success(html: impl Into<String>) -> Self {
        Self {
            status: FetchStatus::Success,
            html: html.into(),
        }
    }

    #[must_use]
    pub fn timeout() -> Self {
        Self::failed(FetchStatus::Timeout)
    }

    #[must_use]
    pub fn blocked() -> Self {
        Self::failed(FetchStatus::Blocked)
    }

    #[must_use]
    pub fn http_error(code: u16) -> Self {
        Self::failed(FetchStatus::HttpError(code))
    }

    fn failed(status: FetchStatus) -> Self {
        Self {
            status,
            html: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub headless: bool,
    pub referer: Option<String>,
}

/// One exclusive fetch session (a browser instance, an HTTP client with its
/// own fingerprint).
#[async_trait]
pub trait PageFetcher: Send {
    async fn fetch(&mut self, url: &str, options: &FetchOptions) -> FetchResponse;

    /// Graceful release at the end of a run.
    async fn close(&mut self) {}

    /// Immediate release when the run is dropped (timeout, cancellation).
    fn abort(&mut self) {}
}

#[async_trait]
pub trait FetcherProvider: Send + Sync {
    /// Open a fresh session presenting `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] when no session can be started.
    async fn open(
        &self,
        source: SourceId,
        profile: &BrowserProfile,
    ) -> Result<Box<dyn PageFetcher>, ScraperError>;
}

/// Scoped ownership of a [`PageFetcher`].
///
/// [`FetchSession::release`] closes the fetcher gracefully. If the session is
/// dropped without being released, as happens when a timed-out or cancelled
/// search future is dropped, the fetcher is aborted instead.
pub struct FetchSession {
    source: SourceId,
    fetcher: Option<Box<dyn PageFetcher>>,
}

impl FetchSession {
    #[must_use]
    pub fn new(source: SourceId, fetcher: Box<dyn PageFetcher>) -> Self {
        Self {
            source,
            fetcher: Some(fetcher),
        }
    }

    /// Fetch through the owned fetcher. A released session reports `Timeout`.
    pub async fn fetch(&mut self, url: &str, options: &FetchOptions) -> FetchResponse {
        match self.fetcher.as_mut() {
            Some(fetcher) => fetcher.fetch(url, options).await,
            None => FetchResponse::timeout(),
        }
    }

    pub async fn release(mut self) {
        if let Some(mut fetcher) = self.fetcher.take() {
            fetcher.close().await;
            tracing::debug!(source = %self.source, "fetcher session released");
        }
    }
}

impl Drop for FetchSession {
    fn drop(&mut self) {
        if let Some(mut fetcher) = self.fetcher.take() {
            fetcher.abort();
            tracing::debug!(source = %self.source, "fetcher session aborted");
        }
    }
}

/// Heuristic check for CAPTCHA, robot-check, and CDN challenge pages.
#[must_use]
pub fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_lowercase();

    if let Some(title) = page_title(&lowered) {
        if title.contains("robot") || title.contains("captcha") || title.contains("access denied")
        {
            return true;
        }
    }

    let has_captcha_form = lowered.contains("/errors/validatecaptcha");
    let has_captcha_prompt = lowered.contains("enter the characters you see below");
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");
    let has_px_captcha = lowered.contains("px-captcha");

    has_captcha_form
        || has_captcha_prompt
        || has_cloudflare_banner
        || has_challenge_platform
        || has_px_captcha
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}

fn page_title(lowered: &str) -> Option<&str> {
    let open = lowered.find("<title")?;
    let start = open + lowered[open..].find('>')? + 1;
    let end = start + lowered[start..].find("</title>")?;
    Some(lowered[start..end].trim())
}
