//! Plain HTTP page fetcher backed by `reqwest`.
//!
//! Pages are fetched without script execution, so the `headless` option has
//! no effect here. Each session gets its own client carrying the session's
//! user-agent.

use std::time::Duration;

use async_trait::async_trait;
use pricescout_core::SourceId;
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, StatusCode};

use super::{looks_like_bot_challenge, FetchOptions, FetchResponse, FetcherProvider, PageFetcher};
use crate::error::ScraperError;
use crate::pacing::BrowserProfile;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

#[derive(Debug, Clone)]
pub struct HttpFetcherProvider {
    connect_timeout: Duration,
}

impl HttpFetcherProvider {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for HttpFetcherProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl FetcherProvider for HttpFetcherProvider {
    async fn open(
        &self,
        source: SourceId,
        profile: &BrowserProfile,
    ) -> Result<Box<dyn PageFetcher>, ScraperError> {
        let client = Client::builder()
            .user_agent(profile.user_agent.as_str())
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| ScraperError::SessionUnavailable {
                site: source,
                reason: e.to_string(),
            })?;
        tracing::debug!(
            source = %source,
            user_agent = %profile.user_agent,
            viewport_width = profile.viewport.0,
            viewport_height = profile.viewport.1,
            "opened http fetcher session"
        );
        Ok(Box::new(HttpFetcher {
            client,
            source,
            viewport_width: profile.viewport.0,
        }))
    }
}

pub struct HttpFetcher {
    client: Client,
    source: SourceId,
    viewport_width: u32,
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&mut self, url: &str, options: &FetchOptions) -> FetchResponse {
        let mut request = self
            .client
            .get(url)
            .timeout(options.timeout)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_EN)
            .header("Viewport-Width", HeaderValue::from(self.viewport_width));
        if let Some(referer) = &options.referer {
            request = request.header(REFERER, referer.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                // Connection failures are reported alongside timeouts: the
                // page could not be obtained within the deadline.
                tracing::debug!(source = %self.source, url, error = %err, "request failed");
                return FetchResponse::timeout();
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(source = %self.source, url, error = %err, "failed reading body");
                return FetchResponse::timeout();
            }
        };

        classify_response(status, body)
    }

    async fn close(&mut self) {
        tracing::debug!(source = %self.source, "closing http fetcher session");
    }
}

fn classify_response(status: StatusCode, body: String) -> FetchResponse {
    if status == StatusCode::FORBIDDEN {
        return FetchResponse::blocked();
    }
    if (status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE)
        && looks_like_bot_challenge(&body)
    {
        return FetchResponse::blocked();
    }
    if status.is_success() {
        return FetchResponse::success(body);
    }
    FetchResponse::http_error(status.as_u16())
}
