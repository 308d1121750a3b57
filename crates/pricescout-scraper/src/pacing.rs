//! Human-like pacing and per-session presentation randomization.

use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

const VIEWPORTS: [(u32, u32); 5] = [
    (1920, 1080),
    (1536, 864),
    (1440, 900),
    (1366, 768),
    (1280, 800),
];

/// Presentation parameters for one fetcher session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub headless: bool,
}

impl BrowserProfile {
    /// Pick a user-agent and viewport at random.
    #[must_use]
    pub fn randomized(headless: bool) -> Self {
        let mut rng = rand::rng();
        let user_agent = USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0]);
        let viewport = VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]);
        Self {
            user_agent: (*user_agent).to_string(),
            viewport,
            headless,
        }
    }
}

/// Random delay range applied before each page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    /// A range of `min_ms..=max_ms`. Bounds are swapped if given inverted.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min: Duration::from_millis(lo),
            max: Duration::from_millis(hi),
        }
    }

    /// No pacing at all.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::trace!(delay = ?delay, "pacing before next fetch");
            tokio::time::sleep(delay).await;
        }
    }
}
