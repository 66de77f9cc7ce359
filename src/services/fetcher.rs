//! Page fetching.
//!
//! `PageFetcher` is the seam between the retrieval pipeline and whatever
//! actually talks to the mapping service. The shipped implementation uses a
//! plain HTTP client and relies on the service embedding its state document
//! in the server-rendered page; a full-rendering browser implementation can
//! be slotted in behind the same trait.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::models::FetcherConfig;
use crate::services::session::Session;

/// Fetched page content plus the resolved final URL.
///
/// Transport failures are captured into `error`, never propagated: the block
/// classifier decides what they mean for the session.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub content: Option<String>,
    pub final_url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl RawPage {
    /// A page representing a transport-level failure.
    pub fn transport_error(url: &str, message: impl Into<String>) -> Self {
        Self {
            content: None,
            final_url: url.to_string(),
            status: None,
            error: Some(message.into()),
        }
    }
}

/// Capability of turning a URL and a live session into page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, session: &Session, url: &str) -> RawPage;
}

/// HTTP fetcher over the session's client.
pub struct HttpFetcher {
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            delay_min_ms: config.delay_min_ms,
            delay_max_ms: config.delay_max_ms,
        }
    }

    /// Randomized inter-request pause, applied on every fetch call to avoid
    /// request-rate fingerprinting.
    async fn pause(&self) {
        let ms = rand::thread_rng().gen_range(self.delay_min_ms..=self.delay_max_ms);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, session: &Session, url: &str) -> RawPage {
        self.pause().await;

        let response = match session.client().get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return RawPage {
                    content: None,
                    final_url: url.to_string(),
                    status: e.status().map(|s| s.as_u16()),
                    error: Some(e.to_string()),
                };
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        match response.text().await {
            Ok(text) => RawPage {
                content: Some(text),
                final_url,
                status: Some(status),
                error: None,
            },
            Err(e) => RawPage {
                content: None,
                final_url,
                status: Some(status),
                error: Some(e.to_string()),
            },
        }
    }
}
