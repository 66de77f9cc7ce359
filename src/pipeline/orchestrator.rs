//! Per-address retrieval state machine.
//!
//! Drives one address through fetch, classification and extraction. A block
//! or transient verdict discards the current session and retries with a
//! fresh identity and the next proxy, inside an explicit bounded loop; the
//! ceiling converts a persistent block into a terminal retrieval instead of
//! spinning forever.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::models::{Config, Entrance};
use crate::services::{PageFetcher, ProxyRotator, Session, Verdict, classify, extract};
use crate::utils::build_search_url;

/// Terminal outcome of retrieving one address.
#[derive(Debug)]
pub struct Retrieval {
    pub address: String,

    /// The constructed search URL.
    pub search_url: String,

    /// The URL the service resolved to on the last attempt.
    pub final_url: String,

    /// Deduplicated entrances in first-seen order; empty on failure.
    pub entrances: Vec<Entrance>,

    /// Raw parsed embedded document, when one was obtained.
    pub document: Option<Value>,

    /// Number of fetch attempts consumed.
    pub attempts: u32,

    /// True when the retry ceiling was exhausted without a usable page.
    pub exhausted: bool,
}

/// Retrieval driver owning the session lifecycle and the proxy rotation.
pub struct Orchestrator<F: PageFetcher> {
    config: Arc<Config>,
    fetcher: F,
    rotator: ProxyRotator,
    session: Option<Session>,
}

impl<F: PageFetcher> Orchestrator<F> {
    pub fn new(config: Arc<Config>, fetcher: F, rotator: ProxyRotator) -> Self {
        Self {
            config,
            fetcher,
            rotator,
            session: None,
        }
    }

    /// Total sessions opened so far; equals the rotator cursor because every
    /// session takes exactly one rotation step.
    pub fn sessions_opened(&self) -> usize {
        self.rotator.cursor()
    }

    /// Resolve one address into entrances or a terminal failed retrieval.
    ///
    /// Errors only on configuration-level problems (unbuildable URL or
    /// client); everything the serving layer does degrades to retries and
    /// finally to an exhausted retrieval.
    pub async fn resolve(&mut self, address: &str) -> Result<Retrieval> {
        let search_url = build_search_url(&self.config.fetcher, address)?;
        let max_attempts = self.config.fetcher.max_attempts;
        let mut final_url = search_url.clone();

        for attempt in 1..=max_attempts {
            self.ensure_session()?;
            let session = self.session.as_ref().expect("session was just opened");
            let page = self.fetcher.fetch(session, &search_url).await;
            final_url = page.final_url.clone();

            let verdict = classify(&page, &self.config.blocks);
            match verdict {
                Verdict::Ok => {
                    // Absent content is not a block; it simply extracts to
                    // zero entrances.
                    let extraction = page
                        .content
                        .as_deref()
                        .map(|content| extract(content, &self.config.fetcher.state_selector))
                        .unwrap_or_default();

                    return Ok(Retrieval {
                        address: address.to_string(),
                        search_url,
                        final_url,
                        entrances: extraction.entrances,
                        document: extraction.document,
                        attempts: attempt,
                        exhausted: false,
                    });
                }
                verdict => {
                    log::warn!(
                        "{address}: attempt {attempt}/{max_attempts} blocked ({verdict:?}), \
                         rotating session"
                    );
                    self.invalidate_session();
                }
            }
        }

        log::error!("{address}: retry ceiling of {max_attempts} attempts exhausted");
        Ok(Retrieval {
            address: address.to_string(),
            search_url,
            final_url,
            entrances: Vec::new(),
            document: None,
            attempts: max_attempts,
            exhausted: true,
        })
    }

    /// Open a fresh session when none is live.
    fn ensure_session(&mut self) -> Result<()> {
        if self.session.is_none() {
            self.session = Some(Session::open(&self.config.fetcher, &mut self.rotator)?);
        }
        Ok(())
    }

    /// Discard the current session wholesale. The next attempt opens a new
    /// one with a fresh identity and the next proxy.
    fn invalidate_session(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::ProxyEntry;
    use crate::services::RawPage;

    /// Fetcher replaying a fixed script of pages, then a fallback page.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<RawPage>>,
        fallback: RawPage,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<RawPage>, fallback: RawPage) -> Self {
            Self {
                script: Mutex::new(pages.into()),
                fallback,
            }
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, _session: &Session, _url: &str) -> RawPage {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.fetcher.delay_min_ms = 0;
        config.fetcher.delay_max_ms = 0;
        config.proxies = vec![ProxyEntry::direct()];
        Arc::new(config)
    }

    fn captcha_page() -> RawPage {
        RawPage {
            content: Some("checking".into()),
            final_url: "https://yandex.ru/showcaptcha?retpath=x".into(),
            status: Some(302),
            error: None,
        }
    }

    fn ok_page_with_two_entrances() -> RawPage {
        let state = r#"{"stack":[{"response":{"items":[{"entrances":[
            {"name":"1","coordinates":[37.61,55.75],"azimuth":120.0},
            {"name":"2","coordinates":[37.62,55.76]}
        ]}]}}]}"#;
        RawPage {
            content: Some(format!(
                "<html><script type=\"application/json\" class=\"state-view\">{state}</script></html>"
            )),
            final_url: "https://yandex.ru/maps/?text=x".into(),
            status: Some(200),
            error: None,
        }
    }

    fn network_error_page() -> RawPage {
        RawPage::transport_error("https://yandex.ru/maps/?text=x", "connection reset")
    }

    #[tokio::test]
    async fn captcha_rotates_once_then_extracts() {
        let fetcher = ScriptedFetcher::new(
            vec![captcha_page(), ok_page_with_two_entrances()],
            network_error_page(),
        );
        let config = test_config();
        let rotator = ProxyRotator::new(config.proxies.clone()).unwrap();
        let mut orchestrator = Orchestrator::new(config, fetcher, rotator);

        let retrieval = orchestrator.resolve("ул. Ленина, 1").await.unwrap();

        assert!(!retrieval.exhausted);
        assert_eq!(retrieval.attempts, 2);
        assert_eq!(retrieval.entrances.len(), 2);
        assert_eq!(retrieval.entrances[0].porch, "1");
        // One session for the blocked attempt, one fresh after rotation.
        assert_eq!(orchestrator.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn persistent_network_error_exhausts_the_ceiling() {
        let fetcher = ScriptedFetcher::new(Vec::new(), network_error_page());
        let config = test_config();
        let max_attempts = config.fetcher.max_attempts;
        let rotator = ProxyRotator::new(config.proxies.clone()).unwrap();
        let mut orchestrator = Orchestrator::new(config, fetcher, rotator);

        let retrieval = orchestrator.resolve("ул. Ленина, 1").await.unwrap();

        assert!(retrieval.exhausted);
        assert_eq!(retrieval.attempts, max_attempts);
        assert!(retrieval.entrances.is_empty());
        assert!(retrieval.document.is_none());
        assert_eq!(orchestrator.sessions_opened(), max_attempts as usize);
    }

    #[tokio::test]
    async fn ok_with_absent_content_extracts_nothing_without_retrying() {
        let empty_ok = RawPage {
            content: None,
            final_url: "https://yandex.ru/maps/?text=x".into(),
            status: Some(200),
            error: None,
        };
        let fetcher = ScriptedFetcher::new(vec![empty_ok.clone()], empty_ok);
        let config = test_config();
        let rotator = ProxyRotator::new(config.proxies.clone()).unwrap();
        let mut orchestrator = Orchestrator::new(config, fetcher, rotator);

        let retrieval = orchestrator.resolve("addr").await.unwrap();

        assert!(!retrieval.exhausted);
        assert_eq!(retrieval.attempts, 1);
        assert!(retrieval.entrances.is_empty());
        assert_eq!(orchestrator.sessions_opened(), 1);
    }

    #[tokio::test]
    async fn session_survives_across_addresses_when_not_blocked() {
        let fetcher = ScriptedFetcher::new(Vec::new(), ok_page_with_two_entrances());
        let config = test_config();
        let rotator = ProxyRotator::new(config.proxies.clone()).unwrap();
        let mut orchestrator = Orchestrator::new(config, fetcher, rotator);

        orchestrator.resolve("first").await.unwrap();
        orchestrator.resolve("second").await.unwrap();
        assert_eq!(orchestrator.sessions_opened(), 1);
    }
}
