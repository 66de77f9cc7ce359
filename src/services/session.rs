//! Session bundle: one identity, one proxy entry, one live HTTP client.
//!
//! A session is immutable once created. On a block verdict the whole bundle
//! is discarded and a fresh one is built with a new identity and the next
//! proxy in rotation; sessions are never patched in place. At most one
//! session is live per run.

use crate::error::Result;
use crate::models::{FetcherConfig, ProxyEntry};
use crate::services::identity::ClientIdentity;
use crate::services::proxy::ProxyRotator;
use crate::utils::http::create_client;

/// A live fetching session.
#[derive(Debug)]
pub struct Session {
    identity: ClientIdentity,
    proxy: ProxyEntry,
    client: reqwest::Client,
}

impl Session {
    /// Open a fresh session: randomized identity, next proxy in rotation.
    pub fn open(config: &FetcherConfig, rotator: &mut ProxyRotator) -> Result<Self> {
        let identity = ClientIdentity::randomized();
        let proxy = rotator.next();
        let client = create_client(config, &identity, &proxy)?;

        log::debug!(
            "session opened: proxy={}, ua={}",
            proxy.label(),
            identity.user_agent
        );

        Ok(Self {
            identity,
            proxy,
            client,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn proxy(&self) -> &ProxyEntry {
        &self.proxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_advances_the_rotation() {
        let config = FetcherConfig::default();
        let pool = vec![ProxyEntry::direct(), ProxyEntry::direct()];
        let mut rotator = ProxyRotator::new(pool).unwrap();

        let _first = Session::open(&config, &mut rotator).unwrap();
        let _second = Session::open(&config, &mut rotator).unwrap();
        assert_eq!(rotator.cursor(), 2);
    }
}
