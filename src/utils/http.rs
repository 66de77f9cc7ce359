// src/utils/http.rs

//! HTTP client construction.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::Result;
use crate::models::{FetcherConfig, ProxyEntry};
use crate::services::ClientIdentity;

/// Create a configured asynchronous HTTP client bound to one identity and
/// one proxy entry. Redirects stay enabled: the resolved final URL is part
/// of block classification.
pub fn create_client(
    config: &FetcherConfig,
    identity: &ClientIdentity,
    proxy: &ProxyEntry,
) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&identity.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    let mut builder = reqwest::Client::builder()
        .user_agent(&identity.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(url) = proxy.url() {
        let mut upstream = reqwest::Proxy::all(&url)?;
        if let (Some(user), Some(pass)) = (&proxy.user, &proxy.pass) {
            upstream = upstream.basic_auth(user, pass);
        }
        builder = builder.proxy(upstream);
    }

    Ok(builder.build()?)
}
