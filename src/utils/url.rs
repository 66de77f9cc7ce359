// src/utils/url.rs

//! Search URL construction.

use url::Url;

use crate::error::Result;
use crate::models::FetcherConfig;

/// Build the address-search URL: the configured endpoint with the address
/// URL-encoded in `text` and the fixed zoom parameter.
pub fn build_search_url(config: &FetcherConfig, address: &str) -> Result<String> {
    let mut url = Url::parse(&config.search_url)?;
    url.query_pairs_mut()
        .append_pair("text", address)
        .append_pair("z", &config.zoom.to_string());
    Ok(url.to_string())
}
