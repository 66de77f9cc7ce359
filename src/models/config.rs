//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and fetch behavior settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Proxy pool, cycled round-robin. An entry without a host is a direct
    /// connection. The pool must contain at least one entry.
    #[serde(default = "defaults::proxy_pool", rename = "proxy")]
    pub proxies: Vec<ProxyEntry>,

    /// Block-page detection signatures
    #[serde(default)]
    pub blocks: BlockSignatures,

    /// Nearest-entrance matching settings
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// Output rendering settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.search_url.trim().is_empty() {
            return Err(AppError::validation("fetcher.search_url is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.max_attempts == 0 {
            return Err(AppError::validation("fetcher.max_attempts must be > 0"));
        }
        if self.fetcher.delay_min_ms > self.fetcher.delay_max_ms {
            return Err(AppError::validation(
                "fetcher.delay_min_ms must not exceed fetcher.delay_max_ms",
            ));
        }
        if self.fetcher.state_selector.trim().is_empty() {
            return Err(AppError::validation("fetcher.state_selector is empty"));
        }
        if self.proxies.is_empty() {
            return Err(AppError::validation(
                "proxy pool is empty; add at least one [[proxy]] entry \
                 (an entry without a host is a direct connection)",
            ));
        }
        for (i, entry) in self.proxies.iter().enumerate() {
            entry
                .validate()
                .map_err(|e| AppError::validation(format!("proxy[{i}]: {e}")))?;
        }
        if self.matcher.max_distance_m <= 0.0 {
            return Err(AppError::validation("matcher.max_distance_m must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            proxies: defaults::proxy_pool(),
            blocks: BlockSignatures::default(),
            matcher: MatcherConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// HTTP client and fetch behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Address-search endpoint of the mapping service
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// Fixed zoom parameter appended to every search request
    #[serde(default = "defaults::zoom")]
    pub zoom: u8,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Lower bound of the randomized inter-request delay in milliseconds
    #[serde(default = "defaults::delay_min")]
    pub delay_min_ms: u64,

    /// Upper bound of the randomized inter-request delay in milliseconds
    #[serde(default = "defaults::delay_max")]
    pub delay_max_ms: u64,

    /// Retry ceiling per address, counting the initial attempt
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// CSS selector locating the embedded state document in the page
    #[serde(default = "defaults::state_selector")]
    pub state_selector: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            search_url: defaults::search_url(),
            zoom: defaults::zoom(),
            timeout_secs: defaults::timeout(),
            delay_min_ms: defaults::delay_min(),
            delay_max_ms: defaults::delay_max(),
            max_attempts: defaults::max_attempts(),
            state_selector: defaults::state_selector(),
        }
    }
}

/// One entry of the proxy pool.
///
/// All fields absent means a direct connection. A host requires a port;
/// credentials are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

impl ProxyEntry {
    /// A direct-connection entry.
    pub fn direct() -> Self {
        Self::default()
    }

    /// Whether this entry bypasses any proxy.
    pub fn is_direct(&self) -> bool {
        self.host.is_none()
    }

    /// Proxy URL in `http://host:port` form, if this entry is a proxy.
    pub fn url(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("http://{host}:{port}")),
            _ => None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            _ => "direct".to_string(),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match (&self.host, self.port) {
            (Some(host), _) if host.trim().is_empty() => Err("host is empty".to_string()),
            (Some(_), None) => Err("host given without port".to_string()),
            (None, Some(_)) => Err("port given without host".to_string()),
            _ => Ok(()),
        }
    }
}

/// Substring signatures identifying block pages.
///
/// Kept in configuration so new block signatures can be added without code
/// changes. All matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSignatures {
    /// Markers in the resolved final URL indicating a CAPTCHA challenge
    #[serde(default = "defaults::captcha_url_markers")]
    pub captcha_url_markers: Vec<String>,

    /// Markers in the page content indicating a CAPTCHA challenge
    #[serde(default = "defaults::captcha_content_markers")]
    pub captcha_content_markers: Vec<String>,

    /// Phrases in the page content indicating a "browser outdated" interstitial
    #[serde(default = "defaults::outdated_phrases")]
    pub outdated_phrases: Vec<String>,
}

impl Default for BlockSignatures {
    fn default() -> Self {
        Self {
            captcha_url_markers: defaults::captcha_url_markers(),
            captcha_content_markers: defaults::captcha_content_markers(),
            outdated_phrases: defaults::outdated_phrases(),
        }
    }
}

/// Nearest-entrance matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Maximum accepted distance in meters (exclusive bound)
    #[serde(default = "defaults::max_distance")]
    pub max_distance_m: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_distance_m: defaults::max_distance(),
        }
    }
}

/// Output rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Render numeric fields with a comma decimal separator
    #[serde(default)]
    pub decimal_comma: bool,

    /// Source tag written on matched success rows
    #[serde(default = "defaults::source_label")]
    pub source_label: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            decimal_comma: false,
            source_label: defaults::source_label(),
        }
    }
}

mod defaults {
    use super::ProxyEntry;

    // Fetcher defaults
    pub fn search_url() -> String {
        "https://yandex.ru/maps/".into()
    }
    pub fn zoom() -> u8 {
        19
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn delay_min() -> u64 {
        700
    }
    pub fn delay_max() -> u64 {
        2500
    }
    pub fn max_attempts() -> u32 {
        5
    }
    pub fn state_selector() -> String {
        "script.state-view".into()
    }

    // Proxy defaults: a single direct connection
    pub fn proxy_pool() -> Vec<ProxyEntry> {
        vec![ProxyEntry::direct()]
    }

    // Block signature defaults
    pub fn captcha_url_markers() -> Vec<String> {
        vec!["showcaptcha".into(), "/captcha".into()]
    }
    pub fn captcha_content_markers() -> Vec<String> {
        vec![
            "smartcaptcha".into(),
            "подтвердите, что запросы отправляли вы".into(),
        ]
    }
    pub fn outdated_phrases() -> Vec<String> {
        vec![
            "браузер устарел".into(),
            "ваш браузер не поддерживается".into(),
            "обновите браузер".into(),
            "browser is out of date".into(),
        ]
    }

    // Matcher defaults
    pub fn max_distance() -> f64 {
        200.0
    }

    // Output defaults
    pub fn source_label() -> String {
        "Yandex Maps".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_proxy_pool() {
        let mut config = Config::default();
        config.proxies.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_host_without_port() {
        let mut config = Config::default();
        config.proxies = vec![ProxyEntry {
            host: Some("proxy.example.com".into()),
            ..ProxyEntry::default()
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_delay_window() {
        let mut config = Config::default();
        config.fetcher.delay_min_ms = 3000;
        config.fetcher.delay_max_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn proxy_entry_url_and_label() {
        let entry = ProxyEntry {
            host: Some("proxy1.example.com".into()),
            port: Some(8080),
            user: Some("u".into()),
            pass: Some("p".into()),
        };
        assert_eq!(
            entry.url().as_deref(),
            Some("http://proxy1.example.com:8080")
        );
        assert_eq!(entry.label(), "proxy1.example.com:8080");
        assert!(!entry.is_direct());
        assert!(ProxyEntry::direct().is_direct());
        assert_eq!(ProxyEntry::direct().label(), "direct");
    }

    #[test]
    fn parses_mixed_proxy_pool_from_toml() {
        let toml_src = r#"
            [[proxy]]

            [[proxy]]
            host = "proxy1.example.com"
            port = 8080
            user = "username1"
            pass = "password1"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.proxies.len(), 2);
        assert!(config.proxies[0].is_direct());
        assert!(!config.proxies[1].is_direct());
        assert!(config.validate().is_ok());
    }
}
