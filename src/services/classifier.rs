//! Block classification.
//!
//! A pure function over the fetched page: same inputs always produce the
//! same verdict. The verdict decides whether the orchestrator rotates the
//! session or proceeds to extraction.

use crate::models::BlockSignatures;
use crate::services::fetcher::RawPage;

/// Outcome of inspecting one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Page is usable; absent content simply yields zero entrances downstream.
    Ok,
    /// CAPTCHA challenge detected in the final URL or content.
    Captcha,
    /// "Browser outdated" interstitial detected in the content.
    Outdated,
    /// Non-success HTTP status.
    HttpError(u16),
    /// Transport-level failure.
    NetworkError,
}

impl Verdict {
    /// Whether this verdict requires discarding the session.
    pub fn is_block(&self) -> bool {
        !matches!(self, Verdict::Ok)
    }
}

/// Classify a fetched page against the configured block signatures.
///
/// Marker and phrase matching is case-insensitive substring search.
pub fn classify(page: &RawPage, signatures: &BlockSignatures) -> Verdict {
    if page.error.is_some() {
        return Verdict::NetworkError;
    }

    let url_lower = page.final_url.to_lowercase();
    if contains_any(&url_lower, &signatures.captcha_url_markers) {
        return Verdict::Captcha;
    }

    if let Some(content) = &page.content {
        let content_lower = content.to_lowercase();
        if contains_any(&content_lower, &signatures.captcha_content_markers) {
            return Verdict::Captcha;
        }
        if contains_any(&content_lower, &signatures.outdated_phrases) {
            return Verdict::Outdated;
        }
    }

    match page.status {
        Some(status) if !(200..300).contains(&status) => Verdict::HttpError(status),
        _ => Verdict::Ok,
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_page(content: &str) -> RawPage {
        RawPage {
            content: Some(content.to_string()),
            final_url: "https://yandex.ru/maps/?text=x".to_string(),
            status: Some(200),
            error: None,
        }
    }

    #[test]
    fn clean_page_is_ok() {
        let page = ok_page("<html><body>results</body></html>");
        assert_eq!(classify(&page, &BlockSignatures::default()), Verdict::Ok);
    }

    #[test]
    fn absent_content_with_success_status_is_ok() {
        let page = RawPage {
            content: None,
            final_url: "https://yandex.ru/maps/".to_string(),
            status: Some(200),
            error: None,
        };
        assert_eq!(classify(&page, &BlockSignatures::default()), Verdict::Ok);
    }

    #[test]
    fn captcha_detected_in_final_url() {
        let mut page = ok_page("fine");
        page.final_url = "https://yandex.ru/showcaptcha?retpath=...".to_string();
        assert_eq!(
            classify(&page, &BlockSignatures::default()),
            Verdict::Captcha
        );
    }

    #[test]
    fn captcha_detected_in_content_case_insensitive() {
        let page = ok_page("<div class=\"SmartCaptcha\"></div>");
        assert_eq!(
            classify(&page, &BlockSignatures::default()),
            Verdict::Captcha
        );
    }

    #[test]
    fn outdated_phrase_matches_case_insensitive() {
        let page = ok_page("<h1>Ваш БРАУЗЕР УСТАРЕЛ</h1>");
        assert_eq!(
            classify(&page, &BlockSignatures::default()),
            Verdict::Outdated
        );
    }

    #[test]
    fn injected_signature_list_is_honored() {
        let signatures = BlockSignatures {
            captcha_url_markers: vec![],
            captcha_content_markers: vec!["robot check".into()],
            outdated_phrases: vec![],
        };
        let page = ok_page("Robot Check required");
        assert_eq!(classify(&page, &signatures), Verdict::Captcha);

        // The same page is clean under empty signature lists.
        let empty = BlockSignatures {
            captcha_url_markers: vec![],
            captcha_content_markers: vec![],
            outdated_phrases: vec![],
        };
        assert_eq!(classify(&page, &empty), Verdict::Ok);
    }

    #[test]
    fn http_and_network_errors() {
        let mut page = ok_page("err");
        page.status = Some(503);
        assert_eq!(
            classify(&page, &BlockSignatures::default()),
            Verdict::HttpError(503)
        );

        let failed = RawPage::transport_error("http://x/", "connection reset");
        assert_eq!(
            classify(&failed, &BlockSignatures::default()),
            Verdict::NetworkError
        );
    }
}
