//! Client identity supplier.
//!
//! Produces a randomized browser/network fingerprint per session so repeated
//! sessions do not present an identical face to the serving layer.

use rand::Rng;

/// Randomized client fingerprint bound to one session.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub accept_language: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl ClientIdentity {
    /// Generate a randomized identity.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        // Common desktop user agents
        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
        ];

        // Common viewport sizes
        let viewports = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

        let locales = ["ru-RU,ru;q=0.9", "ru-RU,ru;q=0.9,en-US;q=0.8"];

        let ua_idx = rng.gen_range(0..user_agents.len());
        let vp_idx = rng.gen_range(0..viewports.len());
        let loc_idx = rng.gen_range(0..locales.len());
        let (width, height) = viewports[vp_idx];

        Self {
            user_agent: user_agents[ua_idx].to_string(),
            accept_language: locales[loc_idx].to_string(),
            viewport_width: width,
            viewport_height: height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn randomized_identity_is_populated() {
        let identity = ClientIdentity::randomized();
        assert!(!identity.user_agent.is_empty());
        assert!(identity.accept_language.starts_with("ru-RU"));
        assert!(identity.viewport_width > 0);
        assert!(identity.viewport_height > 0);
    }

    #[test]
    fn randomized_identities_vary() {
        let identities: Vec<_> = (0..20).map(|_| ClientIdentity::randomized()).collect();
        let first = &identities[0].user_agent;
        let all_same = identities.iter().all(|i| &i.user_agent == first);
        assert!(!all_same, "Expected variation in user agents");
    }
}
