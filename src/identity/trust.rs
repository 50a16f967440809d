/// Trust classification for verified identities
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Trust level values assigned per domain class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustLevels {
    pub verified_domain: u32,
    pub verified_subdomain: u32,
    pub unverified: u32,
}

impl Default for TrustLevels {
    fn default() -> Self {
        Self {
            verified_domain: 5,
            verified_subdomain: 3,
            unverified: 0,
        }
    }
}

/// Domain reputation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustConfig {
    pub trusted_domains: HashSet<String>,
    pub levels: TrustLevels,
}

impl TrustConfig {
    pub fn new<I, S>(trusted_domains: I, levels: TrustLevels) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            trusted_domains: trusted_domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            levels,
        }
    }
}

/// Classify a domain
///
/// Resolution order:
/// 1. Exact match in trusted domains
/// 2. Any dotted domain
/// 3. Everything else (bare labels such as `localhost`)
pub fn classify(domain: &str, config: &TrustConfig) -> u32 {
    if config.trusted_domains.contains(domain) {
        return config.levels.verified_domain;
    }

    if domain.contains('.') {
        return config.levels.verified_subdomain;
    }

    config.levels.unverified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrustConfig {
        TrustConfig::new(["example.com", "localhost"], TrustLevels::default())
    }

    #[test]
    fn test_trusted_domain_wins_over_dot_rule() {
        assert_eq!(classify("example.com", &config()), 5);
    }

    #[test]
    fn test_trusted_bare_label() {
        assert_eq!(classify("localhost", &config()), 5);
    }

    #[test]
    fn test_untrusted_dotted_domain() {
        assert_eq!(classify("other.org", &config()), 3);
        assert_eq!(classify("sub.example.com", &config()), 3);
    }

    #[test]
    fn test_bare_label_unverified() {
        assert_eq!(classify("intranet", &config()), 0);
    }

    #[test]
    fn test_custom_levels() {
        let levels = TrustLevels {
            verified_domain: 10,
            verified_subdomain: 7,
            unverified: 1,
        };
        let config = TrustConfig::new(["Trusted.Example"], levels);

        assert_eq!(classify("trusted.example", &config), 10);
        assert_eq!(classify("other.example", &config), 7);
        assert_eq!(classify("bare", &config), 1);
    }
}
