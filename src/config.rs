/// Configuration management for the NIP-05 service
///
/// Loaded from a YAML file, then overridden by environment variables.
/// A missing or malformed file falls back to permissive defaults instead of
/// failing startup.
use crate::{
    error::{Nip05Error, Nip05Result},
    identity::{
        identifier::{is_valid_domain, is_valid_name},
        EngineConfig, Identity, Pubkey, ResolverConfig, TrustConfig, TrustLevels,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default location of the YAML configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/config/nip05.yml";

/// Main server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServiceConfig,
    pub verification: VerificationConfig,
    pub rate_limit: RateLimitSettings,
    pub jobs: JobsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Domain whose identities this server hosts
    pub domain: String,
    pub host: String,
    pub port: u16,
    pub identities: BTreeMap<String, IdentityEntry>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3005,
            identities: BTreeMap::new(),
        }
    }
}

/// A hosted identity as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityEntry {
    /// Hex or npub
    pub pubkey: String,
    #[serde(default)]
    pub relays: Vec<String>,
}

/// Verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub cache_duration_hours: u64,
    pub trusted_domains: Vec<String>,
    pub trust_levels: TrustLevels,
    pub timeout_seconds: u64,
    pub max_response_bytes: usize,
    pub user_agent: Option<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            cache_duration_hours: 24,
            trusted_domains: Vec::new(),
            trust_levels: TrustLevels::default(),
            timeout_seconds: 5,
            max_response_bytes: 64 * 1024,
            user_agent: None,
        }
    }
}

/// Rate limiting configuration for the verification API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Requests allowed per client IP within the window
    pub verify_requests: u32,
    pub verify_window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            verify_requests: 20,
            verify_window_seconds: 300,
        }
    }
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub cache_sweep_interval_seconds: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            cache_sweep_interval_seconds: 900,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `NIP05_CONFIG_PATH` and the environment
    ///
    /// Never fails: an unreadable file means defaults, and invalid values
    /// fall back to their defaults one field at a time.
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        let path = env::var("NIP05_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = match Self::from_file(&path) {
            Ok(config) => {
                info!(path = %path, "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.sanitize();

        config
    }

    /// Read and parse a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Nip05Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse YAML; an empty document yields defaults
    pub fn from_yaml_str(contents: &str) -> Nip05Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|e| Nip05Error::Config(format!("Invalid YAML configuration: {}", e)))
    }

    /// Apply `NIP05_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(domain) = env::var("NIP05_DOMAIN") {
            self.server.domain = domain;
        }
        if let Ok(host) = env::var("NIP05_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env("NIP05_PORT") {
            self.server.port = port;
        }
        if let Some(hours) = parse_env("NIP05_CACHE_DURATION_HOURS") {
            self.verification.cache_duration_hours = hours;
        }
        if let Ok(domains) = env::var("NIP05_TRUSTED_DOMAINS") {
            self.verification.trusted_domains = domains
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(secs) = parse_env("NIP05_RESOLVE_TIMEOUT_SECS") {
            self.verification.timeout_seconds = secs;
        }
        if let Some(enabled) = parse_env("NIP05_RATE_LIMITS_ENABLED") {
            self.rate_limit.enabled = enabled;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Nip05Result<()> {
        match self.invalid_fields().into_iter().next() {
            Some((_, reason)) => Err(Nip05Error::Validation(reason)),
            None => Ok(()),
        }
    }

    /// Reset invalid fields to their defaults, keeping everything else
    ///
    /// Returns the names of the fields that were reset.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let invalid = self.invalid_fields();

        for (field, reason) in &invalid {
            warn!(field, reason = %reason, "Invalid configuration value, using default");
            match *field {
                "server.domain" => self.server.domain = defaults.server.domain.clone(),
                "verification.timeout_seconds" => {
                    self.verification.timeout_seconds = defaults.verification.timeout_seconds
                }
                "verification.max_response_bytes" => {
                    self.verification.max_response_bytes = defaults.verification.max_response_bytes
                }
                _ => {}
            }
        }

        invalid.into_iter().map(|(field, _)| field).collect()
    }

    fn invalid_fields(&self) -> Vec<(&'static str, String)> {
        let mut invalid = Vec::new();

        if !is_valid_domain(&self.server.domain.to_ascii_lowercase()) {
            invalid.push((
                "server.domain",
                format!("Server domain '{}' is not a valid hostname", self.server.domain),
            ));
        }

        if self.verification.timeout_seconds == 0 {
            invalid.push((
                "verification.timeout_seconds",
                "Verification timeout must be at least one second".to_string(),
            ));
        }

        if self.verification.max_response_bytes == 0 {
            invalid.push((
                "verification.max_response_bytes",
                "max_response_bytes must be positive".to_string(),
            ));
        }

        invalid
    }

    /// Bind address for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Normalized identity directory
    ///
    /// Names are lowercased and pubkeys canonicalized. Entries with an
    /// invalid name or pubkey are skipped with a warning.
    pub fn identity_directory(&self) -> BTreeMap<String, Identity> {
        let mut identities = BTreeMap::new();

        for (raw_name, entry) in &self.server.identities {
            let name = raw_name.trim().to_ascii_lowercase();
            if !is_valid_name(&name) {
                warn!(name = %raw_name, "Skipping identity with invalid name");
                continue;
            }

            let pubkey = match Pubkey::normalize(&entry.pubkey) {
                Ok(pubkey) => pubkey,
                Err(e) => {
                    warn!(name = %name, error = %e, "Skipping identity with invalid pubkey");
                    continue;
                }
            };

            if identities.contains_key(&name) {
                warn!(name = %name, "Duplicate identity name after normalization, keeping first");
                continue;
            }

            identities.insert(
                name.clone(),
                Identity {
                    name,
                    pubkey,
                    relays: entry.relays.clone(),
                },
            );
        }

        identities
    }

    /// Engine settings derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            domain: self.server.domain.to_ascii_lowercase(),
            trust: TrustConfig::new(
                &self.verification.trusted_domains,
                self.verification.trust_levels,
            ),
            cache_duration_hours: self.verification.cache_duration_hours,
        }
    }

    /// Remote resolver settings derived from this configuration
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut resolver = ResolverConfig {
            timeout: Duration::from_secs(self.verification.timeout_seconds),
            max_response_bytes: self.verification.max_response_bytes,
            ..ResolverConfig::default()
        };
        if let Some(user_agent) = &self.verification.user_agent {
            resolver.user_agent = user_agent.clone();
        }
        resolver
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const P1: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const P1_NPUB: &str = "npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6";

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.domain, "localhost");
        assert_eq!(config.server.port, 3005);
        assert!(config.server.identities.is_empty());
        assert_eq!(config.verification.cache_duration_hours, 24);
        assert_eq!(config.verification.trust_levels, TrustLevels::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = format!(
            r#"
server:
  domain: example.com
  port: 8080
  identities:
    Alice:
      pubkey: {P1_NPUB}
      relays:
        - wss://relay.example.com
    bob:
      pubkey: {P1}
verification:
  cache_duration_hours: 2
  trusted_domains: [example.com]
  trust_levels:
    verified_domain: 9
"#
        );

        let config = ServerConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.server.domain, "example.com");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.verification.cache_duration_hours, 2);
        assert_eq!(config.verification.trust_levels.verified_domain, 9);
        assert_eq!(config.verification.trust_levels.verified_subdomain, 3);

        let identities = config.identity_directory();
        assert_eq!(identities.len(), 2);
        assert_eq!(identities["alice"].pubkey.as_hex(), P1);
        assert_eq!(identities["alice"].relays, vec!["wss://relay.example.com".to_string()]);
        assert!(identities["bob"].relays.is_empty());

        let engine = config.engine_config();
        assert!(engine.trust.trusted_domains.contains("example.com"));
    }

    #[test]
    fn test_invalid_identities_skipped() {
        let yaml = format!(
            r#"
server:
  identities:
    nostrgator:
      pubkey: npub1nostrgator123456789abcdef
    "bad name":
      pubkey: {P1}
    good:
      pubkey: {P1}
"#
        );

        let config = ServerConfig::from_yaml_str(&yaml).unwrap();
        let identities = config.identity_directory();
        assert_eq!(identities.len(), 1);
        assert!(identities.contains_key("good"));
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        assert!(ServerConfig::from_yaml_str("server: [unclosed").is_err());
        assert!(ServerConfig::from_yaml_str("server:\n  port: not-a-port").is_err());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = ServerConfig::from_yaml_str("   \n").unwrap();
        assert_eq!(config.server.domain, "localhost");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  domain: files.example\n").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.domain, "files.example");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ServerConfig::from_file("/nonexistent/nip05.yml").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_domain() {
        let mut config = ServerConfig::default();
        config.server.domain = "not a domain".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sanitize_resets_only_invalid_fields() {
        let yaml = format!(
            r#"
server:
  domain: "not a domain"
  port: 9000
  identities:
    bob:
      pubkey: {P1}
verification:
  timeout_seconds: 0
  cache_duration_hours: 6
"#
        );

        let mut config = ServerConfig::from_yaml_str(&yaml).unwrap();
        assert!(config.validate().is_err());

        let reset = config.sanitize();
        assert_eq!(reset, vec!["server.domain", "verification.timeout_seconds"]);
        assert!(config.validate().is_ok());

        assert_eq!(config.server.domain, "localhost");
        assert_eq!(config.verification.timeout_seconds, 5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.verification.cache_duration_hours, 6);
        assert!(config.identity_directory().contains_key("bob"));
    }

    #[test]
    fn test_sanitize_leaves_valid_config_alone() {
        let mut config = ServerConfig::default();
        config.server.domain = "example.com".to_string();
        assert!(config.sanitize().is_empty());
        assert_eq!(config.server.domain, "example.com");
    }

    #[test]
    fn test_resolver_config() {
        let mut config = ServerConfig::default();
        config.verification.timeout_seconds = 3;
        config.verification.user_agent = Some("custom/1.0".to_string());

        let resolver = config.resolver_config();
        assert_eq!(resolver.timeout, Duration::from_secs(3));
        assert_eq!(resolver.user_agent, "custom/1.0");
        assert_eq!(resolver.scheme, "https");
    }
}
