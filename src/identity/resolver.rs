/// Remote Resolver - fetches and validates a domain's `/.well-known/nostr.json`
use crate::{
    error::{Nip05Error, Nip05Result},
    identity::{FailureReason, WellKnownDocument},
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Path of the NIP-05 document on every domain
pub const WELL_KNOWN_PATH: &str = "/.well-known/nostr.json";

/// Remote resolution failures
///
/// None of these are fatal; the engine turns them into unverified records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Domain unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Name '{name}' not found on {domain}")]
    NotFound { name: String, domain: String },
}

impl From<&ResolveError> for FailureReason {
    fn from(err: &ResolveError) -> Self {
        match err {
            ResolveError::Timeout(_) => FailureReason::Timeout,
            ResolveError::Unreachable(_) => FailureReason::Unreachable,
            ResolveError::InvalidResponse(_) => FailureReason::InvalidResponse,
            ResolveError::NotFound { .. } => FailureReason::NotFound,
        }
    }
}

/// Fetches a remote well-known document
///
/// On success the returned document is guaranteed to contain `name`.
#[async_trait]
pub trait WellKnownResolver: Send + Sync {
    async fn resolve(&self, name: &str, domain: &str) -> Result<WellKnownDocument, ResolveError>;
}

/// Remote resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Hard bound on the whole fetch, body included
    pub timeout: Duration,
    /// Responses larger than this are rejected
    pub max_response_bytes: usize,
    /// URL scheme; plain `http` is only meant for tests
    pub scheme: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("NostrGator-NIP05/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(5),
            max_response_bytes: 64 * 1024,
            scheme: "https".to_string(),
        }
    }
}

/// HTTP-backed resolver
#[derive(Clone)]
pub struct HttpResolver {
    http_client: reqwest::Client,
    config: ResolverConfig,
}

impl HttpResolver {
    /// Create a new HTTP resolver
    pub fn new(config: ResolverConfig) -> Nip05Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            // NIP-05: fetchers MUST NOT follow redirects
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Nip05Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Document URL for a domain (query string added per request)
    pub fn document_url(&self, domain: &str) -> String {
        format!("{}://{}{}", self.config.scheme, domain, WELL_KNOWN_PATH)
    }

    async fn fetch(&self, name: &str, domain: &str) -> Result<WellKnownDocument, ResolveError> {
        let url = self.document_url(domain);

        let mut response = self
            .http_client
            .get(&url)
            .query(&[("name", name)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| classify_error(domain, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound {
                name: name.to_string(),
                domain: domain.to_string(),
            });
        }
        if status.is_redirection() {
            return Err(ResolveError::InvalidResponse(format!(
                "{} answered with redirect {}; redirects are not followed",
                domain, status
            )));
        }
        if !status.is_success() {
            return Err(ResolveError::InvalidResponse(format!(
                "{} returned HTTP {}",
                domain, status
            )));
        }

        let limit = self.config.max_response_bytes;
        if response.content_length().map_or(false, |len| len > limit as u64) {
            return Err(ResolveError::InvalidResponse(format!(
                "document exceeds {} bytes",
                limit
            )));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify_error(domain, e))?
        {
            if body.len() + chunk.len() > limit {
                return Err(ResolveError::InvalidResponse(format!(
                    "document exceeds {} bytes",
                    limit
                )));
            }
            body.extend_from_slice(&chunk);
        }

        parse_document(&body, name, domain)
    }
}

#[async_trait]
impl WellKnownResolver for HttpResolver {
    async fn resolve(&self, name: &str, domain: &str) -> Result<WellKnownDocument, ResolveError> {
        debug!(name, domain, "resolving remote NIP-05 document");

        match tokio::time::timeout(self.config.timeout, self.fetch(name, domain)).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::Timeout(domain.to_string())),
        }
    }
}

/// Parse a well-known body and require `name` to be present
pub fn parse_document(
    body: &[u8],
    name: &str,
    domain: &str,
) -> Result<WellKnownDocument, ResolveError> {
    let doc: WellKnownDocument = serde_json::from_slice(body)
        .map_err(|e| ResolveError::InvalidResponse(format!("malformed nostr.json: {}", e)))?;

    if doc.pubkey_for(name).is_none() {
        return Err(ResolveError::NotFound {
            name: name.to_string(),
            domain: domain.to_string(),
        });
    }

    Ok(doc)
}

/// Map transport errors onto the resolution taxonomy
fn classify_error(domain: &str, err: reqwest::Error) -> ResolveError {
    if err.is_timeout() {
        ResolveError::Timeout(domain.to_string())
    } else if err.is_body() || err.is_decode() || err.is_redirect() {
        ResolveError::InvalidResponse(err.to_string())
    } else {
        // Connection refused, DNS and TLS failures
        ResolveError::Unreachable(format!("{}: {}", domain, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";

    #[test]
    fn test_document_url() {
        let resolver = HttpResolver::new(ResolverConfig::default()).unwrap();
        assert_eq!(
            resolver.document_url("example.com"),
            "https://example.com/.well-known/nostr.json"
        );
    }

    #[test]
    fn test_parse_document_success() {
        let body = format!(r#"{{"names":{{"bob":"{}"}},"relays":{{}}}}"#, PUBKEY);
        let doc = parse_document(body.as_bytes(), "bob", "example.com").unwrap();
        assert_eq!(doc.pubkey_for("bob"), Some(PUBKEY));
    }

    #[test]
    fn test_parse_document_missing_name() {
        let body = format!(r#"{{"names":{{"alice":"{}"}}}}"#, PUBKEY);
        let err = parse_document(body.as_bytes(), "bob", "example.com").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn test_parse_document_rejects_garbage() {
        for body in [
            "<html>not json</html>",
            r#"{"names": ["bob"]}"#,
            r#"{"relays": {}}"#,
            r#"{"names": {"bob": 42}}"#,
        ] {
            let err = parse_document(body.as_bytes(), "bob", "example.com").unwrap_err();
            assert!(matches!(err, ResolveError::InvalidResponse(_)), "{}", body);
        }
    }

    #[test]
    fn test_failure_reason_mapping() {
        let cases = [
            (ResolveError::Timeout("a".into()), FailureReason::Timeout),
            (ResolveError::Unreachable("a".into()), FailureReason::Unreachable),
            (ResolveError::InvalidResponse("a".into()), FailureReason::InvalidResponse),
            (
                ResolveError::NotFound {
                    name: "a".into(),
                    domain: "b".into(),
                },
                FailureReason::NotFound,
            ),
        ];

        for (err, reason) in cases {
            assert_eq!(FailureReason::from(&err), reason);
        }
    }
}
