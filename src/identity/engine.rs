/// Verification Engine - orchestrates cache, local directory, remote resolution and trust
use crate::{
    error::{Nip05Error, Nip05Result},
    identity::{
        directory, trust, FailureReason, Identifier, Identity, Pubkey, ResolveError,
        TrustConfig, VerificationCache, VerificationRecord, WellKnownDocument, WellKnownResolver,
    },
    metrics,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Domain this service answers for
    pub domain: String,
    pub trust: TrustConfig,
    pub cache_duration_hours: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            trust: TrustConfig::default(),
            cache_duration_hours: 24,
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    identities: BTreeMap<String, Identity>,
    cache: VerificationCache,
    resolver: Arc<dyn WellKnownResolver>,
}

/// Verification engine shared by all request handlers
#[derive(Clone)]
pub struct VerificationEngine {
    inner: Arc<EngineInner>,
}

impl VerificationEngine {
    /// Create a new engine; the cache TTL is fixed here
    pub fn new(
        config: EngineConfig,
        identities: BTreeMap<String, Identity>,
        resolver: Arc<dyn WellKnownResolver>,
    ) -> Self {
        let cache = VerificationCache::with_hours(config.cache_duration_hours);

        Self {
            inner: Arc::new(EngineInner {
                config,
                identities,
                cache,
                resolver,
            }),
        }
    }

    pub fn domain(&self) -> &str {
        &self.inner.config.domain
    }

    pub fn identities(&self) -> &BTreeMap<String, Identity> {
        &self.inner.identities
    }

    pub fn cache(&self) -> &VerificationCache {
        &self.inner.cache
    }

    /// The locally hosted well-known document, optionally narrowed to one name
    pub fn directory(&self, name: Option<&str>) -> WellKnownDocument {
        match name {
            Some(name) => directory::build_for(&self.inner.identities, name),
            None => directory::build(&self.inner.identities),
        }
    }

    /// Whether identifiers on this domain are answered from the local directory
    pub fn is_local_domain(&self, domain: &str) -> bool {
        domain == "localhost" || domain.eq_ignore_ascii_case(&self.inner.config.domain)
    }

    /// Verify an identifier
    pub async fn verify(&self, identifier: &Identifier) -> Nip05Result<VerificationRecord> {
        self.verify_expecting(identifier, None).await
    }

    /// Verify an identifier, optionally requiring it to resolve to `expected`
    pub async fn verify_expecting(
        &self,
        identifier: &Identifier,
        expected: Option<&Pubkey>,
    ) -> Nip05Result<VerificationRecord> {
        let key = identifier.to_string();

        if let Some(record) = self.inner.cache.get(&key).await {
            metrics::record_cache_access(true);
            debug!(identifier = %key, "verification cache hit");
            return Ok(record.against_expected(expected));
        }
        metrics::record_cache_access(false);

        // Resolution runs detached so a disconnecting caller still populates the cache
        let engine = self.clone();
        let id = identifier.clone();
        let record = tokio::spawn(async move { engine.resolve_and_store(&id).await })
            .await
            .map_err(|e| Nip05Error::Internal(format!("Verification task failed: {}", e)))?;

        Ok(record.against_expected(expected))
    }

    /// Cache miss path: classify, look up, score, store
    async fn resolve_and_store(&self, identifier: &Identifier) -> VerificationRecord {
        let record = if self.is_local_domain(identifier.domain()) {
            self.lookup_local(identifier)
        } else {
            self.resolve_remote(identifier).await
        };

        self.inner
            .cache
            .store(&identifier.to_string(), record.clone())
            .await;

        metrics::record_verification(record.outcome(), identifier.domain());
        info!(
            identifier = %identifier,
            verified = record.verified,
            trust_level = record.trust_level,
            failure_reason = ?record.failure_reason,
            "verification completed"
        );

        record
    }

    fn lookup_local(&self, identifier: &Identifier) -> VerificationRecord {
        match self.inner.identities.get(identifier.name()) {
            Some(identity) => VerificationRecord::verified(
                identifier,
                identity.pubkey.clone(),
                identity.relays.clone(),
                self.trust_level(identifier.domain()),
            ),
            None => VerificationRecord::unverified(
                identifier,
                FailureReason::NotFound,
                format!("No identity named '{}' on this server", identifier.name()),
            ),
        }
    }

    async fn resolve_remote(&self, identifier: &Identifier) -> VerificationRecord {
        let doc = match self
            .inner
            .resolver
            .resolve(identifier.name(), identifier.domain())
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                if !matches!(e, ResolveError::NotFound { .. }) {
                    warn!(identifier = %identifier, error = %e, "remote resolution failed");
                }
                return VerificationRecord::unverified(identifier, (&e).into(), e.to_string());
            }
        };

        let raw = match doc.pubkey_for(identifier.name()) {
            Some(raw) => raw,
            None => {
                return VerificationRecord::unverified(
                    identifier,
                    FailureReason::NotFound,
                    format!("Name '{}' not found on {}", identifier.name(), identifier.domain()),
                )
            }
        };

        match Pubkey::normalize(raw) {
            Ok(pubkey) => {
                let relays = doc.relays_for(&pubkey);
                VerificationRecord::verified(
                    identifier,
                    pubkey,
                    relays,
                    self.trust_level(identifier.domain()),
                )
            }
            Err(e) => VerificationRecord::unverified(
                identifier,
                FailureReason::InvalidResponse,
                format!("Remote document lists an undecodable pubkey: {}", e),
            ),
        }
    }

    fn trust_level(&self, domain: &str) -> u32 {
        trust::classify(domain, &self.inner.config.trust)
    }
}
