/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    error::Nip05Result,
    identity::{HttpResolver, VerificationEngine, WellKnownResolver},
    rate_limit::{RateLimitConfig, RateLimiter},
};
use std::sync::Arc;
use std::time::Instant;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub engine: VerificationEngine,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ServerConfig) -> Nip05Result<Self> {
        let resolver = HttpResolver::new(config.resolver_config())?;
        Ok(Self::with_resolver(config, Arc::new(resolver)))
    }

    /// Create a context with a specific remote resolver
    pub fn with_resolver(config: ServerConfig, resolver: Arc<dyn WellKnownResolver>) -> Self {
        let identities = config.identity_directory();
        for identity in identities.values() {
            tracing::info!(
                name = %identity.name,
                npub = %identity.pubkey.to_npub().unwrap_or_default(),
                relays = identity.relays.len(),
                "Hosting identity"
            );
        }

        let engine = VerificationEngine::new(config.engine_config(), identities, resolver);
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::from(&config.rate_limit)));

        Self {
            config: Arc::new(config),
            engine,
            rate_limiter,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the context was created
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!("http://{}", self.config.bind_address())
    }
}
