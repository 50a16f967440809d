/// Rate Limiting System
///
/// Per-client-IP limits for the verification API. The well-known endpoint
/// is discovery traffic and is never limited.
use crate::{
    config::RateLimitSettings,
    context::AppContext,
    error::{Nip05Error, Nip05Result},
    metrics,
};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovernorLimiter,
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

type KeyedLimiter = GovernorLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests allowed per window (also the burst size)
    pub requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: 20,                    // 20 verifications
            window: Duration::from_secs(300), // per 5 minutes
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            enabled: settings.enabled,
            requests: settings.verify_requests,
            window: Duration::from_secs(settings.verify_window_seconds),
        }
    }
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    verify: Arc<KeyedLimiter>,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let requests = NonZeroU32::new(config.requests).unwrap_or(NonZeroU32::MIN);
        let period = config.window / requests.get();

        // Replenish one request every window/requests, allow the full window as burst
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(requests))
            .allow_burst(requests);

        Self {
            verify: Arc::new(GovernorLimiter::keyed(quota)),
            enabled: config.enabled,
        }
    }

    /// Check the verification limit for a client
    pub fn check_verify(&self, client: IpAddr) -> Nip05Result<()> {
        if !self.enabled {
            return Ok(());
        }

        match self.verify.check_key(&client) {
            Ok(_) => Ok(()),
            Err(not_until) => Err(Nip05Error::RateLimitExceeded {
                retry_after: not_until.wait_time_from(DefaultClock::default().now()),
            }),
        }
    }

    /// Drop limiter state for clients that are back at full quota
    pub fn prune(&self) -> usize {
        let before = self.verify.len();
        self.verify.retain_recent();
        self.verify.shrink_to_fit();
        before.saturating_sub(self.verify.len())
    }

    /// Number of tracked clients
    pub fn tracked_clients(&self) -> usize {
        self.verify.len()
    }
}

/// Client IP from the connection, or unspecified when served without connect info
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rate limiting middleware for the verification routes
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, Nip05Error> {
    let client = client_ip(&request);

    if let Err(e) = ctx.rate_limiter.check_verify(client) {
        tracing::warn!(client = %client, "verification rate limit exceeded");
        metrics::record_error("rate_limited");
        return Err(e);
    }

    Ok(next.run(request).await)
}
