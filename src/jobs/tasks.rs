/// Background task implementations
use crate::{context::AppContext, metrics};

/// Remove expired verification records and update the cache size gauge
pub async fn sweep_verification_cache(ctx: &AppContext) -> usize {
    let cache = ctx.engine.cache();
    let removed = cache.cleanup_expired().await;
    metrics::CACHE_SIZE.set(cache.len().await as i64);
    removed
}

/// Drop limiter state for clients that are back at full quota
pub fn prune_rate_limiter(ctx: &AppContext) -> usize {
    ctx.rate_limiter.prune()
}

pub fn refresh_uptime(ctx: &AppContext) {
    metrics::UPTIME_SECONDS.set(ctx.uptime_seconds());
}
