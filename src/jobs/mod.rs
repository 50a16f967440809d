use crate::context::AppContext;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        // Spawn cleanup tasks
        tokio::spawn(Self::verification_cache_sweep_job(Arc::clone(&self)));
        tokio::spawn(Self::rate_limiter_prune_job(Arc::clone(&self)));

        // Spawn monitoring tasks
        tokio::spawn(Self::uptime_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Sweep expired verification records (interval from config, default 15 minutes)
    async fn verification_cache_sweep_job(scheduler: Arc<Self>) {
        let secs = scheduler.context.config.jobs.cache_sweep_interval_seconds.max(1);
        let mut interval = interval(Duration::from_secs(secs));

        loop {
            interval.tick().await;

            let removed = tasks::sweep_verification_cache(&scheduler.context).await;
            if removed > 0 {
                info!("Swept {} expired verification records", removed);
            } else {
                debug!("Verification cache sweep: nothing expired");
            }
        }
    }

    /// Forget rate limiter state for idle clients (runs every 10 minutes)
    async fn rate_limiter_prune_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(600)); // Every 10 minutes

        loop {
            interval.tick().await;

            let pruned = tasks::prune_rate_limiter(&scheduler.context);
            if pruned > 0 {
                debug!("Pruned rate limiter state for {} clients", pruned);
            }
        }
    }

    /// Refresh the uptime gauge (runs every 15 seconds)
    async fn uptime_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(15));

        loop {
            interval.tick().await;
            tasks::refresh_uptime(&scheduler.context);
        }
    }
}
