/// Health check and metrics endpoints
///
/// Supports two probes:
/// - Liveness: Is the application alive?
/// - Health: Component status with directory and cache details
use crate::{context::AppContext, metrics};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    pub service: String,

    /// Application version
    pub version: String,

    pub domain: String,

    pub identities_count: usize,

    pub cache_size: usize,

    /// Uptime in seconds
    pub uptime_seconds: f64,

    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
}

/// Health status of individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,

    /// Status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    /// Optional error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(liveness_probe))
        .route("/metrics", get(metrics_endpoint))
}

/// Liveness probe
///
/// If we can respond, we're alive.
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Service health with component details
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let identities_count = ctx.engine.identities().len();
    let cache_size = ctx.engine.cache().len().await;

    let checks = vec![
        check_directory(&ctx, identities_count),
        check_cache(&ctx, cache_size),
    ];
    let status = determine_overall_status(&checks);

    let status_code = match status.as_str() {
        "healthy" | "degraded" => StatusCode::OK, // Still serving traffic
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    let health = HealthStatus {
        status,
        service: "NostrGator NIP-05".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        domain: ctx.engine.domain().to_string(),
        identities_count,
        cache_size,
        uptime_seconds: ctx.uptime_seconds(),
        checks,
    };

    (status_code, Json(health))
}

/// Prometheus scrape endpoint
pub async fn metrics_endpoint(State(ctx): State<AppContext>) -> Response {
    metrics::UPTIME_SECONDS.set(ctx.uptime_seconds());
    metrics::CACHE_SIZE.set(ctx.engine.cache().len().await as i64);

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
        .into_response()
}

/// An empty directory still serves a valid document, so it only degrades
fn check_directory(ctx: &AppContext, identities_count: usize) -> ComponentHealth {
    ComponentHealth {
        name: "identity_directory".to_string(),
        status: if identities_count > 0 { "healthy" } else { "degraded" }.to_string(),
        error: if identities_count > 0 {
            None
        } else {
            Some("No identities configured".to_string())
        },
        details: Some(serde_json::json!({
            "domain": ctx.engine.domain(),
            "identities": identities_count,
        })),
    }
}

fn check_cache(ctx: &AppContext, cache_size: usize) -> ComponentHealth {
    ComponentHealth {
        name: "verification_cache".to_string(),
        status: "healthy".to_string(),
        error: None,
        details: Some(serde_json::json!({
            "entries": cache_size,
            "ttl_seconds": ctx.engine.cache().ttl().num_seconds(),
        })),
    }
}

/// Determine overall health status from individual checks
fn determine_overall_status(checks: &[ComponentHealth]) -> String {
    let unhealthy_count = checks.iter().filter(|c| c.status == "unhealthy").count();
    let degraded_count = checks.iter().filter(|c| c.status == "degraded").count();

    if unhealthy_count > 0 {
        "unhealthy".to_string()
    } else if degraded_count > 0 {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}
