/// Metrics and telemetry for the NIP-05 service
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - NIP-05 requests by endpoint type
/// - Verification outcomes by domain
/// - Verification cache hit/miss rates

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Encoder, Gauge, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "nip05_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "nip05_http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== NIP-05 Metrics ==========

    /// NIP-05 requests by type (well-known, verification)
    pub static ref NIP05_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "nip05_requests_total",
        "Total NIP-05 requests",
        &["type"]
    )
    .unwrap();

    /// Verification attempts by outcome (success, failed, error) and domain
    pub static ref NIP05_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "nip05_verifications_total",
        "Total NIP-05 verifications",
        &["status", "domain"]
    )
    .unwrap();

    /// Request-level errors by type
    pub static ref NIP05_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "nip05_errors_total",
        "Total NIP-05 errors",
        &["type"]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    pub static ref CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        "nip05_cache_hits_total",
        "Total number of verification cache hits"
    )
    .unwrap();

    pub static ref CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        "nip05_cache_misses_total",
        "Total number of verification cache misses"
    )
    .unwrap();

    /// Cache size (number of entries)
    pub static ref CACHE_SIZE: IntGauge = register_int_gauge!(
        "nip05_cache_size",
        "Number of entries in the verification cache"
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "nip05_uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a NIP-05 request by endpoint type
pub fn record_nip05_request(request_type: &str) {
    NIP05_REQUESTS_TOTAL.with_label_values(&[request_type]).inc();
}

/// Record a verification outcome
pub fn record_verification(status: &str, domain: &str) {
    NIP05_VERIFICATIONS_TOTAL
        .with_label_values(&[status, domain])
        .inc();
}

/// Record a request-level error
pub fn record_error(error_type: &str) {
    NIP05_ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Record a cache access
pub fn record_cache_access(hit: bool) {
    if hit {
        CACHE_HITS_TOTAL.inc();
    } else {
        CACHE_MISSES_TOTAL.inc();
    }
}
