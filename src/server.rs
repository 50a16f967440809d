/// HTTP server setup and routing
use crate::{
    api::middleware::track_metrics,
    context::AppContext,
    error::{Nip05Error, Nip05Result},
};
use axum::{
    http::{header, Method},
    middleware, Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    // nostr.json must be readable from any web client
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(crate::api::routes(ctx.clone()))
        .fallback(not_found)
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// 404 handler
async fn not_found() -> Nip05Error {
    Nip05Error::NotFound("Endpoint not found".to_string())
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> Nip05Result<()> {
    let addr = ctx.config.bind_address();

    info!("NostrGator NIP-05 listening on {}", addr);
    info!("   Domain: {}", ctx.engine.domain());
    info!("   Service URL: {}", ctx.service_url());
    info!("   Hosted identities: {}", ctx.engine.identities().len());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Nip05Error::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    // Connect info feeds the per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| Nip05Error::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
