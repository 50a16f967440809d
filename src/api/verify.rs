/// Verification API endpoints
/// POST /api/verify and GET /api/verify/:identifier
use crate::{
    context::AppContext,
    error::{Nip05Error, Nip05Result},
    identity::{Identifier, Pubkey, VerificationRecord},
    metrics,
    rate_limit::rate_limit_middleware,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

/// Build verification routes (rate limited per client IP)
pub fn routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .route("/api/verify", post(verify_post))
        .route("/api/verify/:identifier", get(verify_get))
        .route_layer(middleware::from_fn_with_state(ctx, rate_limit_middleware))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Identifier to verify (e.g., "bob@example.com")
    pub identifier: Option<String>,
    /// Optional pubkey (hex or npub) the identifier must resolve to
    pub pubkey: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub pubkey: Option<String>,
}

pub async fn verify_post(
    State(ctx): State<AppContext>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Nip05Result<Json<VerificationRecord>> {
    // Unparseable bodies and a missing identifier are both client input errors
    let Json(req) = body.map_err(|rejection| {
        count_error(Nip05Error::MalformedIdentifier(format!(
            "Expected a JSON body with a string identifier: {}",
            rejection.body_text()
        )))
    })?;
    let identifier = req.identifier.ok_or_else(|| {
        count_error(Nip05Error::MalformedIdentifier(
            "Missing identifier".to_string(),
        ))
    })?;

    verify(&ctx, &identifier, req.pubkey.as_deref()).await
}

pub async fn verify_get(
    State(ctx): State<AppContext>,
    Path(identifier): Path<String>,
    Query(params): Query<VerifyParams>,
) -> Nip05Result<Json<VerificationRecord>> {
    verify(&ctx, &identifier, params.pubkey.as_deref()).await
}

async fn verify(
    ctx: &AppContext,
    raw_identifier: &str,
    raw_pubkey: Option<&str>,
) -> Nip05Result<Json<VerificationRecord>> {
    // Client input is rejected before any lookup or network call
    let identifier = Identifier::parse(raw_identifier).map_err(count_error)?;
    let expected = raw_pubkey
        .filter(|p| !p.trim().is_empty())
        .map(Pubkey::normalize)
        .transpose()
        .map_err(count_error)?;

    metrics::record_nip05_request("verification");

    let record = ctx
        .engine
        .verify_expecting(&identifier, expected.as_ref())
        .await
        .map_err(count_error)?;

    Ok(Json(record))
}

fn count_error(e: Nip05Error) -> Nip05Error {
    metrics::record_error("verification");
    e
}
