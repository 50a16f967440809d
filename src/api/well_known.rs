/// Well-known endpoints
/// Serves /.well-known/nostr.json for NIP-05 discovery
use crate::{context::AppContext, identity::WellKnownDocument, metrics};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

/// Build well-known routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/.well-known/nostr.json", get(nostr_json))
}

#[derive(Debug, Deserialize)]
pub struct NostrJsonParams {
    /// Optional local part to narrow the document to
    pub name: Option<String>,
}

/// /.well-known/nostr.json
///
/// Built fresh from the configured directory on every request.
pub async fn nostr_json(
    State(ctx): State<AppContext>,
    Query(params): Query<NostrJsonParams>,
) -> Json<WellKnownDocument> {
    metrics::record_nip05_request("well-known");

    let name = params.name.as_deref().filter(|n| !n.is_empty());
    Json(ctx.engine.directory(name))
}
