/// API routes and handlers
pub mod health;
pub mod middleware;
pub mod verify;
pub mod well_known;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .merge(well_known::routes())
        .merge(verify::routes(ctx))
        .merge(health::routes())
}
