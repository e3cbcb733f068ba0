use super::handlers;
use crate::cache::FundingCache;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const FUNDING_PATH: &str = "/api/gate/funding";

/// Builds the Axum router with all public routes and the shared cache as state.
pub fn build(cache: FundingCache) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(FUNDING_PATH, get(handlers::get_funding_rates))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(cache)
}
