use crate::cache::FundingCache;
use crate::models::FundingRate;
use axum::{extract::State, response::Json};

/// GET /health — simple liveness check
pub async fn health() -> &'static str {
    "OK"
}

/// GET /api/gate/funding — the latest snapshot as stored, `[]` before the first refresh
pub async fn get_funding_rates(State(cache): State<FundingCache>) -> Json<Vec<FundingRate>> {
    Json(cache.get_all())
}
