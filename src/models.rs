use serde::{Deserialize, Serialize};

/// Latest funding rate of one perpetual contract, as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub symbol: String,
    pub rate: f64,
    pub next_funding_time_millis: u64,
    pub funding_interval_hours: u32,
}
