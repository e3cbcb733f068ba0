use super::TickerSource;
use crate::errors::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const TICKERS_PATH: &str = "/futures/usdt/tickers";

/// Gate sends numeric fields either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(serde_json::Number),
    Text(String),
}

/// One entry of the `/futures/usdt/tickers` listing, only the fields we use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTickerItem {
    #[serde(default)]
    pub contract: Option<String>, // e.g. "BTC_USDT"

    #[serde(default)]
    pub funding_rate: Option<RawNumber>, // e.g. 0.000099

    #[serde(default)]
    pub funding_next_apply: Option<RawNumber>, // seconds since epoch
}

pub struct GateClient {
    client: reqwest::Client,
    base_url: String,
    max_body_bytes: usize,
}

impl GateClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, max_body_bytes))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_body_bytes,
        }
    }

    /// Reads the body chunk by chunk and bails out as soon as it outgrows the limit.
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.max_body_bytes;

        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(FetchError::BodyTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl TickerSource for GateClient {
    fn name(&self) -> &'static str {
        "gate"
    }

    /// Fetches the whole USDT-settled perpetual ticker listing.
    /// Entries whose shape cannot be decoded are logged and dropped here;
    /// only transport, status and top-level JSON failures fail the call.
    async fn fetch_tickers(&self) -> Result<Vec<RawTickerItem>, FetchError> {
        let url = format!("{}{}", self.base_url, TICKERS_PATH);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = self.read_body(response).await?;
        let values: Vec<serde_json::Value> = serde_json::from_slice(&body)?;

        let items = values
            .iter()
            .filter_map(|value| match RawTickerItem::deserialize(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(
                        "[{}] dropping undecodable ticker {value}: {e}",
                        self.name()
                    );
                    None
                }
            })
            .collect();

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    /// Serves `router` on an ephemeral local port and returns the Gate-style base URL.
    async fn fake_exchange(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/v4")
    }

    fn client(base_url: String, max_body_bytes: usize) -> GateClient {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        GateClient::with_client(http, base_url, max_body_bytes)
    }

    #[tokio::test]
    async fn fetches_and_decodes_listing() {
        let router = Router::new().route(
            "/api/v4/futures/usdt/tickers",
            get(|| async {
                Json(json!([
                    {"contract": "BTC_USDT", "funding_rate": "0.0001", "funding_next_apply": 1700000000, "last": "35000"},
                    {"contract": "ETH_USDT", "funding_rate": -0.00002, "funding_next_apply": "1700003600"}
                ]))
            }),
        );
        let base = fake_exchange(router).await;

        let items = client(base, 1024 * 1024).fetch_tickers().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].contract.as_deref(), Some("BTC_USDT"));
        assert_eq!(items[0].funding_rate, Some(RawNumber::Text("0.0001".into())));
        assert_eq!(
            items[1].funding_next_apply,
            Some(RawNumber::Text("1700003600".into()))
        );
    }

    #[tokio::test]
    async fn skips_undecodable_entries_but_keeps_the_rest() {
        let router = Router::new().route(
            "/api/v4/futures/usdt/tickers",
            get(|| async {
                Json(json!([
                    {"contract": {"nested": true}, "funding_rate": 0.1},
                    "not an object",
                    {"contract": "SOL_USDT", "funding_rate": 0.0003, "funding_next_apply": 1700000000}
                ]))
            }),
        );
        let base = fake_exchange(router).await;

        let items = client(base, 1024 * 1024).fetch_tickers().await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].contract.as_deref(), Some("SOL_USDT"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let router = Router::new().route(
            "/api/v4/futures/usdt/tickers",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = fake_exchange(router).await;

        let err = client(base, 1024).fetch_tickers().await.unwrap_err();

        assert!(matches!(err, FetchError::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn malformed_body_is_a_fetch_error() {
        let router = Router::new().route(
            "/api/v4/futures/usdt/tickers",
            get(|| async { "{\"label\": \"INVALID\"" }),
        );
        let base = fake_exchange(router).await;

        let err = client(base, 1024).fetch_tickers().await.unwrap_err();

        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let router = Router::new().route(
            "/api/v4/futures/usdt/tickers",
            get(|| async { "x".repeat(4096) }),
        );
        let base = fake_exchange(router).await;

        let err = client(base, 1024).fetch_tickers().await.unwrap_err();

        assert!(matches!(err, FetchError::BodyTooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn accepts_bodies_larger_than_ten_megabytes() {
        // ~12 MiB of padding spread over many entries
        let padding = "p".repeat(1024);
        let entries: Vec<_> = (0..12 * 1024)
            .map(|i| {
                json!({
                    "contract": format!("C{i}_USDT"),
                    "funding_rate": "0.0001",
                    "funding_next_apply": 1700000000,
                    "padding": padding,
                })
            })
            .collect();
        let body = serde_json::to_string(&entries).unwrap();
        assert!(body.len() > 10 * 1024 * 1024);

        let router = Router::new().route(
            "/api/v4/futures/usdt/tickers",
            get(move || {
                let body = body.clone();
                async move { body }
            }),
        );
        let base = fake_exchange(router).await;

        let items = client(base, 16 * 1024 * 1024).fetch_tickers().await.unwrap();

        assert_eq!(items.len(), 12 * 1024);
    }
}
