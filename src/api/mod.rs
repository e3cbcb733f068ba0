pub mod handlers;
pub mod router;

use crate::cache::FundingCache;
use crate::config::Config;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use std::future::Future;
use std::net::SocketAddr;

pub struct ApiServer {
    cache: FundingCache,
}

impl ApiServer {
    pub fn new(cache: FundingCache) -> Self {
        Self { cache }
    }

    /// Binds the server to the configured port and serves until `shutdown` resolves.
    /// Installs the global Prometheus recorder, so call this once per process.
    pub async fn run(
        self,
        config: &Config,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let app = router::build(self.cache)
            .route(
                "/metrics",
                get(move || std::future::ready(metric_handle.render())),
            )
            .layer(prometheus_layer);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));

        tracing::info!("API server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::router::{self, FUNDING_PATH};
    use crate::cache::FundingCache;
    use crate::models::FundingRate;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get(cache: &FundingCache, path: &str) -> (StatusCode, Vec<u8>) {
        let response = router::build(cache.clone())
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn returns_empty_list_before_first_refresh() {
        let (status, body) = get(&FundingCache::new(), FUNDING_PATH).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn returns_snapshot_with_wire_field_names() {
        let cache = FundingCache::new();
        cache.put_all(vec![FundingRate {
            symbol: "BTCUSDT".into(),
            rate: 0.0001,
            next_funding_time_millis: 1_700_000_000_000,
            funding_interval_hours: 8,
        }]);

        let (status, body) = get(&cache, FUNDING_PATH).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!([{
                "symbol": "BTCUSDT",
                "rate": 0.0001,
                "nextFundingTimeMillis": 1_700_000_000_000u64,
                "fundingIntervalHours": 8,
            }])
        );
    }

    #[tokio::test]
    async fn reflects_latest_put() {
        let cache = FundingCache::new();
        let first = FundingRate {
            symbol: "ETHUSDT".into(),
            rate: 0.0002,
            next_funding_time_millis: 1,
            funding_interval_hours: 8,
        };
        cache.put_all(vec![first.clone()]);
        let (_, before) = get(&cache, FUNDING_PATH).await;

        let second = FundingRate {
            symbol: "SOLUSDT".into(),
            ..first
        };
        cache.put_all(vec![second.clone()]);
        let (_, after) = get(&cache, FUNDING_PATH).await;

        let before: Vec<FundingRate> = serde_json::from_slice(&before).unwrap();
        let after: Vec<FundingRate> = serde_json::from_slice(&after).unwrap();
        assert_eq!(before[0].symbol, "ETHUSDT");
        assert_eq!(after, vec![second]);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(&FundingCache::new(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }
}
