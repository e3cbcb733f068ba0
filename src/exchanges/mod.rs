use crate::errors::FetchError;
use async_trait::async_trait;

pub mod gate;
pub mod normalize;

pub use gate::{GateClient, RawTickerItem};

/// Something that can hand back the full ticker listing of a futures venue.
#[async_trait]
pub trait TickerSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// One call to the listing endpoint. No retries.
    async fn fetch_tickers(&self) -> Result<Vec<RawTickerItem>, FetchError>;
}
