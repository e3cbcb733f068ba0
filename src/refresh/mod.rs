use crate::cache::{CacheState, FundingCache};
use crate::config::EmptyResponsePolicy;
use crate::exchanges::TickerSource;
use crate::exchanges::normalize::normalize_batch;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How often the funding listing is pulled from the exchange.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(60_000);

/// What a single tick ended up doing to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated { stored: usize, skipped: usize },
    /// Exchange returned nothing; previous snapshot kept.
    EmptyKept,
    /// Exchange returned nothing; cache replaced with the empty snapshot.
    EmptyCleared,
    FetchFailed,
    Panicked,
}

impl TickOutcome {
    fn label(&self) -> &'static str {
        match self {
            TickOutcome::Updated { .. } => "updated",
            TickOutcome::EmptyKept => "empty_kept",
            TickOutcome::EmptyCleared => "empty_cleared",
            TickOutcome::FetchFailed => "fetch_failed",
            TickOutcome::Panicked => "panicked",
        }
    }
}

/// Fetch, normalize and store one full funding snapshot per tick.
/// This is the only writer of the cache.
pub struct RefreshCycle {
    source: Arc<dyn TickerSource>,
    cache: FundingCache,
    empty_policy: EmptyResponsePolicy,
}

impl RefreshCycle {
    pub fn new(
        source: Arc<dyn TickerSource>,
        cache: FundingCache,
        empty_policy: EmptyResponsePolicy,
    ) -> Self {
        Self {
            source,
            cache,
            empty_policy,
        }
    }

    /// Runs one cycle. Never fails and never panics outward: whatever goes
    /// wrong is logged and the cache keeps its last complete snapshot.
    pub async fn tick(&self) -> TickOutcome {
        let outcome = match AssertUnwindSafe(self.run_once()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(
                    "[{}] refresh tick panicked, keeping previous snapshot",
                    self.source.name()
                );
                TickOutcome::Panicked
            }
        };

        metrics::counter!("gate_refresh_total", "outcome" => outcome.label()).increment(1);
        metrics::gauge!("gate_cache_entries").set(self.cache.len() as f64);
        outcome
    }

    async fn run_once(&self) -> TickOutcome {
        let name = self.source.name();
        tracing::info!("[{name}] updating funding cache...");

        let items = match self.source.fetch_tickers().await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("[{name}] failed to fetch funding rates: {e}");
                return TickOutcome::FetchFailed;
            }
        };

        if items.is_empty() {
            return match self.empty_policy {
                EmptyResponsePolicy::Keep => {
                    tracing::warn!(
                        "[{name}] empty response, keeping {} cached entries",
                        self.cache.len()
                    );
                    TickOutcome::EmptyKept
                }
                EmptyResponsePolicy::Clear => {
                    tracing::warn!("[{name}] empty response, clearing cache");
                    self.cache.put_all(Vec::new());
                    TickOutcome::EmptyCleared
                }
            };
        }

        let (batch, skipped) = normalize_batch(&items);
        if skipped > 0 {
            metrics::counter!("gate_items_skipped_total").increment(skipped as u64);
        }

        let first_snapshot = self.cache.state() == CacheState::Empty;
        self.cache.put_all(batch);
        let stored = self.cache.len();

        if first_snapshot {
            tracing::info!("[{name}] first funding snapshot stored");
        }

        tracing::info!(
            "[{name}] funding cache updated: {stored} entries ({} raw, {skipped} skipped)",
            items.len()
        );
        TickOutcome::Updated { stored, skipped }
    }

    /// Spawns the refresh loop. The first tick fires right away, later ones
    /// every `period`; a slow tick delays the next one instead of bursting.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "[{}] refresh loop started, every {}s",
                self.source.name(),
                period.as_secs()
            );

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }
}
