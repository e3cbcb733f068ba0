use crate::models::FundingRate;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No refresh has stored anything yet.
    Empty,
    Populated,
}

#[derive(Debug, Default)]
struct Snapshot {
    rates: Vec<FundingRate>,
    populated: bool,
}

/// Latest funding rate per symbol, shared between the refresh task and the
/// HTTP handlers.
///
/// The whole table lives behind one `Arc` that is swapped on every write.
/// Readers only hold the lock long enough to clone that `Arc`, so they always
/// see one complete snapshot and never wait on a writer building a new one.
#[derive(Clone, Default)]
pub struct FundingCache {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl FundingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything with `rates`, keyed by symbol. On duplicate symbols
    /// the later entry wins.
    pub fn put_all(&self, rates: impl IntoIterator<Item = FundingRate>) {
        let by_symbol: BTreeMap<String, FundingRate> = rates
            .into_iter()
            .map(|rate| (rate.symbol.clone(), rate))
            .collect();

        let next = Arc::new(Snapshot {
            rates: by_symbol.into_values().collect(),
            populated: true,
        });

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// The current snapshot, ordered by symbol. Empty before the first write.
    pub fn get_all(&self) -> Vec<FundingRate> {
        self.snapshot().rates.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> CacheState {
        if self.snapshot().populated {
            CacheState::Populated
        } else {
            CacheState::Empty
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}
