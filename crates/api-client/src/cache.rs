// In crates/api-client/src/cache.rs

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use app_config::CacheSettings;
use async_trait::async_trait;
use core_types::Bar;
use tokio::time::Instant;

use crate::MarketDataProvider;
use crate::types::BarRequest;

struct CacheEntry {
    fetched_at: Instant,
    bars: Vec<Bar>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<BarRequest, CacheEntry>,
    /// Insertion order, oldest first.
    order: VecDeque<BarRequest>,
}

/// Wraps a provider with an explicit, bounded cache keyed by the full request.
///
/// Entries live for `ttl`; once `capacity` is exceeded the oldest entry is evicted.
/// Failed fetches are never cached.
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            ttl,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn from_settings(inner: P, settings: &CacheSettings) -> Self {
        Self::new(inner, Duration::from_secs(settings.ttl_secs), settings.max_entries)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // A poisoned lock only means another request panicked mid-update; the map is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, request: &BarRequest) -> Option<Vec<Bar>> {
        let mut state = self.lock();
        let fresh = state
            .entries
            .get(request)
            .map(|entry| entry.fetched_at.elapsed() < self.ttl)?;
        if fresh {
            return state.entries.get(request).map(|entry| entry.bars.clone());
        }
        state.entries.remove(request);
        state.order.retain(|key| key != request);
        None
    }

    fn store(&self, request: BarRequest, bars: Vec<Bar>) {
        let mut state = self.lock();
        if state.entries.insert(request, CacheEntry { fetched_at: Instant::now(), bars }).is_none() {
            state.order.push_back(request);
        }
        while state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else { break };
            state.entries.remove(&oldest);
            tracing::debug!(pair = %oldest.pair, timeframe = %oldest.timeframe, "Evicted cached bars.");
        }
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_bars(&self, request: &BarRequest) -> core_types::Result<Vec<Bar>> {
        if let Some(bars) = self.lookup(request) {
            tracing::debug!(pair = %request.pair, timeframe = %request.timeframe, "Serving bars from cache.");
            return Ok(bars);
        }
        let bars = self.inner.fetch_bars(request).await?;
        self.store(*request, bars.clone());
        Ok(bars)
    }
}
