//! Process-wide, lazily initialized, read-only loot-data cache with
//! single-flight semantics (spec §3/§5: "concurrent first-use requests
//! share one inflight fetch"). The fetch itself — hitting whatever backing
//! store or remote service actually holds loot tables — is an external
//! collaborator out of scope for this crate (spec §1); this module only
//! owns the cache and the single-entry key, mirroring the
//! `moka::future::Cache` field the teacher keeps on its `Universe` for the
//! analogous "expensive, rarely-changing, process-wide" warp-jump graph.

use crate::error::{PlannerError, PlannerResult};
use crate::models::LootData;
use futures::future::BoxFuture;
use lazy_static::lazy_static;
use moka::future::Cache;
use std::sync::{Arc, RwLock};

/// The out-of-scope collaborator's contract: produce a [`LootData`] or fail.
pub trait LootDataFetcher: Send + Sync {
    fn fetch(&self) -> BoxFuture<'static, PlannerResult<LootData>>;
}

struct NoFetcherConfigured;

impl LootDataFetcher for NoFetcherConfigured {
    fn fetch(&self) -> BoxFuture<'static, PlannerResult<LootData>> {
        Box::pin(async {
            Err(PlannerError::LootData(
                "no loot-data fetcher installed and no lootData override supplied".to_string(),
            ))
        })
    }
}

pub struct LootCache {
    cache: Cache<(), Arc<LootData>>,
    fetcher: RwLock<Arc<dyn LootDataFetcher>>,
}

impl LootCache {
    pub fn new() -> Self {
        LootCache {
            cache: Cache::new(1),
            fetcher: RwLock::new(Arc::new(NoFetcherConfigured)),
        }
    }

    /// Installs the fetcher the cache delegates to on a miss. Call once at
    /// process startup; the API layer (out of scope here) owns the actual
    /// HTTP/binary-decoding fetcher implementation.
    pub fn install_fetcher(&self, fetcher: Arc<dyn LootDataFetcher>) {
        *self.fetcher.write().unwrap() = fetcher;
    }

    /// Returns the cached loot data, fetching it on first use. Concurrent
    /// callers that miss at the same time share the single inflight fetch
    /// via `moka`'s `try_get_with`.
    pub async fn get(&self) -> PlannerResult<Arc<LootData>> {
        let fetcher = self.fetcher.read().unwrap().clone();
        self.cache
            .try_get_with((), fetcher.fetch())
            .await
            .map_err(|e: Arc<PlannerError>| PlannerError::LootData(e.to_string()))
    }
}

impl Default for LootCache {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    pub static ref LOOT_CACHE: LootCache = LootCache::new();
}
