use std::sync::Arc;

use axum::http::HeaderMap;
use catalog::{CacheStore, FileCacheStore, InMemoryCacheStore, MapCache};
use codex::CodexEntry;
use persistence::{check_admin, fetch_remote, settle, LoadedMap, LoreBackend};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;

/// Header carrying the caller's wallet on admin requests.
pub const WALLET_HEADER: &str = "x-wallet-address";

pub type ServerCache = MapCache<Box<dyn CacheStore + Send>>;

#[derive(Debug, Clone)]
pub struct AdminPolicy {
    /// When off, admin routes are open and authorization is left to the
    /// backend's own procedures.
    pub require_admin: bool,
    pub master_wallet: String,
}

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn LoreBackend>,
    cache: Arc<Mutex<ServerCache>>,
    admin: Arc<AdminPolicy>,
}

/// File cache under `dir` when given and usable, else in memory.
pub fn open_cache(dir: Option<&str>) -> Box<dyn CacheStore + Send> {
    let Some(dir) = dir else {
        return Box::new(InMemoryCacheStore::new());
    };
    match FileCacheStore::open(dir) {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!("falling back to in-memory cache: {err}");
            Box::new(InMemoryCacheStore::new())
        }
    }
}

impl AppState {
    pub fn new(
        backend: Arc<dyn LoreBackend>,
        cache: Box<dyn CacheStore + Send>,
        admin: AdminPolicy,
    ) -> Self {
        Self {
            backend,
            cache: Arc::new(Mutex::new(MapCache::new(cache))),
            admin: Arc::new(admin),
        }
    }

    /// Current map and config, with cache and default fallbacks.
    ///
    /// The cache lock is taken only after the backend has answered.
    pub async fn load(&self) -> LoadedMap {
        let fetched = fetch_remote(self.backend.as_ref()).await;
        let mut cache = self.cache.lock().await;
        settle(fetched, &mut *cache)
    }

    /// Every codex entry the backend holds, typed.
    pub async fn codex_entries(&self) -> Result<Vec<CodexEntry>, ApiError> {
        let records = self.backend.fetch_codex().await?;
        Ok(records.into_iter().map(CodexEntry::from).collect())
    }

    pub async fn is_admin(&self, wallet: &str) -> bool {
        check_admin(self.backend.as_ref(), wallet, &self.admin.master_wallet).await
    }

    /// Admits the request when admin checks are off, or when its wallet
    /// header names an admin.
    pub async fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if !self.admin.require_admin {
            return Ok(());
        }
        let wallet = headers
            .get(WALLET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if self.is_admin(wallet).await {
            Ok(())
        } else {
            warn!(wallet, "admin request refused");
            Err(ApiError::unauthorized())
        }
    }
}

#[cfg(test)]
pub fn test_state(backend: Arc<persistence::MemoryBackend>, require_admin: bool) -> AppState {
    AppState::new(
        backend,
        Box::new(InMemoryCacheStore::new()),
        AdminPolicy {
            require_admin,
            master_wallet: persistence::MASTER_WALLET.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use codex::{CodexRecord, CodexRelationship, EntryId};
    use formats::rows::{LocationUpsert, RegionUpsert};
    use persistence::{BoxFuture, MemoryBackend, PersistenceError};
    use scene::defaults::default_map;
    use scene::model::{GlobalConfig, MapData};

    type Result<T> = std::result::Result<T, PersistenceError>;

    /// Seeded tables whose universe fetch takes a while and records how many
    /// ran at once.
    #[derive(Default)]
    struct SlowBackend {
        inner: MemoryBackend,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl LoreBackend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        fn fetch_regions(&self) -> BoxFuture<'_, Result<MapData>> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                self.inner.fetch_regions().await
            })
        }

        fn fetch_config(&self) -> BoxFuture<'_, Result<Option<GlobalConfig>>> {
            self.inner.fetch_config()
        }

        fn upsert_region<'a>(&'a self, region: &'a RegionUpsert) -> BoxFuture<'a, Result<()>> {
            self.inner.upsert_region(region)
        }

        fn upsert_location<'a>(
            &'a self,
            region_id: &'a str,
            location: &'a LocationUpsert,
        ) -> BoxFuture<'a, Result<()>> {
            self.inner.upsert_location(region_id, location)
        }

        fn update_config<'a>(&'a self, config: &'a GlobalConfig) -> BoxFuture<'a, Result<()>> {
            self.inner.update_config(config)
        }

        fn delete_region<'a>(&'a self, region_id: &'a str) -> BoxFuture<'a, Result<bool>> {
            self.inner.delete_region(region_id)
        }

        fn delete_location<'a>(&'a self, location_id: &'a str) -> BoxFuture<'a, Result<bool>> {
            self.inner.delete_location(location_id)
        }

        fn fetch_codex(&self) -> BoxFuture<'_, Result<Vec<CodexRecord>>> {
            self.inner.fetch_codex()
        }

        fn upsert_codex<'a>(&'a self, record: &'a CodexRecord) -> BoxFuture<'a, Result<()>> {
            self.inner.upsert_codex(record)
        }

        fn delete_codex<'a>(&'a self, entry_id: &'a EntryId) -> BoxFuture<'a, Result<bool>> {
            self.inner.delete_codex(entry_id)
        }

        fn fetch_relationships(&self) -> BoxFuture<'_, Result<Vec<CodexRelationship>>> {
            self.inner.fetch_relationships()
        }

        fn is_admin<'a>(&'a self, wallet: &'a str) -> BoxFuture<'a, Result<bool>> {
            self.inner.is_admin(wallet)
        }
    }

    #[tokio::test]
    async fn concurrent_loads_fetch_in_parallel() {
        let backend = Arc::new(SlowBackend {
            inner: MemoryBackend::seeded(),
            ..SlowBackend::default()
        });
        let state = AppState::new(
            backend.clone(),
            Box::new(InMemoryCacheStore::new()),
            AdminPolicy {
                require_admin: false,
                master_wallet: persistence::MASTER_WALLET.to_string(),
            },
        );

        let loads = (0..4).map(|_| state.load());
        let loaded = futures_util::future::join_all(loads).await;
        assert!(loaded
            .iter()
            .all(|l| l.source == persistence::LoadSource::Backend));
        assert_eq!(backend.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn file_cache_survives_backend_outage() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::seeded());
        let state = AppState::new(
            backend.clone(),
            open_cache(dir.path().to_str()),
            AdminPolicy {
                require_admin: false,
                master_wallet: persistence::MASTER_WALLET.to_string(),
            },
        );
        state.load().await;
        assert!(dir.path().join("universeData.json").exists());

        backend.fail_with(persistence::ErrorKind::Network, "offline");
        let reopened = AppState::new(
            backend,
            open_cache(dir.path().to_str()),
            AdminPolicy {
                require_admin: false,
                master_wallet: persistence::MASTER_WALLET.to_string(),
            },
        );
        let loaded = reopened.load().await;
        assert_eq!(loaded.source, persistence::LoadSource::Cache);
        assert_eq!(loaded.map, default_map());
    }

    #[tokio::test]
    async fn wallet_header_gates_admin_routes() {
        let backend = Arc::new(MemoryBackend::new().with_admin("0xabc"));
        let state = test_state(backend, true);

        let mut headers = HeaderMap::new();
        assert_eq!(
            state.require_admin(&headers).await,
            Err(ApiError::unauthorized())
        );
        headers.insert(WALLET_HEADER, "0xABC".parse().unwrap());
        assert_eq!(state.require_admin(&headers).await, Ok(()));

        let open = test_state(Arc::new(MemoryBackend::new()), false);
        assert_eq!(open.require_admin(&HeaderMap::new()).await, Ok(()));
    }
}
