//! Initial map load: backend first, then the local cache, then the built-in
//! universes.

use catalog::{CacheStore, MapCache};
use scene::defaults::{default_config, default_map};
use scene::model::{GlobalConfig, MapData};
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::LoreBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    Backend,
    Cache,
    Defaults,
}

impl LoadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSource::Backend => "backend",
            LoadSource::Cache => "cache",
            LoadSource::Defaults => "defaults",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    pub map: MapData,
    pub config: GlobalConfig,
    pub source: LoadSource,
}

/// What the backend answered, already cleaned. `None` means a miss.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fetched {
    pub map: Option<MapData>,
    pub config: Option<GlobalConfig>,
}

/// Fetches map data and config concurrently, without touching the cache.
///
/// An empty answer, a failure, or a map left empty after cleaning is a miss.
pub async fn fetch_remote(backend: &dyn LoreBackend) -> Fetched {
    let (regions, config) = futures_util::future::join(backend.fetch_regions(), backend.fetch_config()).await;

    let map = match regions {
        Ok(map) => clean(map, backend.name()),
        Err(e) => {
            warn!(backend = backend.name(), error = %e, "failed to fetch universes");
            None
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            warn!(backend = backend.name(), error = %e, "failed to fetch config");
            None
        }
    };
    Fetched { map, config }
}

/// Settles a fetch against the cache.
///
/// A backend map wins and is written through to the cache; otherwise the
/// cached map, then defaults. The config falls back independently.
pub fn settle<S: CacheStore>(fetched: Fetched, cache: &mut MapCache<S>) -> LoadedMap {
    let Fetched {
        map: fetched_map,
        config: fetched_config,
    } = fetched;

    if let Some(map) = &fetched_map {
        if let Err(e) = cache.store_map(map) {
            warn!(error = %e, "failed to cache universes");
        }
    }
    if let Some(config) = &fetched_config {
        if let Err(e) = cache.store_config(config) {
            warn!(error = %e, "failed to cache config");
        }
    }

    let (cached_map, cached_config) = if fetched_map.is_none() || fetched_config.is_none() {
        cache.fallback()
    } else {
        (None, None)
    };
    let cached_map = if fetched_map.is_none() {
        cached_map.and_then(|map| clean(map, "cache"))
    } else {
        None
    };

    let (map, source) = match (fetched_map, cached_map) {
        (Some(map), _) => (map, LoadSource::Backend),
        (None, Some(map)) => (map, LoadSource::Cache),
        (None, None) => (default_map(), LoadSource::Defaults),
    };
    let config = fetched_config.or(cached_config).unwrap_or_else(default_config);

    info!(
        source = source.as_str(),
        universes = map.universes.len(),
        locations = map.location_count(),
        "map loaded"
    );
    LoadedMap { map, config, source }
}

/// Drops unusable entities; an empty result is a miss.
fn clean(map: MapData, origin: &str) -> Option<MapData> {
    let (map, issues) = map.sanitize();
    for issue in &issues {
        warn!(origin, %issue, "map data issue");
    }
    if map.is_empty() {
        warn!(origin, "no usable universes");
        return None;
    }
    Some(map)
}
