//! Local fallback cache for map data.
//!
//! Two keys, written after every successful backend load and read only when
//! the backend is unreachable: `universeData` (the universe list) and
//! `universeConfig` (the global config).

use std::collections::BTreeMap;

use scene::model::{GlobalConfig, MapData};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

pub const UNIVERSE_DATA_KEY: &str = "universeData";
pub const UNIVERSE_CONFIG_KEY: &str = "universeConfig";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    StorageUnavailable,
    InvalidKey(String),
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::StorageUnavailable => write!(f, "browser storage unavailable"),
            CacheError::InvalidKey(key) => write!(f, "invalid cache key: {key}"),
            CacheError::Corrupt(msg) => write!(f, "cache storage corrupt: {msg}"),
            CacheError::Io(msg) => write!(f, "cache storage error: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

/// String key/value storage.
pub trait CacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
    /// Returns `true` if the key existed.
    fn remove(&mut self, key: &str) -> Result<bool, CacheError>;
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCacheStore {
    items: BTreeMap<String, String>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
        Ok(self.items.remove(key).is_some())
    }
}

/// Typed access to the map cache over any [`CacheStore`].
#[derive(Debug, Default)]
pub struct MapCache<S> {
    store: S,
}

impl<S: CacheStore> MapCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::Corrupt(format!("{key}: {e}")))
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(|e| CacheError::Io(e.to_string()))?;
        self.store.set(key, &raw)
    }

    pub fn load_map(&self) -> Result<Option<MapData>, CacheError> {
        self.read(UNIVERSE_DATA_KEY)
    }

    pub fn load_config(&self) -> Result<Option<GlobalConfig>, CacheError> {
        self.read(UNIVERSE_CONFIG_KEY)
    }

    pub fn store_map(&mut self, map: &MapData) -> Result<(), CacheError> {
        self.write(UNIVERSE_DATA_KEY, map)
    }

    pub fn store_config(&mut self, config: &GlobalConfig) -> Result<(), CacheError> {
        self.write(UNIVERSE_CONFIG_KEY, config)
    }

    /// Reads both keys for use as a fallback. Unreadable entries are logged
    /// and treated as absent; an empty universe list counts as absent.
    pub fn fallback(&self) -> (Option<MapData>, Option<GlobalConfig>) {
        let map = self.load_map().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring cached map data");
            None
        });
        let config = self.load_config().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring cached config");
            None
        });
        (map.filter(|m| !m.is_empty()), config)
    }

    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.store.remove(UNIVERSE_DATA_KEY)?;
        self.store.remove(UNIVERSE_CONFIG_KEY)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod file_store {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{CacheError, CacheStore};

    /// One file per key under a directory. For native tools and servers.
    #[derive(Debug, Clone)]
    pub struct FileCacheStore {
        root: PathBuf,
    }

    impl FileCacheStore {
        pub fn open(root: impl AsRef<Path>) -> Result<Self, CacheError> {
            let root = root.as_ref().to_path_buf();
            fs::create_dir_all(&root)
                .map_err(|e| CacheError::Io(format!("create {}: {e}", root.display())))?;
            Ok(Self { root })
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
            let valid = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
                && !key.starts_with('.');
            if !valid {
                return Err(CacheError::InvalidKey(key.to_string()));
            }
            Ok(self.root.join(format!("{key}.json")))
        }
    }

    impl CacheStore for FileCacheStore {
        fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            let path = self.path_for(key)?;
            match fs::read_to_string(&path) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CacheError::Io(format!("read {}: {e}", path.display()))),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
            let path = self.path_for(key)?;
            // Write-then-rename: readers never see a torn value.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, value).map_err(|e| CacheError::Io(format!("write {}: {e}", tmp.display())))?;
            fs::rename(&tmp, &path).map_err(|e| CacheError::Io(format!("rename {}: {e}", path.display())))
        }

        fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
            let path = self.path_for(key)?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(CacheError::Io(format!("remove {}: {e}", path.display()))),
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileCacheStore;

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{CacheError, CacheStore};
    use wasm_bindgen::JsValue;

    /// `window.localStorage`, keys used verbatim.
    #[derive(Debug)]
    pub struct LocalStorageCacheStore {
        storage: web_sys::Storage,
    }

    impl LocalStorageCacheStore {
        pub fn new() -> Result<Self, CacheError> {
            Ok(Self {
                storage: window_local_storage()?,
            })
        }
    }

    fn js_err(op: &str, e: JsValue) -> CacheError {
        CacheError::Io(format!("{op} failed: {:?}", e))
    }

    impl CacheStore for LocalStorageCacheStore {
        fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.storage.get_item(key).map_err(|e| js_err("get_item", e))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
            // Quota errors surface here.
            self.storage.set_item(key, value).map_err(|e| js_err("set_item", e))
        }

        fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
            let existed = self.get(key)?.is_some();
            self.storage.remove_item(key).map_err(|e| js_err("remove_item", e))?;
            Ok(existed)
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, CacheError> {
        let win = web_sys::window().ok_or(CacheError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| js_err("localStorage", e))?
            .ok_or(CacheError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageCacheStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageCacheStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageCacheStore {
    pub fn new() -> Result<Self, CacheError> {
        Err(CacheError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CacheStore for LocalStorageCacheStore {
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), CacheError> {
        Err(CacheError::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::StorageUnavailable)
    }
}
