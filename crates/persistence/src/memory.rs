//! In-process backend.
//!
//! Holds the same tables as the hosted database (`lore_regions`,
//! `lore_locations`, `lore_config`, `lore_codex_entries`, relationships and
//! the admin list) behind a `parking_lot::RwLock`. Used by the server when no
//! hosted backend is configured, and by tests.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use codex::{CodexRecord, CodexRelationship, EntryId};
use formats::rows::{
    ConfigRow, LocationRow, LocationUpsert, MULTIVERSE_BACKGROUND_KEY, RegionRow, RegionUpsert,
    map_from_rows, regions_from_map,
};
use parking_lot::RwLock;
use scene::defaults::{default_config, default_map};
use scene::model::{GlobalConfig, MapData};

use crate::backend::{BoxFuture, LoreBackend, Result};
use crate::error::{ErrorKind, PersistenceError};

#[derive(Debug, Default)]
struct Tables {
    regions: Vec<RegionRow>,
    locations: Vec<LocationRow>,
    config: Vec<ConfigRow>,
    codex: Vec<CodexRecord>,
    relationships: Vec<CodexRelationship>,
    admins: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    failure: RwLock<Option<(ErrorKind, String)>>,
    writes: AtomicUsize,
}

fn storage_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding the built-in universes and background.
    pub fn seeded() -> Self {
        let backend = Self::new().with_map(&default_map());
        backend.put_config(&default_config());
        backend
    }

    pub fn with_map(self, map: &MapData) -> Self {
        for region in regions_from_map(map) {
            self.put_region(&region);
            for location in &region.locations {
                // The region was just written, so the owner always exists.
                let _ = self.put_location(&region.region_id, location);
            }
        }
        self
    }

    pub fn with_codex(self, records: impl IntoIterator<Item = CodexRecord>) -> Self {
        for record in records {
            self.put_codex(&record);
        }
        self
    }

    pub fn with_relationships(self, relationships: Vec<CodexRelationship>) -> Self {
        self.tables.write().relationships.extend(relationships);
        self
    }

    pub fn with_admin(self, wallet: &str) -> Self {
        self.tables.write().admins.insert(wallet.to_lowercase());
        self
    }

    /// Makes every following call fail with `kind` until [`Self::recover`].
    pub fn fail_with(&self, kind: ErrorKind, message: impl Into<String>) {
        *self.failure.write() = Some((kind, message.into()));
    }

    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    /// Number of write calls that reached the tables.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        match &*self.failure.read() {
            Some((kind, message)) => Err(PersistenceError::new(*kind, message.clone())),
            None => Ok(()),
        }
    }

    fn put_region(&self, region: &RegionUpsert) {
        let mut tables = self.tables.write();
        let existing = tables
            .regions
            .iter()
            .position(|r| r.region_id == region.region_id);
        let previous = existing.map(|i| &tables.regions[i]);
        let row = RegionRow {
            id: previous.map(|r| r.id.clone()).unwrap_or_else(storage_id),
            region_id: region.region_id.clone(),
            name: region.name.clone(),
            description: region.description.clone(),
            color: region.color.clone(),
            cx: region.cx,
            cy: region.cy,
            thumb_url: region.thumb_url.clone(),
            background_url: region.background_url.clone(),
            image_url: region.image_url.clone(),
            sort_order: region.sort_order,
            is_active: true,
            created_at: previous.and_then(|r| r.created_at.clone()),
            updated_at: None,
        };
        match existing {
            Some(i) => tables.regions[i] = row,
            None => tables.regions.push(row),
        }
    }

    fn put_location(&self, region_id: &str, location: &LocationUpsert) -> Result<()> {
        let mut tables = self.tables.write();
        let Some(owner) = tables
            .regions
            .iter()
            .find(|r| r.region_id == region_id && r.is_active)
            .map(|r| r.id.clone())
        else {
            return Err(PersistenceError::not_found(format!("Region {region_id} not found")));
        };
        let existing = tables
            .locations
            .iter()
            .position(|l| l.location_id == location.location_id);
        let previous = existing.map(|i| &tables.locations[i]);
        let row = LocationRow {
            id: previous.map(|l| l.id.clone()).unwrap_or_else(storage_id),
            location_id: location.location_id.clone(),
            region_id: owner,
            name: location.name.clone(),
            description: location.description.clone(),
            cx: location.cx,
            cy: location.cy,
            location_type: location.location_type,
            thumb_url: location.thumb_url.clone(),
            sort_order: location.sort_order,
            is_active: true,
            created_at: previous.and_then(|l| l.created_at.clone()),
            updated_at: None,
        };
        match existing {
            Some(i) => tables.locations[i] = row,
            None => tables.locations.push(row),
        }
        Ok(())
    }

    fn put_config(&self, config: &GlobalConfig) {
        let mut tables = self.tables.write();
        let value = ConfigRow::config_value(config);
        match tables
            .config
            .iter_mut()
            .find(|c| c.config_key == MULTIVERSE_BACKGROUND_KEY)
        {
            Some(row) => row.config_value = value,
            None => tables.config.push(ConfigRow {
                id: Some(storage_id()),
                config_key: MULTIVERSE_BACKGROUND_KEY.to_string(),
                config_value: value,
                description: None,
                created_at: None,
                updated_at: None,
            }),
        }
    }

    fn put_codex(&self, record: &CodexRecord) {
        let mut tables = self.tables.write();
        let mut row = record.clone();
        row.is_active = true;
        match tables.codex.iter_mut().find(|r| r.entry_id == record.entry_id) {
            Some(slot) => {
                row.id = slot.id.clone();
                row.created_at = slot.created_at.clone();
                *slot = row;
            }
            None => {
                row.id = Some(storage_id());
                tables.codex.push(row);
            }
        }
    }

    fn apply<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.check()?;
        let out = f(self)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(out)
    }
}

impl LoreBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_regions(&self) -> BoxFuture<'_, Result<MapData>> {
        Box::pin(async move {
            self.check()?;
            let tables = self.tables.read();
            Ok(map_from_rows(tables.regions.clone(), tables.locations.clone()))
        })
    }

    fn fetch_config(&self) -> BoxFuture<'_, Result<Option<GlobalConfig>>> {
        Box::pin(async move {
            self.check()?;
            Ok(self
                .tables
                .read()
                .config
                .iter()
                .find_map(ConfigRow::global_config))
        })
    }

    fn upsert_region<'a>(&'a self, region: &'a RegionUpsert) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.apply(|b| {
                b.put_region(region);
                Ok(())
            })
        })
    }

    fn upsert_location<'a>(
        &'a self,
        region_id: &'a str,
        location: &'a LocationUpsert,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.apply(|b| b.put_location(region_id, location)) })
    }

    fn update_config<'a>(&'a self, config: &'a GlobalConfig) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.apply(|b| {
                b.put_config(config);
                Ok(())
            })
        })
    }

    fn delete_region<'a>(&'a self, region_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            self.apply(|b| {
                let mut tables = b.tables.write();
                let Some(region) = tables
                    .regions
                    .iter_mut()
                    .find(|r| r.region_id == region_id && r.is_active)
                else {
                    return Ok(false);
                };
                region.is_active = false;
                let storage = region.id.clone();
                for l in tables.locations.iter_mut().filter(|l| l.region_id == storage) {
                    l.is_active = false;
                }
                Ok(true)
            })
        })
    }

    fn delete_location<'a>(&'a self, location_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            self.apply(|b| {
                let mut tables = b.tables.write();
                Ok(tables
                    .locations
                    .iter_mut()
                    .find(|l| l.location_id == location_id && l.is_active)
                    .map(|l| l.is_active = false)
                    .is_some())
            })
        })
    }

    fn fetch_codex(&self) -> BoxFuture<'_, Result<Vec<CodexRecord>>> {
        Box::pin(async move {
            self.check()?;
            let mut records = self.tables.read().codex.clone();
            records.sort_by_key(|r| r.sort_order);
            Ok(records)
        })
    }

    fn upsert_codex<'a>(&'a self, record: &'a CodexRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.apply(|b| {
                b.put_codex(record);
                Ok(())
            })
        })
    }

    fn delete_codex<'a>(&'a self, entry_id: &'a EntryId) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            self.apply(|b| {
                let mut tables = b.tables.write();
                Ok(tables
                    .codex
                    .iter_mut()
                    .find(|r| &r.entry_id == entry_id && r.is_active)
                    .map(|r| r.is_active = false)
                    .is_some())
            })
        })
    }

    fn fetch_relationships(&self) -> BoxFuture<'_, Result<Vec<CodexRelationship>>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.tables.read().relationships.clone())
        })
    }

    fn is_admin<'a>(&'a self, wallet: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.tables.read().admins.contains(&wallet.to_lowercase()))
        })
    }
}
