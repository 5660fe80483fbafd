use std::future::Future;
use std::pin::Pin;

use codex::{CodexRecord, CodexRelationship, EntryId};
use formats::rows::{LocationUpsert, RegionUpsert};
use scene::model::{GlobalConfig, MapData};

use crate::error::PersistenceError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// The lore tables behind the app.
///
/// Writes are keyed by the stable string ids the client uses and are
/// idempotent. Deletes are soft: rows are marked inactive and disappear from
/// reads. Methods return boxed futures for dyn-compatibility.
pub trait LoreBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Active universes with their active locations, ordered by `sort_order`.
    fn fetch_regions(&self) -> BoxFuture<'_, Result<MapData>>;

    /// The multiverse background setting, if it has ever been written.
    fn fetch_config(&self) -> BoxFuture<'_, Result<Option<GlobalConfig>>>;

    fn upsert_region<'a>(&'a self, region: &'a RegionUpsert) -> BoxFuture<'a, Result<()>>;

    /// `region_id` is the owning universe's logical id.
    fn upsert_location<'a>(
        &'a self,
        region_id: &'a str,
        location: &'a LocationUpsert,
    ) -> BoxFuture<'a, Result<()>>;

    fn update_config<'a>(&'a self, config: &'a GlobalConfig) -> BoxFuture<'a, Result<()>>;

    /// Soft-deletes a universe and its locations. Returns `false` if no
    /// active universe had that id.
    fn delete_region<'a>(&'a self, region_id: &'a str) -> BoxFuture<'a, Result<bool>>;

    fn delete_location<'a>(&'a self, location_id: &'a str) -> BoxFuture<'a, Result<bool>>;

    /// Every codex row, including inactive and locked ones.
    fn fetch_codex(&self) -> BoxFuture<'_, Result<Vec<CodexRecord>>>;

    fn upsert_codex<'a>(&'a self, record: &'a CodexRecord) -> BoxFuture<'a, Result<()>>;

    fn delete_codex<'a>(&'a self, entry_id: &'a EntryId) -> BoxFuture<'a, Result<bool>>;

    fn fetch_relationships(&self) -> BoxFuture<'_, Result<Vec<CodexRelationship>>>;

    fn is_admin<'a>(&'a self, wallet: &'a str) -> BoxFuture<'a, Result<bool>>;
}
