//! Sequential multi-entity save with a per-item report.
//!
//! Items are written one call at a time, each universe followed by its
//! locations. A failed universe skips its locations; other failures are
//! recorded and the save carries on. An authorization failure stops the
//! save, since every later call would be refused too.

use formats::rows::RegionUpsert;
use formats::save_request::SaveRequest;
use serde::Serialize;
use tracing::{error, info};

use crate::backend::LoreBackend;
use crate::error::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SaveItem {
    Region { id: String },
    Location { region: String, id: String },
    Config,
}

impl std::fmt::Display for SaveItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveItem::Region { id } => write!(f, "region {id}"),
            SaveItem::Location { region, id } => write!(f, "location {id} of region {region}"),
            SaveItem::Config => f.write_str("config"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailure {
    pub item: SaveItem,
    pub error: String,
    pub unauthorized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkReport {
    pub succeeded: Vec<SaveItem>,
    pub failed: Vec<SaveFailure>,
    /// Items never attempted because an earlier failure made them moot.
    pub skipped: Vec<SaveItem>,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.failed.iter().any(|f| f.unauthorized)
    }

    pub fn first_error(&self) -> Option<&str> {
        self.failed.first().map(|f| f.error.as_str())
    }

    fn fail(&mut self, item: SaveItem, e: PersistenceError) {
        error!(%item, error = %e, "save failed");
        self.failed.push(SaveFailure {
            item,
            error: e.message.clone(),
            unauthorized: e.is_unauthorized(),
        });
    }

    fn skip_rest(&mut self, regions: &[RegionUpsert]) {
        for r in regions {
            self.skipped.push(SaveItem::Region {
                id: r.region_id.clone(),
            });
            self.skip_locations(r);
        }
    }

    fn skip_locations(&mut self, region: &RegionUpsert) {
        for l in &region.locations {
            self.skipped.push(SaveItem::Location {
                region: region.region_id.clone(),
                id: l.location_id.clone(),
            });
        }
    }
}

pub async fn bulk_upsert(backend: &dyn LoreBackend, regions: &[RegionUpsert]) -> BulkReport {
    let mut report = BulkReport::default();
    upsert_into(backend, regions, &mut report).await;
    report
}

async fn upsert_into(backend: &dyn LoreBackend, regions: &[RegionUpsert], report: &mut BulkReport) {
    for (i, region) in regions.iter().enumerate() {
        let item = SaveItem::Region {
            id: region.region_id.clone(),
        };
        if let Err(e) = backend.upsert_region(region).await {
            let stop = e.is_unauthorized();
            report.fail(item, e);
            report.skip_locations(region);
            if stop {
                report.skip_rest(&regions[i + 1..]);
                return;
            }
            continue;
        }
        report.succeeded.push(item);

        for (j, location) in region.locations.iter().enumerate() {
            let item = SaveItem::Location {
                region: region.region_id.clone(),
                id: location.location_id.clone(),
            };
            match backend.upsert_location(&region.region_id, location).await {
                Ok(()) => report.succeeded.push(item),
                Err(e) if e.is_unauthorized() => {
                    report.fail(item, e);
                    for rest in &region.locations[j + 1..] {
                        report.skipped.push(SaveItem::Location {
                            region: region.region_id.clone(),
                            id: rest.location_id.clone(),
                        });
                    }
                    report.skip_rest(&regions[i + 1..]);
                    return;
                }
                Err(e) => report.fail(item, e),
            }
        }
    }
}

/// Writes a parsed admin save: universes and locations, then the background
/// setting when the request carried one.
pub async fn save_all(backend: &dyn LoreBackend, request: &SaveRequest) -> BulkReport {
    let mut report = BulkReport::default();
    upsert_into(backend, &request.regions, &mut report).await;

    if let Some(config) = &request.config {
        if report.is_unauthorized() {
            report.skipped.push(SaveItem::Config);
        } else {
            match backend.update_config(config).await {
                Ok(()) => report.succeeded.push(SaveItem::Config),
                Err(e) => report.fail(SaveItem::Config, e),
            }
        }
    }

    info!(
        backend = backend.name(),
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "bulk save finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryBackend;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request() -> SaveRequest {
        SaveRequest::parse(&json!({
            "config": { "multiverseBackgroundUrl": "/v.mp4" },
            "regions": [
                { "id": "u1", "name": "Alpha", "color": "#fff", "cx": 10, "cy": 20,
                  "locations": [{ "id": "l1", "name": "Outpost", "cx": 11, "cy": 21, "type": "station" }] },
                { "id": "u2", "name": "Beta", "color": "#000", "cx": 30, "cy": 40,
                  "locations": [{ "id": "l2", "name": "Ruin", "cx": 31, "cy": 41 }] }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn saves_every_item_in_order() {
        let b = MemoryBackend::new();
        let report = save_all(&b, &request()).await;
        assert!(report.is_complete());
        assert_eq!(
            report.succeeded,
            vec![
                SaveItem::Region { id: "u1".into() },
                SaveItem::Location { region: "u1".into(), id: "l1".into() },
                SaveItem::Region { id: "u2".into() },
                SaveItem::Location { region: "u2".into(), id: "l2".into() },
                SaveItem::Config,
            ]
        );
        assert_eq!(b.write_count(), 5);
    }

    #[tokio::test]
    async fn unauthorized_stops_the_save() {
        let b = MemoryBackend::new();
        b.fail_with(ErrorKind::Backend, "Unauthorized: admin only");
        let report = save_all(&b, &request()).await;
        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(report.is_unauthorized());
        assert_eq!(report.first_error(), Some("Unauthorized: admin only"));
        assert_eq!(report.skipped.len(), 4);
        assert_eq!(report.skipped.last(), Some(&SaveItem::Config));
    }

    #[tokio::test]
    async fn other_failures_are_reported_per_item() {
        let b = MemoryBackend::new();
        b.fail_with(ErrorKind::Network, "offline");
        let report = bulk_upsert(&b, &request().regions).await;
        assert_eq!(report.failed.len(), 2);
        assert!(!report.is_unauthorized());
        assert_eq!(
            report.skipped,
            vec![
                SaveItem::Location { region: "u1".into(), id: "l1".into() },
                SaveItem::Location { region: "u2".into(), id: "l2".into() },
            ]
        );
        assert_eq!(report.first_error(), Some("offline"));
    }
}
