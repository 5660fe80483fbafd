use std::fs;
use std::path::{Path, PathBuf};

use scene::model::{GlobalConfig, MapData, ModelIssue};
use serde::Deserialize;
use serde_json::Value;

use crate::save_request::{SaveRequest, SaveRequestError};

/// A map document on disk: either a bare universe list (the local cache
/// format) or a save body `{ config?, regions }`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub map: MapData,
    pub config: Option<GlobalConfig>,
    /// Problems found while loading; rejected entities were dropped.
    pub issues: Vec<ModelIssue>,
}

#[derive(Debug)]
pub enum MapFileError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
    Body(SaveRequestError),
}

impl std::fmt::Display for MapFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapFileError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            MapFileError::Json(e) => write!(f, "invalid map JSON: {e}"),
            MapFileError::Body(e) => write!(f, "invalid map document: {e}"),
        }
    }
}

impl std::error::Error for MapFileError {}

impl MapDocument {
    pub fn from_value(value: Value) -> Result<Self, MapFileError> {
        let (map, config) = match value {
            Value::Array(_) => (MapData::deserialize(value).map_err(MapFileError::Json)?, None),
            body => {
                let req = SaveRequest::parse_entities(&body).map_err(MapFileError::Body)?;
                (req.to_map(), req.config)
            }
        };
        let (map, issues) = map.sanitize();
        Ok(Self { map, config, issues })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, MapFileError> {
        Self::from_value(serde_json::from_str(raw).map_err(MapFileError::Json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapFileError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| MapFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_list() {
        let doc = MapDocument::from_json_str(
            r##"[{ "id": "u1", "name": "A", "color": "#fff", "cx": 1, "cy": 2 }]"##,
        )
        .unwrap();
        assert_eq!(doc.map.universes.len(), 1);
        assert_eq!(doc.config, None);
    }

    #[test]
    fn accepts_save_body_and_reports_issues() {
        let doc = MapDocument::from_json_str(
            r#"{
                "config": { "multiverseBackgroundUrl": "/bg.webm" },
                "regions": [
                    { "id": "u1", "cx": 1, "cy": 2 },
                    { "id": "u1", "cx": 3, "cy": 4 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.map.universes.len(), 1);
        assert_eq!(doc.issues.len(), 1);
        assert_eq!(doc.config.unwrap().multiverse_background_url, "/bg.webm");
    }

    #[test]
    fn reports_bad_json() {
        assert!(matches!(
            MapDocument::from_json_str("{ nope"),
            Err(MapFileError::Json(_))
        ));
        assert!(matches!(
            MapDocument::from_json_str(r#"{ "regions": 3 }"#),
            Err(MapFileError::Body(SaveRequestError::InvalidRegions))
        ));
    }
}
