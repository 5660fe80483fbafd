use scene::ids::LocationId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENTRY_COLOR: &str = "#6366f1";

/// Stable key of a codex entry, distinct from its storage row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodexKind {
    Character,
    Faction,
    Simulation,
    Artifact,
    Event,
}

impl CodexKind {
    pub const ALL: [CodexKind; 5] = [
        CodexKind::Character,
        CodexKind::Faction,
        CodexKind::Simulation,
        CodexKind::Artifact,
        CodexKind::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodexKind::Character => "character",
            CodexKind::Faction => "faction",
            CodexKind::Simulation => "simulation",
            CodexKind::Artifact => "artifact",
            CodexKind::Event => "event",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CodexKind::Character => "Characters",
            CodexKind::Faction => "Factions",
            CodexKind::Simulation => "Simulations",
            CodexKind::Artifact => "Artifacts",
            CodexKind::Event => "Events",
        }
    }
}

impl std::str::FromStr for CodexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodexKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown codex entry type: {s}"))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterStatus {
    Active,
    Deceased,
    Missing,
    Unknown,
}

impl std::str::FromStr for CharacterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CharacterStatus::Active),
            "deceased" => Ok(CharacterStatus::Deceased),
            "missing" => Ok(CharacterStatus::Missing),
            "unknown" => Ok(CharacterStatus::Unknown),
            _ => Err(format!("unknown character status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownInfo {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSection {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_condition: Option<String>,
}

fn default_color() -> String {
    DEFAULT_ENTRY_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

/// One `lore_codex_entries` row, flat, in storage shape.
///
/// Type-specific columns are optional here; [`crate::CodexEntry`] is the
/// typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodexRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub entry_id: EntryId,
    pub entry_type: CodexKind,
    pub name: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub known_info: Vec<KnownInfo>,
    #[serde(default)]
    pub locked_sections: Vec<LockedSection>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub primary_location_id: Option<LocationId>,
    #[serde(default)]
    pub appears_in_locations: Vec<LocationId>,
    #[serde(default = "default_true")]
    pub is_unlocked: bool,
    #[serde(default)]
    pub unlock_condition: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub character_role: Option<String>,
    #[serde(default)]
    pub character_status: Option<CharacterStatus>,
    #[serde(default)]
    pub character_affiliations: Vec<EntryId>,
    #[serde(default)]
    pub importance_tier: Option<u8>,
    #[serde(default)]
    pub character_tags: Vec<String>,

    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_participants: Vec<EntryId>,
    #[serde(default)]
    pub event_consequences: Vec<String>,

    #[serde(default)]
    pub timeline_era: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl CodexRecord {
    /// A blank entry with the defaults the admin form starts from.
    pub fn new(entry_id: impl Into<String>, entry_type: CodexKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            entry_id: EntryId::new(entry_id),
            entry_type,
            name: name.into(),
            subtitle: None,
            summary: String::new(),
            known_info: Vec::new(),
            locked_sections: Vec::new(),
            icon_url: None,
            image_url: None,
            color: default_color(),
            primary_location_id: None,
            appears_in_locations: Vec::new(),
            is_unlocked: true,
            unlock_condition: None,
            sort_order: 0,
            is_active: true,
            character_role: None,
            character_status: None,
            character_affiliations: Vec::new(),
            importance_tier: None,
            character_tags: Vec::new(),
            event_date: None,
            event_participants: Vec::new(),
            event_consequences: Vec::new(),
            timeline_era: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether the entry is tied to `location`, as origin or appearance.
    pub fn is_at(&self, location: &LocationId) -> bool {
        self.primary_location_id.as_ref() == Some(location)
            || self.appears_in_locations.contains(location)
    }

    pub fn is_public(&self) -> bool {
        self.is_active && self.is_unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_columns_take_defaults() {
        let r: CodexRecord = serde_json::from_str(
            r#"{ "entry_id": "kael", "entry_type": "character", "name": "Kael" }"#,
        )
        .unwrap();
        assert_eq!(r, CodexRecord::new("kael", CodexKind::Character, "Kael"));
        assert!(r.is_public());
    }

    #[test]
    fn parses_sections_and_status() {
        let r: CodexRecord = serde_json::from_str(
            r#"{
                "entry_id": "kael", "entry_type": "character", "name": "Kael",
                "known_info": [{ "title": "Origins", "content": "Born on Ice Citadel." }],
                "locked_sections": [{ "title": "Fate" }],
                "character_status": "missing",
                "appears_in_locations": ["ice-citadel"]
            }"#,
        )
        .unwrap();
        assert_eq!(r.known_info[0].title, "Origins");
        assert_eq!(r.locked_sections[0].message, None);
        assert_eq!(r.character_status, Some(CharacterStatus::Missing));
        assert!(r.is_at(&LocationId::new("ice-citadel")));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in CodexKind::ALL {
            assert_eq!(kind.as_str().parse::<CodexKind>(), Ok(kind));
        }
        assert!("dragon".parse::<CodexKind>().is_err());
    }

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!("deceased".parse::<CharacterStatus>(), Ok(CharacterStatus::Deceased));
        assert!("Deceased".parse::<CharacterStatus>().is_err());
    }
}
