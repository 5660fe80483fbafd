use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry::CodexEntry;
use crate::record::{CodexKind, EntryId};

pub const MIN_STRENGTH: u8 = 1;
pub const MAX_STRENGTH: u8 = 10;

fn default_strength() -> u8 {
    5
}

/// A typed, weighted link between two codex entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodexRelationship {
    #[serde(default)]
    pub id: Option<String>,
    pub from_entry_id: EntryId,
    pub to_entry_id: EntryId,
    pub relationship_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_strength")]
    pub strength: u8,
}

impl CodexRelationship {
    pub fn new(from: &str, to: &str, relationship_type: &str, strength: u8) -> Self {
        Self {
            id: None,
            from_entry_id: EntryId::new(from),
            to_entry_id: EntryId::new(to),
            relationship_type: relationship_type.to_string(),
            description: None,
            strength,
        }
    }

    fn other_end(&self, entry: &EntryId) -> Option<&EntryId> {
        if &self.from_entry_id == entry {
            Some(&self.to_entry_id)
        } else if &self.to_entry_id == entry {
            Some(&self.from_entry_id)
        } else {
            None
        }
    }
}

/// The far end of a relationship, as shown next to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedEntry {
    pub entry_id: EntryId,
    pub entry_type: CodexKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub relationship_type: String,
    pub relationship_strength: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// The related entry has been soft-deleted.
    pub stale: bool,
}

/// Entries linked to `entry` in either direction, strongest first.
///
/// Links to ids with no entry at all are skipped; links to soft-deleted
/// entries are kept and flagged `stale`. A pair linked both ways with the same
/// type is listed once.
pub fn related_entries(
    entry: &EntryId,
    relationships: &[CodexRelationship],
    entries: &[CodexEntry],
) -> Vec<RelatedEntry> {
    let mut out: Vec<RelatedEntry> = Vec::new();
    for rel in relationships {
        let Some(other) = rel.other_end(entry) else {
            continue;
        };
        if other == entry {
            continue;
        }
        let Some(target) = entries.iter().find(|e| &e.base().entry_id == other) else {
            continue;
        };
        let duplicate = out
            .iter()
            .any(|r| &r.entry_id == other && r.relationship_type == rel.relationship_type);
        if duplicate {
            continue;
        }
        let base = target.base();
        out.push(RelatedEntry {
            entry_id: base.entry_id.clone(),
            entry_type: target.kind(),
            name: base.name.clone(),
            subtitle: base.subtitle.clone(),
            relationship_type: rel.relationship_type.clone(),
            relationship_strength: rel.strength.clamp(MIN_STRENGTH, MAX_STRENGTH),
            description: rel.description.clone(),
            color: base.color.clone(),
            icon_url: base.icon_url.clone(),
            stale: !base.is_active,
        });
    }
    out.sort_by(|a, b| {
        b.relationship_strength
            .cmp(&a.relationship_strength)
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

/// Buckets related entries by relationship type, keeping their order.
pub fn group_by_relationship(related: Vec<RelatedEntry>) -> BTreeMap<String, Vec<RelatedEntry>> {
    let mut groups: BTreeMap<String, Vec<RelatedEntry>> = BTreeMap::new();
    for r in related {
        groups.entry(r.relationship_type.clone()).or_default().push(r);
    }
    groups
}
