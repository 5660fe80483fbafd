use scene::ids::LocationId;

use crate::record::{CharacterStatus, CodexKind, CodexRecord, EntryId, KnownInfo, LockedSection};

/// Fields every codex entry has, whatever its type.
#[derive(Debug, Clone, PartialEq)]
pub struct CodexBase {
    pub storage_id: Option<String>,
    pub entry_id: EntryId,
    pub name: String,
    pub subtitle: Option<String>,
    pub summary: String,
    pub known_info: Vec<KnownInfo>,
    pub locked_sections: Vec<LockedSection>,
    pub icon_url: Option<String>,
    pub image_url: Option<String>,
    pub color: String,
    pub primary_location_id: Option<LocationId>,
    pub appears_in_locations: Vec<LocationId>,
    pub is_unlocked: bool,
    pub unlock_condition: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub timeline_era: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharacterMeta {
    pub role: Option<String>,
    pub status: Option<CharacterStatus>,
    /// Faction entry ids.
    pub affiliations: Vec<EntryId>,
    /// 1 (major) to 3 (minor).
    pub importance_tier: Option<u8>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventMeta {
    pub date: Option<String>,
    pub participants: Vec<EntryId>,
    pub consequences: Vec<String>,
}

/// A codex entry by type. Only characters and events carry extra metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum CodexEntry {
    Character { base: CodexBase, meta: CharacterMeta },
    Faction(CodexBase),
    Simulation(CodexBase),
    Artifact(CodexBase),
    Event { base: CodexBase, meta: EventMeta },
}

fn importance_tier(tier: Option<u8>) -> Option<u8> {
    tier.filter(|t| (1..=3).contains(t))
}

impl CodexEntry {
    pub fn kind(&self) -> CodexKind {
        match self {
            CodexEntry::Character { .. } => CodexKind::Character,
            CodexEntry::Faction(_) => CodexKind::Faction,
            CodexEntry::Simulation(_) => CodexKind::Simulation,
            CodexEntry::Artifact(_) => CodexKind::Artifact,
            CodexEntry::Event { .. } => CodexKind::Event,
        }
    }

    pub fn base(&self) -> &CodexBase {
        match self {
            CodexEntry::Character { base, .. } | CodexEntry::Event { base, .. } => base,
            CodexEntry::Faction(base) | CodexEntry::Simulation(base) | CodexEntry::Artifact(base) => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut CodexBase {
        match self {
            CodexEntry::Character { base, .. } | CodexEntry::Event { base, .. } => base,
            CodexEntry::Faction(base) | CodexEntry::Simulation(base) | CodexEntry::Artifact(base) => base,
        }
    }

    pub fn character(&self) -> Option<&CharacterMeta> {
        match self {
            CodexEntry::Character { meta, .. } => Some(meta),
            _ => None,
        }
    }

    pub fn event(&self) -> Option<&EventMeta> {
        match self {
            CodexEntry::Event { meta, .. } => Some(meta),
            _ => None,
        }
    }

    /// Types a storage row. Columns that do not belong to the row's type are
    /// dropped; importance tiers outside 1..=3 are discarded.
    pub fn from_record(r: CodexRecord) -> Self {
        let base = CodexBase {
            storage_id: r.id,
            entry_id: r.entry_id,
            name: r.name,
            subtitle: r.subtitle,
            summary: r.summary,
            known_info: r.known_info,
            locked_sections: r.locked_sections,
            icon_url: r.icon_url,
            image_url: r.image_url,
            color: r.color,
            primary_location_id: r.primary_location_id,
            appears_in_locations: r.appears_in_locations,
            is_unlocked: r.is_unlocked,
            unlock_condition: r.unlock_condition,
            sort_order: r.sort_order,
            is_active: r.is_active,
            timeline_era: r.timeline_era,
            created_at: r.created_at,
            updated_at: r.updated_at,
        };
        match r.entry_type {
            CodexKind::Character => CodexEntry::Character {
                base,
                meta: CharacterMeta {
                    role: r.character_role,
                    status: r.character_status,
                    affiliations: r.character_affiliations,
                    importance_tier: importance_tier(r.importance_tier),
                    tags: r.character_tags,
                },
            },
            CodexKind::Event => CodexEntry::Event {
                base,
                meta: EventMeta {
                    date: r.event_date,
                    participants: r.event_participants,
                    consequences: r.event_consequences,
                },
            },
            CodexKind::Faction => CodexEntry::Faction(base),
            CodexKind::Simulation => CodexEntry::Simulation(base),
            CodexKind::Artifact => CodexEntry::Artifact(base),
        }
    }

    pub fn into_record(self) -> CodexRecord {
        let kind = self.kind();
        let (base, character, event) = match self {
            CodexEntry::Character { base, meta } => (base, meta, EventMeta::default()),
            CodexEntry::Event { base, meta } => (base, CharacterMeta::default(), meta),
            CodexEntry::Faction(base) | CodexEntry::Simulation(base) | CodexEntry::Artifact(base) => {
                (base, CharacterMeta::default(), EventMeta::default())
            }
        };
        CodexRecord {
            id: base.storage_id,
            entry_id: base.entry_id,
            entry_type: kind,
            name: base.name,
            subtitle: base.subtitle,
            summary: base.summary,
            known_info: base.known_info,
            locked_sections: base.locked_sections,
            icon_url: base.icon_url,
            image_url: base.image_url,
            color: base.color,
            primary_location_id: base.primary_location_id,
            appears_in_locations: base.appears_in_locations,
            is_unlocked: base.is_unlocked,
            unlock_condition: base.unlock_condition,
            sort_order: base.sort_order,
            is_active: base.is_active,
            character_role: character.role,
            character_status: character.status,
            character_affiliations: character.affiliations,
            importance_tier: character.importance_tier,
            character_tags: character.tags,
            event_date: event.date,
            event_participants: event.participants,
            event_consequences: event.consequences,
            timeline_era: base.timeline_era,
            created_at: base.created_at,
            updated_at: base.updated_at,
        }
    }
}

impl From<CodexRecord> for CodexEntry {
    fn from(r: CodexRecord) -> Self {
        CodexEntry::from_record(r)
    }
}

impl From<CodexEntry> for CodexRecord {
    fn from(e: CodexEntry) -> Self {
        e.into_record()
    }
}
