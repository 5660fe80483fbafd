use std::collections::BTreeMap;

use scene::ids::{LocationId, UniverseId};
use scene::model::{MapData, Universe};
use serde::{Deserialize, Serialize};

use crate::entry::CodexEntry;
use crate::record::{CharacterStatus, CodexKind, EntryId};

/// Browse filters. Empty fields do not constrain; list fields match any of
/// their values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodexFilter {
    pub entry_type: Option<CodexKind>,
    /// Universe whose locations the entry appears in.
    pub simulation_id: Option<UniverseId>,
    pub location_id: Option<LocationId>,
    /// Faction entry; matches the faction itself and characters affiliated to it.
    pub faction_id: Option<EntryId>,
    pub character_status: Vec<CharacterStatus>,
    pub importance_tier: Vec<u8>,
    pub timeline_era: Option<String>,
    pub character_tags: Vec<String>,
    /// Case-insensitive substring of name or summary.
    pub search: Option<String>,
}

impl CodexFilter {
    pub fn is_empty(&self) -> bool {
        *self == CodexFilter::default()
    }

    pub fn matches(&self, entry: &CodexEntry, map: &MapData) -> bool {
        let base = entry.base();
        let character = entry.character();

        if self.entry_type.is_some_and(|k| k != entry.kind()) {
            return false;
        }
        if let Some(universe) = &self.simulation_id {
            let in_universe = map
                .universe(universe)
                .is_some_and(|u| appears_in_universe(entry, u));
            if !in_universe {
                return false;
            }
        }
        if let Some(location) = &self.location_id {
            if !is_at(entry, location) {
                return false;
            }
        }
        if let Some(faction) = &self.faction_id {
            let is_faction = entry.kind() == CodexKind::Faction && &base.entry_id == faction;
            let affiliated = character.is_some_and(|c| c.affiliations.contains(faction));
            if !is_faction && !affiliated {
                return false;
            }
        }
        if !self.character_status.is_empty() {
            let status = character.and_then(|c| c.status);
            if !status.is_some_and(|s| self.character_status.contains(&s)) {
                return false;
            }
        }
        if !self.importance_tier.is_empty() {
            let tier = character.and_then(|c| c.importance_tier);
            if !tier.is_some_and(|t| self.importance_tier.contains(&t)) {
                return false;
            }
        }
        if let Some(era) = &self.timeline_era {
            if base.timeline_era.as_ref() != Some(era) {
                return false;
            }
        }
        if !self.character_tags.is_empty() {
            let tagged = character.is_some_and(|c| c.tags.iter().any(|t| self.character_tags.contains(t)));
            if !tagged {
                return false;
            }
        }
        if let Some(query) = self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            let hit = base.name.to_lowercase().contains(&query)
                || base.summary.to_lowercase().contains(&query);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn is_at(entry: &CodexEntry, location: &LocationId) -> bool {
    let base = entry.base();
    base.primary_location_id.as_ref() == Some(location) || base.appears_in_locations.contains(location)
}

fn appears_in_universe(entry: &CodexEntry, universe: &Universe) -> bool {
    entry
        .base()
        .appears_in_locations
        .iter()
        .any(|id| universe.location(id).is_some())
}

fn by_sort_order(entries: &mut [&CodexEntry]) {
    entries.sort_by_key(|e| e.base().sort_order);
}

/// Active, unlocked entries ordered by `sort_order`.
pub fn public_entries(entries: &[CodexEntry]) -> Vec<&CodexEntry> {
    let mut out: Vec<_> = entries
        .iter()
        .filter(|e| e.base().is_active && e.base().is_unlocked)
        .collect();
    by_sort_order(&mut out);
    out
}

/// Looks up an active entry by its stable id.
pub fn find_entry<'a>(entries: &'a [CodexEntry], id: &EntryId) -> Option<&'a CodexEntry> {
    entries
        .iter()
        .find(|e| e.base().is_active && &e.base().entry_id == id)
}

/// Public entries that originate at or appear in `location`.
pub fn entries_at_location<'a>(entries: &'a [CodexEntry], location: &LocationId) -> Vec<&'a CodexEntry> {
    public_entries(entries)
        .into_iter()
        .filter(|e| is_at(e, location))
        .collect()
}

/// Public entries appearing in any location of `universe`.
pub fn entries_for_universe<'a>(entries: &'a [CodexEntry], universe: &Universe) -> Vec<&'a CodexEntry> {
    public_entries(entries)
        .into_iter()
        .filter(|e| appears_in_universe(e, universe))
        .collect()
}

pub fn filter_entries<'a>(
    entries: &'a [CodexEntry],
    filter: &CodexFilter,
    map: &MapData,
) -> Vec<&'a CodexEntry> {
    public_entries(entries)
        .into_iter()
        .filter(|e| filter.matches(e, map))
        .collect()
}

/// Buckets entries by type. Every type is present, possibly empty.
pub fn group_by_kind<'a>(
    entries: impl IntoIterator<Item = &'a CodexEntry>,
) -> BTreeMap<CodexKind, Vec<&'a CodexEntry>> {
    let mut groups: BTreeMap<_, Vec<_>> = CodexKind::ALL.into_iter().map(|k| (k, Vec::new())).collect();
    for e in entries {
        groups.entry(e.kind()).or_default().push(e);
    }
    groups
}

/// A location reference of an entry, resolved against the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationLink {
    pub universe: UniverseId,
    pub location: LocationId,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationLinks {
    pub resolved: Vec<LocationLink>,
    /// Referenced ids that no longer exist on the map.
    pub missing: Vec<LocationId>,
}

/// Resolves an entry's primary and appearance locations. Broken references
/// are collected, not fatal.
pub fn resolve_locations(entry: &CodexEntry, map: &MapData) -> LocationLinks {
    let base = entry.base();
    let mut links = LocationLinks::default();
    let primary = base.primary_location_id.iter().map(|id| (id, true));
    let appears = base
        .appears_in_locations
        .iter()
        .filter(|id| base.primary_location_id.as_ref() != Some(*id))
        .map(|id| (id, false));

    for (id, is_primary) in primary.chain(appears) {
        match map.find_location(id) {
            Some((u, l)) => links.resolved.push(LocationLink {
                universe: u.id.clone(),
                location: l.id.clone(),
                is_primary,
            }),
            None => links.missing.push(id.clone()),
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CodexRecord;
    use pretty_assertions::assert_eq;
    use scene::defaults::default_map;

    fn character(id: &str, order: i32, locations: &[&str]) -> CodexRecord {
        let mut r = CodexRecord::new(id, CodexKind::Character, id);
        r.sort_order = order;
        r.appears_in_locations = locations.iter().map(|l| LocationId::new(*l)).collect();
        r
    }

    fn sample() -> Vec<CodexEntry> {
        let mut kael = character("kael", 2, &["ice-citadel"]);
        kael.summary = "A pilot lost in the Cryo Wastes".into();
        kael.character_status = Some(CharacterStatus::Missing);
        kael.importance_tier = Some(1);
        kael.character_tags = vec!["pilot".into()];
        kael.character_affiliations = vec![EntryId::new("iron-pact")];

        let mut vera = character("vera", 1, &["smelter-complex"]);
        vera.character_status = Some(CharacterStatus::Active);
        vera.importance_tier = Some(2);

        let mut pact = CodexRecord::new("iron-pact", CodexKind::Faction, "Iron Pact");
        pact.sort_order = 0;
        pact.primary_location_id = Some(LocationId::new("smelter-complex"));
        pact.timeline_era = Some("Forge Era".into());

        let mut hidden = character("hidden", 0, &["ice-citadel"]);
        hidden.is_unlocked = false;

        let mut gone = character("gone", 0, &["ice-citadel"]);
        gone.is_active = false;

        vec![kael, vera, pact, hidden, gone]
            .into_iter()
            .map(CodexEntry::from)
            .collect()
    }

    fn ids(entries: &[&CodexEntry]) -> Vec<String> {
        entries.iter().map(|e| e.base().entry_id.to_string()).collect()
    }

    #[test]
    fn public_listing_is_sorted_and_visible_only() {
        let entries = sample();
        assert_eq!(ids(&public_entries(&entries)), vec!["iron-pact", "vera", "kael"]);
    }

    #[test]
    fn find_skips_soft_deleted() {
        let entries = sample();
        assert!(find_entry(&entries, &EntryId::new("gone")).is_none());
        assert!(find_entry(&entries, &EntryId::new("hidden")).is_some());
    }

    #[test]
    fn at_location_includes_primary() {
        let entries = sample();
        let here = entries_at_location(&entries, &LocationId::new("smelter-complex"));
        assert_eq!(ids(&here), vec!["iron-pact", "vera"]);
    }

    #[test]
    fn universe_membership_uses_appearances() {
        let entries = sample();
        let map = default_map();
        let cryo = map.universe(&UniverseId::new("cryo-wastes")).unwrap();
        assert_eq!(ids(&entries_for_universe(&entries, cryo)), vec!["kael"]);
    }

    #[test]
    fn filters_combine() {
        let entries = sample();
        let map = default_map();

        let f = CodexFilter {
            faction_id: Some(EntryId::new("iron-pact")),
            ..Default::default()
        };
        assert_eq!(ids(&filter_entries(&entries, &f, &map)), vec!["iron-pact", "kael"]);

        let f = CodexFilter {
            character_status: vec![CharacterStatus::Active, CharacterStatus::Missing],
            importance_tier: vec![2],
            ..Default::default()
        };
        assert_eq!(ids(&filter_entries(&entries, &f, &map)), vec!["vera"]);

        let f = CodexFilter {
            search: Some("CRYO".into()),
            simulation_id: Some(UniverseId::new("cryo-wastes")),
            ..Default::default()
        };
        assert_eq!(ids(&filter_entries(&entries, &f, &map)), vec!["kael"]);

        let f = CodexFilter {
            simulation_id: Some(UniverseId::new("nowhere")),
            ..Default::default()
        };
        assert!(filter_entries(&entries, &f, &map).is_empty());

        let f = CodexFilter {
            timeline_era: Some("Forge Era".into()),
            entry_type: Some(CodexKind::Faction),
            ..Default::default()
        };
        assert_eq!(ids(&filter_entries(&entries, &f, &map)), vec!["iron-pact"]);
        assert!(CodexFilter::default().is_empty());
    }

    #[test]
    fn groups_cover_every_kind() {
        let entries = sample();
        let groups = group_by_kind(public_entries(&entries));
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[&CodexKind::Character].len(), 2);
        assert!(groups[&CodexKind::Event].is_empty());
    }

    #[test]
    fn broken_location_links_are_reported() {
        let mut r = CodexRecord::new("relic", CodexKind::Artifact, "Relic");
        r.primary_location_id = Some(LocationId::new("void-eye"));
        r.appears_in_locations = vec![LocationId::new("void-eye"), LocationId::new("razed-city")];
        let links = resolve_locations(&CodexEntry::from(r), &default_map());
        assert_eq!(
            links.resolved,
            vec![LocationLink {
                universe: UniverseId::new("void-expanse"),
                location: LocationId::new("void-eye"),
                is_primary: true,
            }]
        );
        assert_eq!(links.missing, vec![LocationId::new("razed-city")]);
    }
}
