use crate::entry::CodexEntry;

pub const UNKNOWN_ERA: &str = "Unknown Era";

/// Events of one era, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct EraGroup<'a> {
    pub era: String,
    pub events: Vec<&'a CodexEntry>,
}

/// Groups event entries by `timeline_era`.
///
/// Eras appear in the order their first event is seen. Inside an era events
/// sort by `event_date` (string order); undated events go last, keeping their
/// relative order.
pub fn timeline<'a>(entries: impl IntoIterator<Item = &'a CodexEntry>) -> Vec<EraGroup<'a>> {
    let mut groups: Vec<EraGroup<'a>> = Vec::new();
    for entry in entries {
        if entry.event().is_none() {
            continue;
        }
        let era = entry
            .base()
            .timeline_era
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(UNKNOWN_ERA);
        match groups.iter_mut().find(|g| g.era == era) {
            Some(group) => group.events.push(entry),
            None => groups.push(EraGroup {
                era: era.to_string(),
                events: vec![entry],
            }),
        }
    }
    for group in &mut groups {
        group.events.sort_by(|a, b| {
            let date = |e: &CodexEntry| e.event().and_then(|m| m.date.clone());
            match (date(a), date(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CodexKind, CodexRecord};

    fn event(id: &str, era: Option<&str>, date: Option<&str>) -> CodexEntry {
        let mut r = CodexRecord::new(id, CodexKind::Event, id);
        r.timeline_era = era.map(str::to_string);
        r.event_date = date.map(str::to_string);
        CodexEntry::from(r)
    }

    #[test]
    fn groups_by_era_and_sorts_by_date() {
        let entries = vec![
            event("fall", Some("Second Age"), Some("2401-03")),
            event("rumour", Some("First Age"), None),
            event("founding", Some("First Age"), Some("2100")),
            event("rise", Some("Second Age"), Some("2350")),
            event("lost", None, None),
            CodexEntry::from(CodexRecord::new("kael", CodexKind::Character, "Kael")),
            event("echo", Some("First Age"), None),
        ];
        let groups = timeline(&entries);

        let shape: Vec<(String, Vec<String>)> = groups
            .iter()
            .map(|g| {
                (
                    g.era.clone(),
                    g.events.iter().map(|e| e.base().entry_id.to_string()).collect(),
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Second Age".to_string(), vec!["rise".to_string(), "fall".to_string()]),
                (
                    "First Age".to_string(),
                    vec!["founding".to_string(), "rumour".to_string(), "echo".to_string()]
                ),
                (UNKNOWN_ERA.to_string(), vec!["lost".to_string()]),
            ]
        );
    }

    #[test]
    fn no_events_no_groups() {
        let entries = vec![CodexEntry::from(CodexRecord::new("a", CodexKind::Artifact, "A"))];
        assert!(timeline(&entries).is_empty());
    }
}
