use chrono::{DateTime, Duration, Utc};

use crate::models::calendar::CalendarEntry;

/// Grace window during which an entry with no end time still counts as the
/// current event after it starts.
pub const RECENT_START_GRACE_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// Has an end time and `start <= now < end`.
    Ongoing,
    /// No end time, started within the grace window.
    Started,
    /// Starts after `now`.
    Future,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub entry: CalendarEntry,
    pub kind: SelectionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub recent_start_grace: Option<Duration>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            recent_start_grace: Some(Duration::hours(RECENT_START_GRACE_HOURS)),
        }
    }
}

impl SelectionPolicy {
    /// Only entries with a known window can be current; everything else must
    /// be strictly in the future.
    pub fn strict() -> Self {
        Self {
            recent_start_grace: None,
        }
    }
}

pub fn classify(
    entry: &CalendarEntry,
    now: DateTime<Utc>,
    policy: SelectionPolicy,
) -> Option<SelectionKind> {
    match entry.end {
        Some(end) if entry.start <= now && now < end => return Some(SelectionKind::Ongoing),
        None => {
            if let Some(grace) = policy.recent_start_grace {
                if entry.start <= now && now < entry.start + grace {
                    return Some(SelectionKind::Started);
                }
            }
        }
        _ => {}
    }
    if entry.start > now {
        return Some(SelectionKind::Future);
    }
    None
}

pub fn matches_ignore(label: &str, ignore_labels: &[String]) -> bool {
    if label.is_empty() {
        return false;
    }
    let label = label.to_lowercase();
    ignore_labels
        .iter()
        .filter(|term| !term.is_empty())
        .any(|term| label.contains(&term.to_lowercase()))
}

/// Picks the single current-or-next entry: ongoing beats started beats
/// future, and within a class the earliest start wins. Ties keep the entry
/// seen first.
pub fn select_entry(
    entries: &[CalendarEntry],
    ignore_labels: &[String],
    now: DateTime<Utc>,
    policy: SelectionPolicy,
) -> Option<Selection> {
    let mut ongoing: Option<&CalendarEntry> = None;
    let mut started: Option<&CalendarEntry> = None;
    let mut future: Option<&CalendarEntry> = None;

    for entry in entries {
        if matches_ignore(&entry.label, ignore_labels) {
            continue;
        }
        let slot = match classify(entry, now, policy) {
            Some(SelectionKind::Ongoing) => &mut ongoing,
            Some(SelectionKind::Started) => &mut started,
            Some(SelectionKind::Future) => &mut future,
            None => continue,
        };
        if slot.map_or(true, |best| entry.start < best.start) {
            *slot = Some(entry);
        }
    }

    let (entry, kind) = match (ongoing, started, future) {
        (Some(entry), _, _) => (entry, SelectionKind::Ongoing),
        (None, Some(entry), _) => (entry, SelectionKind::Started),
        (None, None, Some(entry)) => (entry, SelectionKind::Future),
        (None, None, None) => return None,
    };
    Some(Selection {
        entry: entry.clone(),
        kind,
    })
}
