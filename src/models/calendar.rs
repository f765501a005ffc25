use chrono::{DateTime, Utc};

use crate::service::time_parse::{parse_instant, parse_optional_instant};

/// One labeled date range from the upstream schedule, not yet resolved to a
/// full event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub event_ref: Option<String>,
}

impl CalendarEntry {
    /// Builds an entry from raw upstream fields. Returns `None` when the start
    /// does not parse or the end precedes the start; an unparseable end is
    /// treated as absent.
    pub fn parse(label: &str, start: &str, end: &str, event_ref: &str) -> Option<Self> {
        let start = parse_instant(start).ok()?;
        let end = parse_optional_instant(end);
        if matches!(end, Some(end) if end < start) {
            return None;
        }
        let event_ref = Some(event_ref.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        Some(Self {
            label: label.to_string(),
            start,
            end,
            event_ref,
        })
    }
}
