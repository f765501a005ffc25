use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// A single fight on a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bout {
    pub weight_class: String,
    pub red_name: String,
    pub red_record: String,
    pub blue_name: String,
    pub blue_record: String,
    pub winner: Option<String>,
    pub scheduled: Option<DateTime<Utc>>,
}

/// An organization event record after resolution, before it is tagged with
/// its organization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub banner_url: Option<String>,
    pub links: Vec<Link>,
    pub bouts: Vec<Bout>,
}

/// The cross-organization event shape handed to scheduling and formatting.
/// All instants are UTC; presentation converts to a guild zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub org: String,
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub banner_url: Option<String>,
    pub links: Vec<Link>,
    pub bouts: Vec<Bout>,
}

impl Event {
    pub fn from_resolved(org: &str, resolved: ResolvedEvent) -> Self {
        Self {
            org: org.to_string(),
            id: resolved.id,
            name: resolved.name,
            short_name: resolved.short_name,
            start: resolved.start,
            end: resolved.end,
            banner_url: resolved.banner_url,
            links: resolved.links,
            bouts: resolved.bouts,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.short_name.trim()
        } else {
            self.name.trim()
        }
    }

    pub fn org_title(&self) -> String {
        self.org.to_uppercase()
    }
}
