use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted per-guild configuration plus the scheduler's dedup ledgers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    pub channel_id: Option<String>,
    pub timezone: Option<String>,
    pub org: Option<String>,
    pub notify_enabled: bool,
    pub reminders_enabled: bool,
    pub run_hour: Option<u8>,
    pub ufc_ignore_contender: Option<bool>,
    /// org -> local calendar date of the last announcement
    pub last_posted: BTreeMap<String, NaiveDate>,
    /// `org:YYYY-MM-DD` -> reminder id
    pub scheduled_reminders: BTreeMap<String, String>,
}

impl GuildSettings {
    pub fn channel(&self) -> Option<&str> {
        self.channel_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn selected_org(&self) -> Option<&str> {
        self.org.as_deref().map(str::trim).filter(|o| !o.is_empty())
    }

    pub fn last_posted_for(&self, org: &str) -> Option<NaiveDate> {
        self.last_posted.get(org).copied()
    }
}

pub fn reminder_key(org: &str, date: NaiveDate) -> String {
    format!("{}:{}", org, date.format("%Y-%m-%d"))
}
