//! Subset of the ESPN MMA JSON documents the bot reads. Every field is
//! optional upstream, so everything defaults.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoreboardRoot {
    pub leagues: Vec<League>,
    pub events: Vec<EspnEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct League {
    pub calendar: Vec<CalEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalEntry {
    pub label: String,
    pub start_date: String,
    pub end_date: String,
    pub event: RefLink,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefLink {
    #[serde(rename = "$ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EspnEvent {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub date: String,
    pub competitions: Vec<Competition>,
    pub links: Vec<EventLink>,
    pub logos: Vec<Logo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Competition {
    pub id: String,
    pub date: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "type")]
    pub kind: CompType,
    pub competitors: Vec<Competitor>,
    pub status: CompStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompType {
    pub id: String,
    pub abbreviation: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompStatus {
    #[serde(rename = "type")]
    pub kind: StatusType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusType {
    pub state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Competitor {
    pub order: i64,
    pub winner: bool,
    pub athlete: Athlete,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Athlete {
    pub full_name: String,
    pub display_name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Record {
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventLink {
    pub href: String,
    pub text: String,
    pub short_text: String,
    pub rel: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Logo {
    pub href: String,
}

// Core API shapes used by the card fallback.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompetitionList {
    pub items: Vec<RefLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoreCompetition {
    #[serde(rename = "type")]
    pub kind: CompType,
    pub competitors: Vec<CoreCompetitor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoreCompetitor {
    pub athlete: RefLink,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AthleteDetail {
    pub display_name: String,
}
