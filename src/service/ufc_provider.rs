use std::sync::Arc;

use chrono::Datelike;
use serenity::async_trait;
use tracing::{debug, info};

use crate::clients::espn_client::EventSource;
use crate::clients::espn_types::EspnEvent;
use crate::error::SourceError;
use crate::models::calendar::CalendarEntry;
use crate::models::event::Event;
use crate::service::calendar_selector::{SelectionPolicy, select_entry};
use crate::service::card_builder::sort_bouts;
use crate::service::event_resolver::{Resolution, resolve_event};
use crate::service::provider::{Provider, ProviderContext};

pub const UFC_ORG: &str = "ufc";
pub const CONTENDER_SERIES_LABEL: &str = "Contender Series";

/// Calendar and event records merged across the surrounding season years.
#[derive(Debug, Default)]
pub struct MergedSchedule {
    pub entries: Vec<CalendarEntry>,
    pub events: Vec<EspnEvent>,
}

pub struct UfcProvider {
    source: Arc<dyn EventSource>,
    policy: SelectionPolicy,
}

impl UfcProvider {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Previous, current and next year, concatenated in year order. Any
    /// failing year fails the whole fetch.
    pub async fn merge_scoreboards(&self, year: i32) -> Result<MergedSchedule, SourceError> {
        let mut merged = MergedSchedule::default();
        for y in [year - 1, year, year + 1] {
            let root = self.source.fetch_scoreboard(y).await?;
            if let Some(league) = root.leagues.first() {
                merged.entries.extend(league.calendar.iter().filter_map(|raw| {
                    CalendarEntry::parse(&raw.label, &raw.start_date, &raw.end_date, &raw.event.reference)
                }));
            }
            merged.events.extend(root.events);
        }
        debug!(
            entries = merged.entries.len(),
            events = merged.events.len(),
            "merged scoreboards"
        );
        Ok(merged)
    }
}

fn ignore_labels(ctx: &ProviderContext) -> Vec<String> {
    match ctx.flags.ufc_ignore_contender {
        Some(false) => Vec::new(),
        _ => vec![CONTENDER_SERIES_LABEL.to_string()],
    }
}

#[async_trait]
impl Provider for UfcProvider {
    async fn next_event(&self, ctx: &ProviderContext) -> Result<Option<Event>, SourceError> {
        let schedule = self.merge_scoreboards(ctx.now.year()).await?;
        let ignore = ignore_labels(ctx);
        let Some(selection) = select_entry(&schedule.entries, &ignore, ctx.now, self.policy) else {
            debug!(org = UFC_ORG, "no calendar entry selected");
            return Ok(None);
        };

        let resolution = resolve_event(&selection.entry, &schedule.events, self.source.as_ref()).await;
        match &resolution {
            Resolution::Resolved { tier, .. } => {
                debug!(org = UFC_ORG, label = %selection.entry.label, ?tier, "event resolved");
            }
            Resolution::DegradedResolved { tier, card, .. } => {
                info!(org = UFC_ORG, label = %selection.entry.label, ?tier, ?card, "event resolved without embedded card");
            }
            Resolution::Failed(_) => {}
        }
        let mut resolved = resolution.into_result()?;
        resolved.bouts = sort_bouts(&resolved.bouts);
        Ok(Some(Event::from_resolved(UFC_ORG, resolved)))
    }
}
