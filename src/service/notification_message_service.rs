use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::event::{Bout, Event};
use crate::service::card_builder::build_card;
use crate::service::schedule::GuildZone;

pub const EMBED_COLOUR: u32 = 0xE74C3C;
pub const FIELD_VALUE_LIMIT: usize = 1024;

const START_FORMAT: &str = "%a %b %-d, %-I:%M %p %Z";
const BOUT_TIME_FORMAT: &str = "%-I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Platform-neutral embed; the Discord sender converts it to a builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventEmbed {
    pub title: String,
    pub url: Option<String>,
    pub description: String,
    pub colour: u32,
    pub image_url: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl EventEmbed {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

pub struct NotificationMessageService;

impl NotificationMessageService {
    pub fn build_message(event: &Event, zone: &GuildZone) -> String {
        format!(
            "{} Fight Night: {}\n{}",
            event.org_title(),
            event.display_name(),
            start_line(event.start, zone)
        )
    }

    pub fn build_embed(event: &Event, zone: &GuildZone) -> EventEmbed {
        let mut fields = Vec::new();

        let links: Vec<String> = event
            .links
            .iter()
            .filter(|l| !l.url.trim().is_empty())
            .map(|l| format!("[{}]({})", l.title, l.url))
            .collect();
        if !links.is_empty() {
            fields.push(EmbedField {
                name: "Links".to_string(),
                value: truncate_field(&links.join("\n")),
            });
        }

        let card = build_card(&event.name, &event.short_name, &event.bouts);
        if !card.main_card.is_empty() {
            fields.push(EmbedField {
                name: "Main Card".to_string(),
                value: format_bouts(&card.main_card, zone),
            });
        }
        if !card.prelims.is_empty() {
            fields.push(EmbedField {
                name: "Prelims".to_string(),
                value: format_bouts(&card.prelims, zone),
            });
        }

        EventEmbed {
            title: format!("{}: {}", event.org_title(), event.display_name()),
            url: primary_event_url(event),
            description: start_line(event.start, zone),
            colour: EMBED_COLOUR,
            image_url: event
                .banner_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            fields,
        }
    }

    /// Plain-text summary used by `/next-event` and the CLI.
    pub fn describe_next_event(event: &Event, zone: &GuildZone) -> String {
        let card = build_card(&event.name, &event.short_name, &event.bouts);
        let mut out = format!(
            "{}: {}\n{}",
            event.org_title(),
            event.display_name(),
            start_line(event.start, zone)
        );
        if let Some(url) = primary_event_url(event) {
            out.push_str(&format!("\n{}", url));
        }
        if !card.main_card.is_empty() {
            out.push_str(&format!("\n\nMain Card\n{}", format_bouts(&card.main_card, zone)));
        }
        if !card.prelims.is_empty() {
            out.push_str(&format!("\n\nPrelims\n{}", format_bouts(&card.prelims, zone)));
        }
        out
    }
}

fn start_line(start: DateTime<Utc>, zone: &GuildZone) -> String {
    format!("Starts: {} ({})", zone.format(start, START_FORMAT), zone.name())
}

/// First link that looks like the event page, else the first link.
pub fn primary_event_url(event: &Event) -> Option<String> {
    let preferred = event.links.iter().find(|l| {
        let title = l.title.trim().to_lowercase();
        let looks_like_event = title == "event page"
            || title == "gamecast"
            || title.contains("preview")
            || title.contains("event");
        looks_like_event && !l.url.trim().is_empty()
    });
    preferred
        .or_else(|| event.links.first())
        .map(|l| l.url.clone())
        .filter(|u| !u.trim().is_empty())
}

pub fn format_bouts(bouts: &[Bout], zone: &GuildZone) -> String {
    if bouts.is_empty() {
        return "—".to_string();
    }
    let lines: Vec<String> = bouts
        .iter()
        .map(|bout| {
            let mut line = format!("{} vs {}", bout.red_name.trim(), bout.blue_name.trim());
            let weight = bout.weight_class.trim();
            if !weight.is_empty() {
                line.push_str(" — ");
                line.push_str(weight);
            }
            if let Some(scheduled) = bout.scheduled {
                line.push_str(" — ");
                line.push_str(&zone.format(scheduled, BOUT_TIME_FORMAT));
            }
            line
        })
        .collect();
    truncate_field(&lines.join("\n"))
}

fn truncate_field(value: &str) -> String {
    if value.chars().count() <= FIELD_VALUE_LIMIT {
        return value.to_string();
    }
    let mut out: String = value.chars().take(FIELD_VALUE_LIMIT - 3).collect();
    out.push_str("...");
    out
}
