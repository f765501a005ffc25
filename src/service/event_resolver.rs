use chrono::Duration;
use tracing::{debug, warn};

use crate::clients::espn_client::{EventSource, FallbackBout};
use crate::clients::espn_types::{Competitor, EspnEvent};
use crate::error::SourceError;
use crate::models::calendar::CalendarEntry;
use crate::models::event::{Bout, Link, ResolvedEvent};
use crate::service::time_parse::{parse_instant, parse_optional_instant};

/// Maximum distance between a calendar entry and a record's own date for the
/// name-based match.
pub const FUZZY_MATCH_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverTier {
    IdMatch,
    FuzzyMatch,
    Fetched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFallback {
    /// The core competitions API supplied the bouts.
    Fetched,
    /// No bouts could be recovered; the event is shown without a card.
    Unavailable,
}

#[derive(Debug)]
pub enum Resolution {
    Resolved {
        event: ResolvedEvent,
        tier: ResolverTier,
    },
    /// The record carried no competitions and the card fallback was used.
    DegradedResolved {
        event: ResolvedEvent,
        tier: ResolverTier,
        card: CardFallback,
    },
    Failed(SourceError),
}

impl Resolution {
    pub fn into_result(self) -> Result<ResolvedEvent, SourceError> {
        match self {
            Resolution::Resolved { event, .. } | Resolution::DegradedResolved { event, .. } => {
                Ok(event)
            }
            Resolution::Failed(err) => Err(err),
        }
    }
}

/// Extracts the numeric id following the first `/events/` segment that is
/// followed by digits.
pub fn event_id_from_ref(reference: &str) -> Option<&str> {
    const SEGMENT: &str = "/events/";
    reference.match_indices(SEGMENT).find_map(|(pos, _)| {
        let rest = &reference[pos + SEGMENT.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let id = &rest[..end];
        (!id.is_empty()).then_some(id)
    })
}

fn similar_name(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

pub fn match_by_id<'a>(entry: &CalendarEntry, records: &'a [EspnEvent]) -> Option<&'a EspnEvent> {
    let id = entry.event_ref.as_deref().and_then(event_id_from_ref)?;
    records.iter().find(|record| record.id == id)
}

pub fn match_by_name_and_time<'a>(
    entry: &CalendarEntry,
    records: &'a [EspnEvent],
) -> Option<&'a EspnEvent> {
    let window = Duration::hours(FUZZY_MATCH_WINDOW_HOURS);
    records.iter().find(|record| {
        let Ok(record_start) = parse_instant(&record.date) else {
            return false;
        };
        if (record_start - entry.start).abs() > window {
            return false;
        }
        similar_name(&record.name, &entry.label) || similar_name(&record.short_name, &entry.label)
    })
}

/// Turns a selected calendar entry into a full event record, trying the id
/// match, then the name/time match, then a direct fetch of the entry's
/// reference. Missing card data falls back to the core competitions API.
pub async fn resolve_event<S: EventSource + ?Sized>(
    entry: &CalendarEntry,
    records: &[EspnEvent],
    source: &S,
) -> Resolution {
    let (record, tier) = if let Some(record) = match_by_id(entry, records) {
        (record.clone(), ResolverTier::IdMatch)
    } else if let Some(record) = match_by_name_and_time(entry, records) {
        (record.clone(), ResolverTier::FuzzyMatch)
    } else if let Some(reference) = entry.event_ref.as_deref() {
        match source.fetch_event(reference).await {
            Ok(record) => (record, ResolverTier::Fetched),
            Err(err) => return Resolution::Failed(err),
        }
    } else {
        return Resolution::Failed(SourceError::ResolutionFailed {
            label: entry.label.clone(),
        });
    };
    debug!(label = %entry.label, event_id = %record.id, ?tier, "calendar entry resolved");

    let mut event = build_record(&record, entry);
    if !event.bouts.is_empty() || event.id.is_empty() {
        return Resolution::Resolved { event, tier };
    }

    let card = match source.fetch_card(&event.id).await {
        Ok(bouts) if !bouts.is_empty() => {
            event.bouts = bouts.into_iter().map(adapt_fallback_bout).collect();
            CardFallback::Fetched
        }
        Ok(_) => CardFallback::Unavailable,
        Err(err) => {
            warn!(event_id = %event.id, error = %err, "card fallback failed");
            CardFallback::Unavailable
        }
    };
    Resolution::DegradedResolved { event, tier, card }
}

fn adapt_fallback_bout(bout: FallbackBout) -> Bout {
    Bout {
        weight_class: bout.weight_class,
        red_name: bout.fighter1,
        blue_name: bout.fighter2,
        ..Bout::default()
    }
}

/// Maps an upstream record onto the resolved shape. The event window comes
/// from the calendar entry.
pub fn build_record(record: &EspnEvent, entry: &CalendarEntry) -> ResolvedEvent {
    let name = first_non_empty(&[&record.name, &record.short_name]).to_string();
    let links = record
        .links
        .iter()
        .filter(|l| !l.href.trim().is_empty())
        .map(|l| {
            let raw = first_non_empty(&[&l.text, &l.short_text]);
            let title = if raw.trim().eq_ignore_ascii_case("gamecast") {
                "Event Page"
            } else if raw.trim().is_empty() {
                "Link"
            } else {
                raw
            };
            Link {
                title: title.to_string(),
                url: l.href.clone(),
            }
        })
        .collect();
    let banner_url = record
        .logos
        .first()
        .map(|logo| logo.href.trim())
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    ResolvedEvent {
        id: record.id.clone(),
        name,
        short_name: record.short_name.clone(),
        start: entry.start,
        end: entry.end,
        banner_url,
        links,
        bouts: extract_bouts(record),
    }
}

pub fn extract_bouts(record: &EspnEvent) -> Vec<Bout> {
    record
        .competitions
        .iter()
        .map(|competition| {
            let (red, blue) = corner_names(&competition.competitors);
            let (red_record, blue_record) = corner_records(&competition.competitors);
            let winner = if competition.status.kind.state.eq_ignore_ascii_case("post") {
                winner_name(&competition.competitors, &red, &blue)
            } else {
                None
            };
            let scheduled = [&competition.start_date, &competition.date]
                .into_iter()
                .find_map(|raw| parse_optional_instant(raw));
            let weight_class = first_non_empty(&[&competition.kind.abbreviation, &competition.kind.id]);
            Bout {
                weight_class: weight_class.to_string(),
                red_name: red,
                red_record,
                blue_name: blue,
                blue_record,
                winner,
                scheduled,
            }
        })
        .collect()
}

fn athlete_name(competitor: &Competitor) -> String {
    let athlete = &competitor.athlete;
    first_non_empty(&[&athlete.full_name, &athlete.display_name, &athlete.short_name]).to_string()
}

fn corner_names(competitors: &[Competitor]) -> (String, String) {
    let red = competitors
        .iter()
        .find(|c| c.order == 1)
        .or_else(|| competitors.first())
        .map(athlete_name)
        .unwrap_or_default();
    let blue = competitors
        .iter()
        .find(|c| c.order == 2)
        .or_else(|| competitors.get(1))
        .map(athlete_name)
        .unwrap_or_default();
    (red, blue)
}

fn corner_records(competitors: &[Competitor]) -> (String, String) {
    let record_for = |order: i64| {
        competitors
            .iter()
            .find(|c| c.order == order)
            .and_then(|c| c.records.first())
            .map(|r| r.summary.clone())
            .unwrap_or_default()
    };
    (record_for(1), record_for(2))
}

fn winner_name(competitors: &[Competitor], red: &str, blue: &str) -> Option<String> {
    let winner = competitors.iter().find(|c| c.winner)?;
    let name = match winner.order {
        1 => red.to_string(),
        2 => blue.to_string(),
        _ => athlete_name(winner),
    };
    (!name.is_empty()).then_some(name)
}

fn first_non_empty<'a>(values: &[&'a String]) -> &'a str {
    values
        .iter()
        .copied()
        .find(|v| !v.trim().is_empty())
        .map(String::as_str)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::espn_types::{
        Athlete, CompStatus, CompType, Competition, EventLink, Logo, Record, StatusType,
    };
    use serenity::async_trait;
    use std::sync::Mutex;

    /// Fails the test if any network tier is reached.
    struct OfflineSource;

    #[async_trait]
    impl EventSource for OfflineSource {
        async fn fetch_scoreboard(&self, _year: i32) -> Result<crate::clients::espn_types::ScoreboardRoot, SourceError> {
            panic!("scoreboard fetch not expected");
        }
        async fn fetch_event(&self, reference: &str) -> Result<EspnEvent, SourceError> {
            panic!("event fetch not expected for {reference}");
        }
        async fn fetch_card(&self, event_id: &str) -> Result<Vec<FallbackBout>, SourceError> {
            panic!("card fetch not expected for {event_id}");
        }
    }

    #[derive(Default)]
    struct RecordingSource {
        event: Option<EspnEvent>,
        card: Vec<FallbackBout>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventSource for RecordingSource {
        async fn fetch_scoreboard(&self, _year: i32) -> Result<crate::clients::espn_types::ScoreboardRoot, SourceError> {
            Ok(Default::default())
        }
        async fn fetch_event(&self, reference: &str) -> Result<EspnEvent, SourceError> {
            self.calls.lock().unwrap().push(format!("event:{reference}"));
            self.event.clone().ok_or(SourceError::Status {
                status: 404,
                url: reference.to_string(),
            })
        }
        async fn fetch_card(&self, event_id: &str) -> Result<Vec<FallbackBout>, SourceError> {
            self.calls.lock().unwrap().push(format!("card:{event_id}"));
            Ok(self.card.clone())
        }
    }

    fn competitor(order: i64, name: &str, record: &str, winner: bool) -> Competitor {
        Competitor {
            order,
            winner,
            athlete: Athlete {
                full_name: name.to_string(),
                ..Athlete::default()
            },
            records: vec![Record {
                summary: record.to_string(),
            }],
        }
    }

    fn record(id: &str, name: &str, date: &str, with_card: bool) -> EspnEvent {
        let competitions = if with_card {
            vec![Competition {
                start_date: "2025-03-09T03:00Z".to_string(),
                kind: CompType {
                    abbreviation: "LHW".to_string(),
                    ..CompType::default()
                },
                competitors: vec![
                    competitor(2, "Magomed Ankalaev", "19-1-1", true),
                    competitor(1, "Alex Pereira", "12-2-0", false),
                ],
                status: CompStatus {
                    kind: StatusType {
                        state: "post".to_string(),
                    },
                },
                ..Competition::default()
            }]
        } else {
            Vec::new()
        };
        EspnEvent {
            id: id.to_string(),
            name: name.to_string(),
            date: date.to_string(),
            competitions,
            links: vec![EventLink {
                href: "https://espn.com/mma/fightcenter/_/id/600051234".to_string(),
                text: "Gamecast".to_string(),
                ..EventLink::default()
            }],
            logos: vec![Logo {
                href: "https://a.espncdn.com/ufc313.png".to_string(),
            }],
            ..EspnEvent::default()
        }
    }

    fn entry(label: &str, reference: &str) -> CalendarEntry {
        CalendarEntry::parse(label, "2025-03-08T22:00Z", "2025-03-09T06:00Z", reference).unwrap()
    }

    #[test]
    fn parses_event_id_from_reference() {
        assert_eq!(
            event_id_from_ref("http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051234?lang=en"),
            Some("600051234")
        );
        assert_eq!(event_id_from_ref("https://example.com/events/"), None);
        assert_eq!(event_id_from_ref("no reference"), None);
    }

    #[test]
    fn skips_event_segments_without_digits() {
        assert_eq!(
            event_id_from_ref("http://sports.core.api.espn.com/v2/events/list/events/123?lang=en"),
            Some("123")
        );
        assert_eq!(event_id_from_ref("https://example.com/events/list/events/"), None);
    }

    #[tokio::test]
    async fn id_tier_never_touches_other_tiers() {
        let records = vec![
            record("1", "UFC 313", "2025-03-08T22:00Z", true),
            record("600051234", "Different name entirely", "2020-01-01T00:00Z", true),
        ];
        let entry = entry("UFC 313", "http://x/leagues/ufc/events/600051234?lang=en");
        match resolve_event(&entry, &records, &OfflineSource).await {
            Resolution::Resolved { event, tier } => {
                assert_eq!(tier, ResolverTier::IdMatch);
                assert_eq!(event.id, "600051234");
            }
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[tokio::test]
    async fn fuzzy_tier_matches_name_within_window() {
        let records = vec![
            record("7", "UFC 313", "2025-03-14T22:00Z", true),
            record("8", "UFC 313: Pereira vs. Ankalaev", "2025-03-09T01:00Z", true),
        ];
        let entry = entry("ufc 313", "");
        match resolve_event(&entry, &records, &OfflineSource).await {
            Resolution::Resolved { event, tier } => {
                assert_eq!(tier, ResolverTier::FuzzyMatch);
                assert_eq!(event.id, "8");
                assert_eq!(event.links[0].title, "Event Page");
                assert_eq!(event.banner_url.as_deref(), Some("https://a.espncdn.com/ufc313.png"));
                let bout = &event.bouts[0];
                assert_eq!(bout.red_name, "Alex Pereira");
                assert_eq!(bout.blue_name, "Magomed Ankalaev");
                assert_eq!(bout.red_record, "12-2-0");
                assert_eq!(bout.winner.as_deref(), Some("Magomed Ankalaev"));
                assert_eq!(bout.weight_class, "LHW");
                assert!(bout.scheduled.is_some());
            }
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_tier_uses_reference_verbatim() {
        let source = RecordingSource {
            event: Some(record("99", "UFC 313", "2025-03-08T22:00Z", true)),
            ..RecordingSource::default()
        };
        let entry = entry("UFC 313", "http://x/leagues/ufc/events/99");
        match resolve_event(&entry, &[], &source).await {
            Resolution::Resolved { event, tier } => {
                assert_eq!(tier, ResolverTier::Fetched);
                assert_eq!(event.id, "99");
            }
            other => panic!("unexpected resolution {other:?}"),
        }
        assert_eq!(*source.calls.lock().unwrap(), vec!["event:http://x/leagues/ufc/events/99"]);
    }

    #[tokio::test]
    async fn exhausted_tiers_fail_with_resolution_error() {
        let entry = entry("UFC 313", "");
        match resolve_event(&entry, &[], &OfflineSource).await {
            Resolution::Failed(SourceError::ResolutionFailed { label }) => assert_eq!(label, "UFC 313"),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_competitions_use_card_fallback() {
        let source = RecordingSource {
            card: vec![FallbackBout {
                weight_class: "Lightweight".to_string(),
                fighter1: "Ath1".to_string(),
                fighter2: "Ath2".to_string(),
            }],
            ..RecordingSource::default()
        };
        let records = vec![record("42", "UFC 313", "2025-03-08T22:00Z", false)];
        let entry = entry("UFC 313", "http://x/events/42");
        match resolve_event(&entry, &records, &source).await {
            Resolution::DegradedResolved { event, tier, card } => {
                assert_eq!(tier, ResolverTier::IdMatch);
                assert_eq!(card, CardFallback::Fetched);
                assert_eq!(event.bouts.len(), 1);
                assert_eq!(event.bouts[0].red_name, "Ath1");
                assert_eq!(event.bouts[0].red_record, "");
                assert_eq!(event.bouts[0].winner, None);
            }
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_fallback_card_is_still_an_event() {
        let source = RecordingSource::default();
        let records = vec![record("42", "UFC 313", "2025-03-08T22:00Z", false)];
        let entry = entry("UFC 313", "http://x/events/42");
        let resolution = resolve_event(&entry, &records, &source).await;
        assert!(matches!(
            resolution,
            Resolution::DegradedResolved {
                card: CardFallback::Unavailable,
                ..
            }
        ));
        assert!(resolution.into_result().unwrap().bouts.is_empty());
    }
}
