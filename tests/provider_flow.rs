use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use fightNightBot::clients::espn_client::{EventSource, FallbackBout};
use fightNightBot::clients::espn_types::ScoreboardRoot;
use fightNightBot::clients::espn_types::EspnEvent;
use fightNightBot::error::SourceError;
use fightNightBot::service::notification_message_service::NotificationMessageService;
use fightNightBot::service::calendar_selector::SelectionPolicy;
use fightNightBot::service::provider::{ProviderContext, default_registry, registry_with_policy};
use fightNightBot::service::schedule::GuildZone;

/// Serves canned JSON documents keyed by year or reference URL.
#[derive(Default)]
struct FakeSource {
    scoreboards: HashMap<i32, String>,
    events: HashMap<String, String>,
    fail_scoreboard: bool,
    requests: Mutex<Vec<String>>,
}

#[serenity::async_trait]
impl EventSource for FakeSource {
    async fn fetch_scoreboard(&self, year: i32) -> Result<ScoreboardRoot, SourceError> {
        self.requests.lock().unwrap().push(format!("scoreboard:{year}"));
        if self.fail_scoreboard {
            return Err(SourceError::Timeout);
        }
        match self.scoreboards.get(&year) {
            Some(raw) => Ok(serde_json::from_str(raw).unwrap()),
            None => Ok(ScoreboardRoot::default()),
        }
    }

    async fn fetch_event(&self, reference: &str) -> Result<EspnEvent, SourceError> {
        self.requests.lock().unwrap().push(format!("event:{reference}"));
        match self.events.get(reference) {
            Some(raw) => Ok(serde_json::from_str(raw).unwrap()),
            None => Err(SourceError::Status {
                status: 404,
                url: reference.to_string(),
            }),
        }
    }

    async fn fetch_card(&self, event_id: &str) -> Result<Vec<FallbackBout>, SourceError> {
        self.requests.lock().unwrap().push(format!("card:{event_id}"));
        Ok(Vec::new())
    }
}

fn competition(i: usize) -> String {
    format!(
        r#"{{"startDate": "2025-03-08T{hour:02}:{min:02}Z", "type": {{"abbreviation": "LW"}},
            "status": {{"type": {{"state": "pre"}}}},
            "competitors": [
              {{"order": 1, "athlete": {{"displayName": "Red {i}"}}, "records": [{{"summary": "10-0-0"}}]}},
              {{"order": 2, "athlete": {{"fullName": "Blue {i}"}}}}
            ]}}"#,
        hour = 20 + i / 4,
        min = (i % 4) * 15,
        i = i
    )
}

fn scoreboard_with_card(bouts: usize) -> String {
    let competitions: Vec<String> = (0..bouts).map(competition).collect();
    format!(
        r#"{{
          "leagues": [{{"calendar": [
            {{"label": "UFC 313", "startDate": "2025-03-08T22:00Z", "endDate": "2025-03-09T06:00Z",
              "event": {{"$ref": "http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051234?lang=en"}}}},
            {{"label": "UFC Fight Night", "startDate": "2025-03-15T22:00Z",
              "event": {{"$ref": "http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051235?lang=en"}}}}
          ]}}],
          "events": [{{
            "id": "600051234", "name": "UFC 313: Pereira vs. Ankalaev", "shortName": "UFC 313",
            "date": "2025-03-08T22:00Z",
            "links": [{{"href": "https://www.espn.com/mma/fightcenter/_/id/600051234", "text": "Gamecast"}}],
            "logos": [{{"href": "https://a.espncdn.com/banner.png"}}],
            "competitions": [{}]
          }}]
        }}"#,
        competitions.join(",")
    )
}

#[tokio::test]
async fn ongoing_event_is_resolved_split_and_formatted() {
    let mut source = FakeSource::default();
    source.scoreboards.insert(2025, scoreboard_with_card(12));
    let source = Arc::new(source);
    let registry = default_registry(source.clone());
    let provider = registry.get("ufc").unwrap();

    let now = Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap();
    let event = provider.next_event(&ProviderContext::at(now)).await.unwrap().unwrap();
    assert_eq!(event.org, "ufc");
    assert_eq!(event.id, "600051234");
    assert_eq!(event.end, Some(Utc.with_ymd_and_hms(2025, 3, 9, 6, 0, 0).unwrap()));
    assert_eq!(event.bouts.len(), 12);
    assert_eq!(event.bouts[0].red_name, "Red 0");
    assert_eq!(event.bouts[0].red_record, "10-0-0");
    assert_eq!(event.bouts[0].winner, None);

    let requests = source.requests.lock().unwrap().clone();
    assert_eq!(requests, vec!["scoreboard:2024", "scoreboard:2025", "scoreboard:2026"]);

    let zone = GuildZone::Named(chrono_tz::UTC);
    let embed = NotificationMessageService::build_embed(&event, &zone);
    assert_eq!(embed.url.as_deref(), Some("https://www.espn.com/mma/fightcenter/_/id/600051234"));
    assert_eq!(embed.field("Links"), Some("[Event Page](https://www.espn.com/mma/fightcenter/_/id/600051234)"));
    let main = embed.field("Main Card").unwrap();
    assert_eq!(main.lines().count(), 6);
    assert!(main.starts_with("Red 11 vs Blue 11 — LW — 10:45 PM"));
    assert_eq!(embed.field("Prelims").unwrap().lines().count(), 6);
}

#[tokio::test]
async fn unmatched_entry_is_fetched_by_reference() {
    let reference = "http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051235?lang=en";
    let mut source = FakeSource::default();
    source.scoreboards.insert(2025, scoreboard_with_card(0));
    source.events.insert(
        reference.to_string(),
        r#"{"id": "600051235", "name": "UFC Fight Night: Edwards vs. Brady", "date": "2025-03-15T22:00Z"}"#.to_string(),
    );
    let source = Arc::new(source);
    let registry = default_registry(source.clone());

    let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
    let event = registry
        .get("ufc")
        .unwrap()
        .next_event(&ProviderContext::at(now))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.id, "600051235");
    assert_eq!(event.name, "UFC Fight Night: Edwards vs. Brady");
    assert!(event.bouts.is_empty());

    let requests = source.requests.lock().unwrap().clone();
    assert!(requests.contains(&format!("event:{reference}")));
    assert!(requests.contains(&"card:600051235".to_string()));
}

#[tokio::test]
async fn exhausted_resolver_surfaces_an_error() {
    let mut source = FakeSource::default();
    source.scoreboards.insert(
        2025,
        r#"{"leagues": [{"calendar": [{"label": "Mystery Card", "startDate": "2025-04-01T00:00Z"}]}]}"#.to_string(),
    );
    let registry = default_registry(Arc::new(source));
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

    let err = registry
        .get("ufc")
        .unwrap()
        .next_event(&ProviderContext::at(now))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::ResolutionFailed { ref label } if label == "Mystery Card"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn upstream_failure_is_transient() {
    let source = FakeSource {
        fail_scoreboard: true,
        ..FakeSource::default()
    };
    let registry = default_registry(Arc::new(source));
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

    let err = registry
        .get("ufc")
        .unwrap()
        .next_event(&ProviderContext::at(now))
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn strict_policy_skips_started_entries_without_an_end() {
    let next_ref = "http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051235?lang=en";
    let scoreboard = r#"{
      "leagues": [{"calendar": [
        {"label": "UFC 313", "startDate": "2025-03-08T22:00Z",
         "event": {"$ref": "http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051234?lang=en"}},
        {"label": "UFC Fight Night", "startDate": "2025-03-15T22:00Z",
         "event": {"$ref": "http://sports.core.api.espn.com/v2/sports/mma/leagues/ufc/events/600051235?lang=en"}}
      ]}],
      "events": [{"id": "600051234", "name": "UFC 313", "date": "2025-03-08T22:00Z"}]
    }"#;
    let make_source = || {
        let mut source = FakeSource::default();
        source.scoreboards.insert(2025, scoreboard.to_string());
        source.events.insert(
            next_ref.to_string(),
            r#"{"id": "600051235", "name": "UFC Fight Night", "date": "2025-03-15T22:00Z"}"#.to_string(),
        );
        Arc::new(source)
    };
    let ctx = ProviderContext::at(Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap());

    let lenient = default_registry(make_source());
    let started = lenient.get("ufc").unwrap().next_event(&ctx).await.unwrap().unwrap();
    assert_eq!(started.id, "600051234");

    let strict = registry_with_policy(make_source(), SelectionPolicy::strict());
    let upcoming = strict.get("ufc").unwrap().next_event(&ctx).await.unwrap().unwrap();
    assert_eq!(upcoming.id, "600051235");
}
