use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serenity::async_trait;
use tracing::debug;

use super::espn_types::{
    AthleteDetail, CompetitionList, CoreCompetition, EspnEvent, ScoreboardRoot,
};
use crate::error::SourceError;

const SITE_API_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/mma";
const CORE_API_BASE: &str = "https://sports.core.api.espn.com/v2/sports/mma/leagues";

/// A bout recovered through the core API when the scoreboard carries no
/// competitions. Only names and weight class are available on that path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackBout {
    pub weight_class: String,
    pub fighter1: String,
    pub fighter2: String,
}

/// Network capability used by providers and the event resolver.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Scoreboard document (calendar + embedded events) for one season year.
    async fn fetch_scoreboard(&self, year: i32) -> Result<ScoreboardRoot, SourceError>;
    /// A single event record by its `$ref` URL.
    async fn fetch_event(&self, reference: &str) -> Result<EspnEvent, SourceError>;
    /// Bouts for an event via the core competitions API.
    async fn fetch_card(&self, event_id: &str) -> Result<Vec<FallbackBout>, SourceError>;
}

pub struct EspnClient {
    http: reqwest::Client,
    league: String,
}

impl EspnClient {
    /// Every request made by this client is bounded by `timeout`.
    pub fn new(league: &str, user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            league: league.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        debug!(url, "espn request");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&body).map_err(|source| SourceError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

fn classify(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Http(err)
    }
}

#[async_trait]
impl EventSource for EspnClient {
    async fn fetch_scoreboard(&self, year: i32) -> Result<ScoreboardRoot, SourceError> {
        let url = format!("{}/{}/scoreboard?dates={}", SITE_API_BASE, self.league, year);
        self.get_json(&url).await
    }

    async fn fetch_event(&self, reference: &str) -> Result<EspnEvent, SourceError> {
        self.get_json(reference).await
    }

    async fn fetch_card(&self, event_id: &str) -> Result<Vec<FallbackBout>, SourceError> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Ok(Vec::new());
        }
        let list_url = format!(
            "{}/{}/events/{}/competitions",
            CORE_API_BASE, self.league, event_id
        );
        let list: CompetitionList = self.get_json(&list_url).await?;

        let mut bouts = Vec::with_capacity(list.items.len());
        for item in list.items.iter().filter(|i| !i.reference.is_empty()) {
            let competition: CoreCompetition = self.get_json(&item.reference).await?;
            let mut names = Vec::with_capacity(2);
            for competitor in &competition.competitors {
                if competitor.athlete.reference.is_empty() {
                    continue;
                }
                let athlete: AthleteDetail = self.get_json(&competitor.athlete.reference).await?;
                if !athlete.display_name.trim().is_empty() {
                    names.push(athlete.display_name);
                }
            }
            let mut names = names.into_iter();
            bouts.push(FallbackBout {
                weight_class: competition.kind.text,
                fighter1: names.next().unwrap_or_default(),
                fighter2: names.next().unwrap_or_default(),
            });
        }
        Ok(bouts)
    }
}
