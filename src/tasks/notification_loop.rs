use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serenity::all::{GuildId, ScheduledEventType};
use serenity::async_trait;
use serenity::builder::{CreateEmbed, CreateMessage, CreateScheduledEvent};
use serenity::http::Http;
use serenity::model::Timestamp;
use serenity::model::id::ChannelId;
use tokio::time::{sleep, timeout};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::error::DeliveryError;
use crate::models::event::Event;
use crate::service::notification_message_service::{EventEmbed, NotificationMessageService};
use crate::service::provider::{ProviderContext, ProviderFlags, ProviderRegistry};
use crate::service::schedule::{GuildZone, ZoneSource, next_top_of_hour, target_hour};
use crate::store::GuildStore;

/// Reminder window used when the event has no end time.
pub const DEFAULT_EVENT_HOURS: i64 = 5;
const STARTUP_DELAY: Duration = Duration::from_secs(2);

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Returns the id of the posted message.
    async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
        embed: Option<&EventEmbed>,
    ) -> Result<String, DeliveryError>;

    /// Creates a guild scheduled event and returns its id.
    async fn create_reminder(
        &self,
        guild_id: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, DeliveryError>;
}

pub struct DiscordSender {
    http: Arc<Http>,
    timeout: Duration,
}

impl DiscordSender {
    pub fn new(http: Arc<Http>, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

fn parse_id(raw: &str) -> Result<u64, DeliveryError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| DeliveryError::InvalidId(raw.to_string()))
}

fn to_timestamp(instant: DateTime<Utc>) -> Result<Timestamp, DeliveryError> {
    Timestamp::from_unix_timestamp(instant.timestamp())
        .map_err(|e| DeliveryError::Discord(format!("invalid timestamp {}: {}", instant, e)))
}

pub fn to_create_embed(embed: &EventEmbed) -> CreateEmbed {
    let mut builder = CreateEmbed::new()
        .title(&embed.title)
        .description(&embed.description)
        .colour(embed.colour);
    if let Some(url) = &embed.url {
        builder = builder.url(url);
    }
    if let Some(image) = &embed.image_url {
        builder = builder.image(image);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, false);
    }
    builder
}

#[async_trait]
impl MessageSender for DiscordSender {
    async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
        embed: Option<&EventEmbed>,
    ) -> Result<String, DeliveryError> {
        let channel = ChannelId::new(parse_id(channel_id)?);
        let mut message = CreateMessage::new().content(content);
        if let Some(embed) = embed {
            message = message.embed(to_create_embed(embed));
        }
        let sent = timeout(self.timeout, channel.send_message(&*self.http, message))
            .await
            .map_err(|_| DeliveryError::Timeout)?
            .map_err(|e| DeliveryError::Discord(e.to_string()))?;
        Ok(sent.id.to_string())
    }

    async fn create_reminder(
        &self,
        guild_id: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, DeliveryError> {
        let guild = GuildId::new(parse_id(guild_id)?);
        let builder = CreateScheduledEvent::new(ScheduledEventType::External, title, to_timestamp(start)?)
            .end_time(to_timestamp(end)?)
            .location("Watch party");
        let created = timeout(self.timeout, guild.create_scheduled_event(&*self.http, builder))
            .await
            .map_err(|_| DeliveryError::Timeout)?
            .map_err(|e| DeliveryError::Discord(e.to_string()))?;
        Ok(created.id.to_string())
    }
}

/// Process-wide fallbacks for guilds without their own settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerDefaults {
    pub timezone: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    Scheduled,
    /// Preview: ignores the due hour, the day gate and the ledger, and
    /// writes nothing back.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoChannel,
    Disabled,
    NoOrg,
    NoProvider,
    NotDue,
    NoEvent,
    NotToday,
    AlreadyPosted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoChannel => "no channel configured",
            SkipReason::Disabled => "notifications disabled",
            SkipReason::NoOrg => "no organization selected",
            SkipReason::NoProvider => "no provider for organization",
            SkipReason::NotDue => "not the configured hour",
            SkipReason::NoEvent => "no upcoming event",
            SkipReason::NotToday => "event is not today",
            SkipReason::AlreadyPosted => "already posted",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Posted { date: NaiveDate, message_id: String },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// The tick stopped before reminders were considered.
    NotEvaluated,
    Disabled,
    NotDayBefore,
    AlreadyScheduled,
    Created { reminder_id: String },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildReport {
    pub guild_id: String,
    pub post: PostOutcome,
    pub reminder: ReminderOutcome,
}

impl GuildReport {
    fn skipped(guild_id: &str, reason: SkipReason) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            post: PostOutcome::Skipped(reason),
            reminder: ReminderOutcome::NotEvaluated,
        }
    }

    fn log(&self) {
        match &self.post {
            PostOutcome::Posted { date, message_id } => {
                info!(guild_id = %self.guild_id, %date, message_id = %message_id, reminder = ?self.reminder, "notification posted");
            }
            PostOutcome::Skipped(reason) => {
                debug!(guild_id = %self.guild_id, reason = %reason, reminder = ?self.reminder, "notification skipped");
            }
            PostOutcome::Failed(err) => {
                error!(guild_id = %self.guild_id, error = %err, reminder = ?self.reminder, "notification failed");
            }
        }
    }
}

impl fmt::Display for GuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let post = match &self.post {
            PostOutcome::Posted { date, message_id } => format!("posted for {} (message {})", date, message_id),
            PostOutcome::Skipped(reason) => format!("skipped: {}", reason),
            PostOutcome::Failed(err) => format!("failed: {}", err),
        };
        let reminder = match &self.reminder {
            ReminderOutcome::NotEvaluated => "not evaluated".to_string(),
            ReminderOutcome::Disabled => "disabled".to_string(),
            ReminderOutcome::NotDayBefore => "not the day before".to_string(),
            ReminderOutcome::AlreadyScheduled => "already scheduled".to_string(),
            ReminderOutcome::Created { reminder_id } => format!("created {}", reminder_id),
            ReminderOutcome::Failed(err) => format!("failed: {}", err),
        };
        write!(f, "guild {}: {}; reminder {}", self.guild_id, post, reminder)
    }
}

/// Evaluates one guild for one tick. Errors are folded into the report so a
/// failing guild never affects the others.
pub async fn notify_guild<St, S>(
    store: &St,
    registry: &ProviderRegistry,
    sender: &S,
    defaults: &SchedulerDefaults,
    guild_id: &str,
    now: DateTime<Utc>,
    mode: TickMode,
) -> GuildReport
where
    St: GuildStore + ?Sized,
    S: MessageSender + ?Sized,
{
    let settings = store.guild_settings(guild_id);
    let Some(channel_id) = settings.channel() else {
        return GuildReport::skipped(guild_id, SkipReason::NoChannel);
    };
    if !settings.notify_enabled {
        return GuildReport::skipped(guild_id, SkipReason::Disabled);
    }
    let Some(org) = settings.selected_org() else {
        return GuildReport::skipped(guild_id, SkipReason::NoOrg);
    };
    let Some(provider) = registry.get(org) else {
        warn!(guild_id, org, "no provider registered for org");
        return GuildReport::skipped(guild_id, SkipReason::NoProvider);
    };

    let (zone, zone_source) = GuildZone::resolve(settings.timezone.as_deref(), &defaults.timezone);
    if zone_source == ZoneSource::Fallback {
        warn!(guild_id, "no valid time zone configured, using system local");
    }
    let hour = target_hour(settings.run_hour, &defaults.run_at);
    if mode == TickMode::Scheduled && !zone.is_due(now, hour) {
        return GuildReport::skipped(guild_id, SkipReason::NotDue);
    }

    let ctx = ProviderContext::at(now).with_flags(ProviderFlags::for_guild(&settings));
    let event = match provider.next_event(&ctx).await {
        Ok(Some(event)) => event,
        Ok(None) => return GuildReport::skipped(guild_id, SkipReason::NoEvent),
        Err(err) => {
            warn!(guild_id, org, error = %err, transient = err.is_transient(), "provider lookup failed");
            return GuildReport {
                guild_id: guild_id.to_string(),
                post: PostOutcome::Failed(err.to_string()),
                reminder: ReminderOutcome::NotEvaluated,
            };
        }
    };

    let today = zone.local_date(now);
    let event_date = zone.local_date(event.start);

    let post = if mode == TickMode::Scheduled && event_date != today {
        PostOutcome::Skipped(SkipReason::NotToday)
    } else if mode == TickMode::Scheduled && settings.last_posted_for(org) == Some(event_date) {
        PostOutcome::Skipped(SkipReason::AlreadyPosted)
    } else {
        let content = NotificationMessageService::build_message(&event, &zone);
        let embed = NotificationMessageService::build_embed(&event, &zone);
        match sender.send_message(channel_id, &content, Some(&embed)).await {
            Ok(message_id) => {
                if mode == TickMode::Scheduled {
                    if let Err(err) = store.update_last_posted(guild_id, org, event_date) {
                        error!(guild_id, org, error = %err, "failed to record last posted date");
                    }
                }
                PostOutcome::Posted {
                    date: event_date,
                    message_id,
                }
            }
            Err(err) => PostOutcome::Failed(err.to_string()),
        }
    };

    let reminder = match mode {
        TickMode::Forced => ReminderOutcome::NotEvaluated,
        TickMode::Scheduled => {
            schedule_reminder(store, sender, guild_id, settings.reminders_enabled, &event, today, event_date).await
        }
    };

    GuildReport {
        guild_id: guild_id.to_string(),
        post,
        reminder,
    }
}

async fn schedule_reminder<St, S>(
    store: &St,
    sender: &S,
    guild_id: &str,
    enabled: bool,
    event: &Event,
    today: NaiveDate,
    event_date: NaiveDate,
) -> ReminderOutcome
where
    St: GuildStore + ?Sized,
    S: MessageSender + ?Sized,
{
    if !enabled {
        return ReminderOutcome::Disabled;
    }
    if event_date.pred_opt() != Some(today) {
        return ReminderOutcome::NotDayBefore;
    }
    if store.has_scheduled_reminder(guild_id, &event.org, event_date) {
        return ReminderOutcome::AlreadyScheduled;
    }
    let end = event
        .end
        .unwrap_or(event.start + chrono::Duration::hours(DEFAULT_EVENT_HOURS));
    let title = format!("{}: {}", event.org_title(), event.display_name());
    match sender.create_reminder(guild_id, &title, event.start, end).await {
        Ok(reminder_id) => {
            if let Err(err) = store.mark_scheduled_reminder(guild_id, &event.org, event_date, &reminder_id) {
                error!(guild_id, org = %event.org, error = %err, "failed to record reminder");
            }
            ReminderOutcome::Created { reminder_id }
        }
        Err(err) => ReminderOutcome::Failed(err.to_string()),
    }
}

/// One pass over every known guild (or just `only_guild`), sequentially.
pub async fn notification_tick<St, S>(
    store: &St,
    registry: &ProviderRegistry,
    sender: &S,
    defaults: &SchedulerDefaults,
    now: DateTime<Utc>,
    mode: TickMode,
    only_guild: Option<&str>,
) -> Vec<GuildReport>
where
    St: GuildStore + ?Sized,
    S: MessageSender + ?Sized,
{
    let tick_id = uuid::Uuid::new_v4();
    let span = info_span!("notification_tick", %tick_id, ?mode, %now);
    async move {
        let guild_ids: Vec<String> = store
            .list_guild_ids()
            .into_iter()
            .filter(|id| only_guild.is_none_or(|only| only == id.as_str()))
            .collect();
        let mut reports = Vec::with_capacity(guild_ids.len());
        for guild_id in &guild_ids {
            let report = notify_guild(store, registry, sender, defaults, guild_id, now, mode).await;
            report.log();
            reports.push(report);
        }
        debug!(guilds = reports.len(), "tick finished");
        reports
    }
    .instrument(span)
    .await
}

pub async fn run_notification_loop(
    store: Arc<dyn GuildStore>,
    registry: Arc<ProviderRegistry>,
    sender: Arc<dyn MessageSender>,
    defaults: SchedulerDefaults,
) {
    sleep(STARTUP_DELAY).await;
    loop {
        notification_tick(
            store.as_ref(),
            &registry,
            sender.as_ref(),
            &defaults,
            Utc::now(),
            TickMode::Scheduled,
            None,
        )
        .await;
        let now = Utc::now();
        let next = next_top_of_hour(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(next = %next, "next notification check");
        sleep(wait).await;
    }
}
