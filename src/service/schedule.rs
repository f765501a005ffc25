//! Time-zone and hour arithmetic for the hourly scheduler.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

pub const DEFAULT_RUN_HOUR: u32 = 16;
pub const DEFAULT_RUN_AT: &str = "16:00";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildZone {
    Named(Tz),
    /// Neither the guild nor the global zone parsed.
    SystemLocal,
}

/// Where the effective zone came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSource {
    Guild,
    Default,
    Fallback,
}

pub fn parse_zone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}

impl GuildZone {
    /// Guild override, else the global default, else system local.
    pub fn resolve(guild_tz: Option<&str>, default_tz: &str) -> (Self, ZoneSource) {
        if let Some(tz) = guild_tz.and_then(parse_zone) {
            return (GuildZone::Named(tz), ZoneSource::Guild);
        }
        if let Some(tz) = parse_zone(default_tz) {
            return (GuildZone::Named(tz), ZoneSource::Default);
        }
        (GuildZone::SystemLocal, ZoneSource::Fallback)
    }

    pub fn name(&self) -> String {
        match self {
            GuildZone::Named(tz) => tz.name().to_string(),
            GuildZone::SystemLocal => "Local".to_string(),
        }
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            GuildZone::Named(tz) => instant.with_timezone(tz).date_naive(),
            GuildZone::SystemLocal => instant.with_timezone(&Local).date_naive(),
        }
    }

    pub fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        match self {
            GuildZone::Named(tz) => instant.with_timezone(tz).hour(),
            GuildZone::SystemLocal => instant.with_timezone(&Local).hour(),
        }
    }

    /// Whether `now` falls in the guild's run hour. A run hour skipped by a
    /// spring-forward transition moves to the first local hour after the gap.
    pub fn is_due(&self, now: DateTime<Utc>, hour: u32) -> bool {
        let date = self.local_date(now);
        let effective = match self {
            GuildZone::Named(tz) => effective_hour(tz, date, hour),
            GuildZone::SystemLocal => effective_hour(&Local, date, hour),
        };
        effective == Some(self.local_hour(now))
    }

    /// `strftime`-style formatting in this zone.
    pub fn format(&self, instant: DateTime<Utc>, pattern: &str) -> String {
        match self {
            GuildZone::Named(tz) => instant.with_timezone(tz).format(pattern).to_string(),
            GuildZone::SystemLocal => instant.with_timezone(&Local).format(pattern).to_string(),
        }
    }
}

fn effective_hour<Z: TimeZone>(zone: &Z, date: NaiveDate, hour: u32) -> Option<u32> {
    // An hour exists if any part of it survives the transition.
    (hour..24).find(|h| {
        [0, 59].into_iter().any(|minute| {
            date.and_hms_opt(*h, minute, 0)
                .is_some_and(|wall| !matches!(zone.from_local_datetime(&wall), LocalResult::None))
        })
    })
}

/// Parses `HH:MM` (24h).
pub fn parse_hhmm(raw: &str) -> Option<(u32, u32)> {
    let (h, m) = raw.trim().split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    (h < 24 && m < 60).then_some((h, m))
}

/// Hour component of the global `RUN_AT` value. Minutes are not used by the
/// scheduler.
pub fn default_run_hour(run_at: &str) -> u32 {
    parse_hhmm(run_at).map(|(h, _)| h).unwrap_or(DEFAULT_RUN_HOUR)
}

pub fn target_hour(guild_hour: Option<u8>, run_at: &str) -> u32 {
    match guild_hour {
        Some(h) if h < 24 => u32::from(h),
        _ => default_run_hour(run_at),
    }
}

pub fn next_top_of_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    truncated + Duration::hours(1)
}
