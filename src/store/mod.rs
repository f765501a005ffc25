pub mod file_store;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::guild::{GuildSettings, reminder_key};

/// Per-guild settings and the scheduler's dedup ledgers.
///
/// Unknown guilds read as [`GuildSettings::default`]. Every write is a
/// read-modify-write of one guild row and is persisted before returning.
pub trait GuildStore: Send + Sync {
    fn guild_settings(&self, guild_id: &str) -> GuildSettings;

    fn list_guild_ids(&self) -> Vec<String>;

    fn update_guild(
        &self,
        guild_id: &str,
        apply: &mut dyn FnMut(&mut GuildSettings),
    ) -> Result<(), StoreError>;

    fn ensure_guild(&self, guild_id: &str) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |_| {})
    }

    /// Records the last announced date for `org`. A date earlier than the
    /// one already stored is ignored.
    fn update_last_posted(&self, guild_id: &str, org: &str, date: NaiveDate) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |settings| {
            let current = settings.last_posted_for(org);
            if current.is_none_or(|existing| existing < date) {
                settings.last_posted.insert(org.to_string(), date);
            }
        })
    }

    fn has_scheduled_reminder(&self, guild_id: &str, org: &str, date: NaiveDate) -> bool {
        self.guild_settings(guild_id)
            .scheduled_reminders
            .contains_key(&reminder_key(org, date))
    }

    fn mark_scheduled_reminder(
        &self,
        guild_id: &str,
        org: &str,
        date: NaiveDate,
        reminder_id: &str,
    ) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |settings| {
            settings
                .scheduled_reminders
                .insert(reminder_key(org, date), reminder_id.to_string());
        })
    }

    fn set_channel(&self, guild_id: &str, channel_id: Option<&str>) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.channel_id = channel_id.map(str::to_string))
    }

    fn set_timezone(&self, guild_id: &str, timezone: &str) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.timezone = Some(timezone.to_string()))
    }

    fn set_org(&self, guild_id: &str, org: &str) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.org = Some(org.to_string()))
    }

    fn set_notify_enabled(&self, guild_id: &str, enabled: bool) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.notify_enabled = enabled)
    }

    fn set_reminders_enabled(&self, guild_id: &str, enabled: bool) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.reminders_enabled = enabled)
    }

    fn set_run_hour(&self, guild_id: &str, hour: Option<u8>) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.run_hour = hour.filter(|h| *h < 24))
    }

    fn set_ufc_ignore_contender(&self, guild_id: &str, ignore: bool) -> Result<(), StoreError> {
        self.update_guild(guild_id, &mut |s| s.ufc_ignore_contender = Some(ignore))
    }
}
