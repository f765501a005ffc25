use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::all::{
    Command, CommandDataOptionValue, CommandInteraction, GuildId, Interaction as DiscordInteraction,
    Permissions,
};
use serenity::async_trait;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info, warn};

use super::commands::{CommandSpec, command_specs, help_text};
use super::discord_responder::{InteractionResponder, SerenityResponder};
use crate::service::notification_message_service::NotificationMessageService;
use crate::service::provider::{ProviderContext, ProviderFlags, ProviderRegistry};
use crate::service::schedule::{GuildZone, parse_zone, target_hour};
use crate::store::GuildStore;
use crate::tasks::notification_loop::{
    MessageSender, PostOutcome, SchedulerDefaults, TickMode, notify_guild,
};

pub struct BotHandler {
    store: Arc<dyn GuildStore>,
    registry: Arc<ProviderRegistry>,
    sender: Arc<dyn MessageSender>,
    defaults: SchedulerDefaults,
    dev_guild: Option<u64>,
}

impl BotHandler {
    pub fn new(
        store: Arc<dyn GuildStore>,
        registry: Arc<ProviderRegistry>,
        sender: Arc<dyn MessageSender>,
        defaults: SchedulerDefaults,
        dev_guild: Option<u64>,
    ) -> Self {
        BotHandler {
            store,
            registry,
            sender,
            defaults,
            dev_guild,
        }
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        command_specs(&self.registry.orgs())
    }
}

fn parse_toggle(raw: &str, on: &str, off: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        v if v == on => Some(true),
        v if v == off => Some(false),
        _ => None,
    }
}

impl BotHandler {
    pub async fn handle_notify_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        state: &str,
    ) {
        let Some(enabled) = parse_toggle(state, "on", "off") else {
            responder.reply_ephemeral("Invalid state. Use on or off.").await;
            return;
        };
        if enabled && self.store.guild_settings(guild_id).selected_org().is_none() {
            responder
                .reply_ephemeral("Please set an organization first with /set-org before enabling notifications.")
                .await;
            return;
        }
        match self.store.set_notify_enabled(guild_id, enabled) {
            Ok(()) if enabled => responder.reply_ephemeral("Notifications enabled.").await,
            Ok(()) => responder.reply_ephemeral("Notifications disabled.").await,
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_set_org_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        org: &str,
    ) {
        let org = org.trim().to_lowercase();
        if !self.registry.contains(&org) {
            let supported = self.registry.orgs().join(", ");
            responder
                .reply_ephemeral(&format!("Unsupported org. Available: {}", supported))
                .await;
            return;
        }
        match self.store.set_org(guild_id, &org) {
            Ok(()) => {
                responder
                    .reply_ephemeral(&format!("Organization set to {}.", org.to_uppercase()))
                    .await
            }
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_set_channel_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        channel_id: &str,
    ) {
        match self.store.set_channel(guild_id, Some(channel_id)) {
            Ok(()) => responder.reply_ephemeral("Announcement channel updated.").await,
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_set_tz_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        tz: &str,
    ) {
        let Some(zone) = parse_zone(tz) else {
            responder
                .reply_ephemeral("Invalid timezone. Example: America/Los_Angeles")
                .await;
            return;
        };
        match self.store.set_timezone(guild_id, zone.name()) {
            Ok(()) => {
                responder
                    .reply_ephemeral(&format!("Timezone updated to {}", zone.name()))
                    .await
            }
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_set_run_hour_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        hour: i64,
    ) {
        let Some(hour) = u8::try_from(hour).ok().filter(|h| *h < 24) else {
            responder.reply_ephemeral("Hour must be between 0 and 23.").await;
            return;
        };
        match self.store.set_run_hour(guild_id, Some(hour)) {
            Ok(()) => {
                responder
                    .reply_ephemeral(&format!("Notifications will post at {:02}:00 local time.", hour))
                    .await
            }
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_reminders_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        state: &str,
    ) {
        let Some(enabled) = parse_toggle(state, "on", "off") else {
            responder.reply_ephemeral("Invalid state. Use on or off.").await;
            return;
        };
        match self.store.set_reminders_enabled(guild_id, enabled) {
            Ok(()) if enabled => responder.reply_ephemeral("Day-before reminders enabled.").await,
            Ok(()) => responder.reply_ephemeral("Day-before reminders disabled.").await,
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_ufc_contender_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        state: &str,
    ) {
        let Some(include) = parse_toggle(state, "include", "exclude") else {
            responder.reply_ephemeral("Invalid state. Use include or exclude.").await;
            return;
        };
        match self.store.set_ufc_ignore_contender(guild_id, !include) {
            Ok(()) if include => responder.reply_ephemeral("Contender Series events will be included.").await,
            Ok(()) => responder.reply_ephemeral("Contender Series events will be skipped.").await,
            Err(err) => self.reply_save_failed(responder, guild_id, &err).await,
        }
    }

    pub async fn handle_status_with<R: InteractionResponder + ?Sized>(&self, responder: &R, guild_id: &str) {
        responder.reply_ephemeral(&self.status_text(guild_id)).await;
    }

    pub fn status_text(&self, guild_id: &str) -> String {
        let settings = self.store.guild_settings(guild_id);
        let on_off = |v: bool| if v { "on" } else { "off" };
        let channel = settings
            .channel()
            .map(|c| format!("<#{}>", c))
            .unwrap_or_else(|| "(not set)".to_string());
        let (zone, _) = GuildZone::resolve(settings.timezone.as_deref(), &self.defaults.timezone);
        let timezone = match settings.timezone.as_deref() {
            Some(tz) if !tz.trim().is_empty() => tz.to_string(),
            _ => format!("{} (default)", zone.name()),
        };
        let org = settings
            .selected_org()
            .map(str::to_uppercase)
            .unwrap_or_else(|| "(not set)".to_string());
        let hour = target_hour(settings.run_hour, &self.defaults.run_at);
        let contender = match settings.ufc_ignore_contender {
            Some(false) => "included",
            _ => "excluded",
        };
        format!(
            "Channel: {}\nTimezone: {}\nOrg: {}\nNotifications: {}\nReminders: {}\nRun time: {:02}:00\nContender Series: {}",
            channel,
            timezone,
            org,
            on_off(settings.notify_enabled),
            on_off(settings.reminders_enabled),
            hour,
            contender
        )
    }

    pub async fn handle_help_with<R: InteractionResponder + ?Sized>(&self, responder: &R) {
        responder.reply_ephemeral(&help_text(&self.specs())).await;
    }

    pub async fn handle_next_event_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        now: DateTime<Utc>,
    ) {
        responder.defer_ephemeral().await;
        let settings = self.store.guild_settings(guild_id);
        let org = settings.selected_org().unwrap_or("ufc").to_string();
        let Some(provider) = self.registry.get(&org) else {
            responder
                .edit_reply("Unsupported organization for next-event. Try /set-org to a supported one.", None)
                .await;
            return;
        };
        let (zone, _) = GuildZone::resolve(settings.timezone.as_deref(), &self.defaults.timezone);
        let ctx = ProviderContext::at(now).with_flags(ProviderFlags::for_guild(&settings));
        match provider.next_event(&ctx).await {
            Ok(Some(event)) => {
                let embed = NotificationMessageService::build_embed(&event, &zone);
                let content = NotificationMessageService::build_message(&event, &zone);
                responder.edit_reply(&content, Some(&embed)).await;
            }
            Ok(None) => {
                responder
                    .edit_reply(&format!("No upcoming {} events found.", org.to_uppercase()), None)
                    .await;
            }
            Err(err) => {
                warn!(guild_id, org = %org, error = %err, "next-event lookup failed");
                responder
                    .edit_reply("Error fetching events. Please try again later.", None)
                    .await;
            }
        }
    }

    pub async fn handle_test_notify_with<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        now: DateTime<Utc>,
    ) {
        responder.defer_ephemeral().await;
        let report = notify_guild(
            self.store.as_ref(),
            &self.registry,
            self.sender.as_ref(),
            &self.defaults,
            guild_id,
            now,
            TickMode::Forced,
        )
        .await;
        let reply = match &report.post {
            PostOutcome::Posted { .. } => "Preview posted.".to_string(),
            PostOutcome::Skipped(reason) => format!("Nothing posted: {}.", reason),
            PostOutcome::Failed(err) => format!("Preview failed: {}", err),
        };
        responder.edit_reply(&reply, None).await;
    }

    async fn reply_save_failed<R: InteractionResponder + ?Sized>(
        &self,
        responder: &R,
        guild_id: &str,
        err: &crate::error::StoreError,
    ) {
        error!(guild_id, error = %err, "failed to save guild settings");
        responder.reply_ephemeral("Failed to save settings. Please try again.").await;
    }
}

fn string_option<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| match &opt.value {
            CommandDataOptionValue::String(s) => Some(s.as_str()),
            _ => None,
        })
}

fn integer_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| match &opt.value {
            CommandDataOptionValue::Integer(i) => Some(*i),
            _ => None,
        })
}

fn channel_option(command: &CommandInteraction, name: &str) -> Option<String> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| match &opt.value {
            CommandDataOptionValue::Channel(id) => Some(id.to_string()),
            _ => None,
        })
}

fn requires_manage(name: &str) -> bool {
    matches!(
        name,
        "notify" | "set-org" | "set-channel" | "set-tz" | "set-run-hour" | "reminders" | "ufc-contender" | "test-notify"
    )
}

fn can_manage(command: &CommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .is_some_and(|perms| perms.contains(Permissions::MANAGE_CHANNELS) || perms.administrator())
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected");
        for guild in &ready.guilds {
            if let Err(err) = self.store.ensure_guild(&guild.id.to_string()) {
                error!(guild_id = %guild.id, error = %err, "failed to record guild");
            }
        }

        let commands: Vec<_> = self.specs().iter().map(CommandSpec::to_command).collect();
        let result = match self.dev_guild.filter(|id| *id != 0) {
            Some(id) => GuildId::new(id).set_commands(&ctx.http, commands).await,
            None => Command::set_global_commands(&ctx.http, commands).await,
        };
        match result {
            Ok(registered) => info!(count = registered.len(), dev_guild = ?self.dev_guild, "registered commands"),
            Err(err) => error!(error = %err, "failed to register commands"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: DiscordInteraction) {
        let DiscordInteraction::Command(command) = interaction else {
            return;
        };
        let responder = SerenityResponder::for_command(&ctx, &command);
        let Some(guild_id) = command.guild_id.map(|id| id.to_string()) else {
            responder.reply_ephemeral("Please use this command in a server.").await;
            return;
        };
        let name = command.data.name.as_str();
        if requires_manage(name) && !can_manage(&command) {
            responder
                .reply_ephemeral("You need Manage Channels permission to change bot settings.")
                .await;
            return;
        }

        match name {
            "notify" => {
                let state = string_option(&command, "state").unwrap_or("");
                self.handle_notify_with(&responder, &guild_id, state).await;
            }
            "set-org" => {
                let org = string_option(&command, "org").unwrap_or("");
                self.handle_set_org_with(&responder, &guild_id, org).await;
            }
            "set-channel" => {
                let channel = channel_option(&command, "channel")
                    .unwrap_or_else(|| command.channel_id.to_string());
                self.handle_set_channel_with(&responder, &guild_id, &channel).await;
            }
            "set-tz" => {
                let tz = string_option(&command, "tz").unwrap_or("");
                self.handle_set_tz_with(&responder, &guild_id, tz).await;
            }
            "set-run-hour" => {
                let hour = integer_option(&command, "hour").unwrap_or(-1);
                self.handle_set_run_hour_with(&responder, &guild_id, hour).await;
            }
            "reminders" => {
                let state = string_option(&command, "state").unwrap_or("");
                self.handle_reminders_with(&responder, &guild_id, state).await;
            }
            "ufc-contender" => {
                let state = string_option(&command, "state").unwrap_or("");
                self.handle_ufc_contender_with(&responder, &guild_id, state).await;
            }
            "status" => self.handle_status_with(&responder, &guild_id).await,
            "help" => self.handle_help_with(&responder).await,
            "next-event" => self.handle_next_event_with(&responder, &guild_id, Utc::now()).await,
            "test-notify" => self.handle_test_notify_with(&responder, &guild_id, Utc::now()).await,
            _ => responder.reply_ephemeral("Unknown command.").await,
        }
    }
}
