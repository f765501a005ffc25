use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serenity::http::Http;

use crate::clients::espn_client::EspnClient;
use crate::config::Settings;
use crate::service::notification_message_service::NotificationMessageService;
use crate::service::calendar_selector::SelectionPolicy;
use crate::service::provider::{ProviderContext, ProviderFlags, default_registry, registry_with_policy};
use crate::service::schedule::GuildZone;
use crate::store::file_store::FileGuildStore;
use crate::tasks::notification_loop::{DiscordSender, TickMode, notification_tick};

#[derive(Parser)]
#[command(about = "Operator commands for the fight night bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current or next event and its card.
    NextEvent {
        #[arg(long, default_value = "ufc")]
        org: String,
        #[arg(long)]
        include_contender: bool,
        /// Ignore entries without an end time once they have started.
        #[arg(long)]
        strict: bool,
    },
    /// Run one scheduler pass now.
    Tick {
        /// Ignore the due hour, day gate and ledger; nothing is recorded.
        #[arg(long)]
        force: bool,
        #[arg(long)]
        guild: Option<String>,
    },
}

pub async fn cli(settings: Settings) -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = EspnClient::new("ufc", &settings.user_agent, settings.http_timeout)
        .context("building ESPN client")?;
    let source = Arc::new(client);

    match cli.command {
        Commands::NextEvent {
            org,
            include_contender,
            strict,
        } => {
            let policy = if strict {
                SelectionPolicy::strict()
            } else {
                SelectionPolicy::default()
            };
            let registry = registry_with_policy(source, policy);
            let Some(provider) = registry.get(&org) else {
                bail!("unsupported org {:?}; available: {}", org, registry.orgs().join(", "));
            };
            let flags = ProviderFlags {
                ufc_ignore_contender: Some(!include_contender),
            };
            let ctx = ProviderContext::at(Utc::now()).with_flags(flags);
            let (zone, _) = GuildZone::resolve(None, &settings.timezone);
            match provider.next_event(&ctx).await? {
                Some(event) => println!("{}", NotificationMessageService::describe_next_event(&event, &zone)),
                None => println!("No upcoming {} events found.", org.to_uppercase()),
            }
        }
        Commands::Tick { force, guild } => {
            let registry = default_registry(source);
            let token = settings
                .discord_token
                .clone()
                .context("DISCORD_TOKEN must be set to post notifications")?;
            let store = FileGuildStore::open(&settings.state_file)
                .with_context(|| format!("opening state file {}", settings.state_file))?;
            let sender = DiscordSender::new(Arc::new(Http::new(&token)), settings.http_timeout);
            let mode = if force { TickMode::Forced } else { TickMode::Scheduled };
            let reports = notification_tick(
                &store,
                &registry,
                &sender,
                &settings.scheduler_defaults(),
                Utc::now(),
                mode,
                guild.as_deref(),
            )
            .await;
            if reports.is_empty() {
                println!("No guilds matched.");
            }
            for report in reports {
                println!("{}", report);
            }
        }
    }
    Ok(())
}
