use std::sync::Arc;

use anyhow::Context;
use serenity::model::gateway::GatewayIntents;
use tracing::{error, info};

use crate::clients::espn_client::EspnClient;
use crate::config::Settings;
use crate::handlers::discord::BotHandler;
use crate::service::provider::default_registry;
use crate::store::GuildStore;
use crate::store::file_store::FileGuildStore;
use crate::tasks::notification_loop::{self, DiscordSender, MessageSender};
use crate::tasks::task_runner::TaskRunner;

pub async fn run_api(settings: Settings) -> anyhow::Result<()> {
    let token = settings
        .discord_token
        .clone()
        .context("DISCORD_TOKEN must be set for bot mode")?;
    let store: Arc<dyn GuildStore> = Arc::new(
        FileGuildStore::open(&settings.state_file)
            .with_context(|| format!("opening state file {}", settings.state_file))?,
    );
    let client = EspnClient::new("ufc", &settings.user_agent, settings.http_timeout)
        .context("building ESPN client")?;
    let registry = Arc::new(default_registry(Arc::new(client)));
    let defaults = settings.scheduler_defaults();

    let http = Arc::new(serenity::http::Http::new(&token));
    let sender: Arc<dyn MessageSender> =
        Arc::new(DiscordSender::new(http, settings.http_timeout));

    let mut task_runner = TaskRunner::new();
    task_runner.add_task("notification_loop", {
        let store = store.clone();
        let registry = registry.clone();
        let sender = sender.clone();
        let defaults = defaults.clone();
        move || {
            tokio::spawn(async move {
                notification_loop::run_notification_loop(store, registry, sender, defaults).await;
            });
        }
    });
    task_runner.start_all();

    let intents = GatewayIntents::GUILDS;
    let handler = BotHandler::new(store, registry, sender, defaults, settings.dev_guild_id);
    let mut client = serenity::Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("creating Discord client")?;

    info!("starting Discord client");
    if let Err(why) = client.start().await {
        error!(error = %why, "client error");
        return Err(why.into());
    }
    Ok(())
}
