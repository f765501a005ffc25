use serenity::all::CommandInteraction;
use serenity::async_trait;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::prelude::Context;
use tracing::warn;

use crate::service::notification_message_service::EventEmbed;
use crate::tasks::notification_loop::to_create_embed;

#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn reply_ephemeral(&self, content: &str);
    /// Acknowledges a slow command; follow up with [`edit_reply`](Self::edit_reply).
    async fn defer_ephemeral(&self);
    async fn edit_reply(&self, content: &str, embed: Option<&EventEmbed>);
}

pub struct SerenityResponder<'a> {
    ctx: &'a Context,
    command: &'a CommandInteraction,
}

impl<'a> SerenityResponder<'a> {
    pub fn for_command(ctx: &'a Context, command: &'a CommandInteraction) -> Self {
        Self { ctx, command }
    }
}

#[async_trait]
impl InteractionResponder for SerenityResponder<'_> {
    async fn reply_ephemeral(&self, content: &str) {
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true),
        );
        if let Err(err) = self.command.create_response(&self.ctx.http, response).await {
            warn!(command = %self.command.data.name, error = %err, "failed to reply");
        }
    }

    async fn defer_ephemeral(&self) {
        if let Err(err) = self.command.defer_ephemeral(&self.ctx.http).await {
            warn!(command = %self.command.data.name, error = %err, "failed to defer");
        }
    }

    async fn edit_reply(&self, content: &str, embed: Option<&EventEmbed>) {
        let mut edit = EditInteractionResponse::new().content(content);
        if let Some(embed) = embed {
            edit = edit.embed(to_create_embed(embed));
        }
        if let Err(err) = self.command.edit_response(&self.ctx.http, edit).await {
            warn!(command = %self.command.data.name, error = %err, "failed to edit reply");
        }
    }
}
