//! Discord event handler for serenity.
//!
//! Serenity runs every gateway event on its own task, so handlers here may
//! run concurrently; shared state lives in the registry.

use std::sync::Arc;

use serenity::all::{
    Context, EventHandler, GatewayIntents, GuildChannel, Interaction, Message, Ready,
};
use serenity::async_trait;

use crate::tickets::{InboundMessage, MessageRelay};

use super::api::{ChannelId, GuildId, MessageId};
use super::client::{resource, user_identity};
use super::commands;

/// Handler for Discord gateway events.
pub struct TicketHandler {
    relay: Arc<MessageRelay>,
    guild_id: GuildId,
}

impl TicketHandler {
    pub fn new(relay: Arc<MessageRelay>, guild_id: GuildId) -> Self {
        Self { relay, guild_id }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }
}

fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        author: user_identity(&msg.author),
        body: msg.content.clone(),
        channel_id: ChannelId(msg.channel_id.get()),
        message_id: MessageId(msg.id.get()),
        is_direct: msg.guild_id.is_none(),
    }
}

#[async_trait]
impl EventHandler for TicketHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        commands::register(&ctx.http, self.guild_id).await;
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        // Cheap filter before building anything; the relay checks again.
        if msg.author.bot || msg.guild_id.is_some() {
            return;
        }
        self.relay
            .handle_inbound_user_message(&inbound_message(&msg))
            .await;
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        if channel.guild_id.get() != self.guild_id.get() {
            return;
        }
        self.relay
            .registry()
            .handle_channel_deleted(&resource(&channel))
            .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            commands::dispatch(&ctx, &self.relay, &command).await;
        }
    }
}
