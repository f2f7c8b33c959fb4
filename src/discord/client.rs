//! Serenity-backed Discord client and the bot daemon.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::all::{
    ChannelType, Client, CreateChannel, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter,
    CreateMessage, GuildChannel, ReactionType, Timestamp, User,
};
use serenity::http::Http;
use serenity::model::id as sid;

use crate::config::DiscordConfig;
use crate::error::Error;
use crate::i18n::Translations;
use crate::tickets::{MessageRelay, TicketRegistry};

use super::api::*;
use super::handler::TicketHandler;

/// `MessagingClient` over serenity's HTTP client. Every request is bounded
/// by `timeout`; a request that runs out of time is reported, not retried.
pub struct SerenityClient {
    http: Arc<Http>,
    timeout: Duration,
}

impl SerenityClient {
    pub fn new(http: Arc<Http>, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = serenity::Result<T>> + Send,
    {
        with_timeout(self.timeout, fut).await
    }
}

async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = serenity::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(platform_error),
        Err(_) => Err(PlatformError::Timeout),
    }
}

fn platform_error(e: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(http) = &e {
        if http.status_code().is_some_and(|s| s.as_u16() == 404) {
            return PlatformError::NotFound(e.to_string());
        }
    }
    PlatformError::Http(e.to_string())
}

pub(crate) fn user_identity(user: &User) -> UserIdentity {
    UserIdentity {
        id: UserId(user.id.get()),
        name: user.name.clone(),
        tag: user.tag(),
        avatar_url: user.avatar_url(),
        bot: user.bot,
    }
}

pub(crate) fn resource(channel: &GuildChannel) -> Resource {
    Resource {
        id: ChannelId(channel.id.get()),
        name: channel.name.clone(),
        topic: channel.topic.clone(),
        category_id: channel.parent_id.map(|p| ChannelId(p.get())),
    }
}

/// Convert a ticket `Embed` into a serenity `CreateEmbed`.
pub(crate) fn build_embed(embed: Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = embed.description {
        builder = builder.description(description);
    }
    if let Some(color) = embed.color {
        builder = builder.color(color);
    }
    if let Some(author) = embed.author {
        let mut a = CreateEmbedAuthor::new(author.name);
        if let Some(icon) = author.icon_url {
            a = a.icon_url(icon);
        }
        builder = builder.author(a);
    }
    if let Some(footer) = embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(ts) = embed.timestamp {
        if let Ok(timestamp) = Timestamp::from_unix_timestamp(ts.timestamp()) {
            builder = builder.timestamp(timestamp);
        }
    }
    builder
}

#[async_trait]
impl MessagingClient for SerenityClient {
    async fn list_category_channels(
        &self,
        guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<Resource>> {
        let channels = self
            .bounded(self.http.get_channels(sid::GuildId::new(guild.get())))
            .await?;
        Ok(channels
            .iter()
            .filter(|c| c.kind == ChannelType::Text)
            .filter(|c| c.parent_id.map(|p| p.get()) == Some(category.get()))
            .map(resource)
            .collect())
    }

    async fn fetch_channel(&self, channel: ChannelId) -> Result<Option<Resource>> {
        let channel = self
            .bounded(self.http.get_channel(sid::ChannelId::new(channel.get())))
            .await?;
        Ok(channel.guild().as_ref().map(resource))
    }

    async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        category: ChannelId,
        topic: &str,
    ) -> Result<Resource> {
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Text)
            .topic(topic)
            .category(sid::ChannelId::new(category.get()));
        let created = self
            .bounded(sid::GuildId::new(guild.get()).create_channel(self.http.as_ref(), builder))
            .await?;
        Ok(resource(&created))
    }

    async fn delete_channel(&self, channel: ChannelId, audit_reason: &str) -> Result<()> {
        self.bounded(
            self.http
                .delete_channel(sid::ChannelId::new(channel.get()), Some(audit_reason)),
        )
        .await?;
        Ok(())
    }

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> Result<()> {
        let message = CreateMessage::new().embed(build_embed(embed));
        self.bounded(sid::ChannelId::new(channel.get()).send_message(self.http.as_ref(), message))
            .await?;
        Ok(())
    }

    async fn create_dm_channel(&self, user: UserId) -> Result<ChannelId> {
        let dm = self
            .bounded(sid::UserId::new(user.get()).create_dm_channel(self.http.as_ref()))
            .await?;
        Ok(ChannelId(dm.id.get()))
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        let reaction = ReactionType::Unicode(emoji.to_string());
        self.bounded(self.http.create_reaction(
            sid::ChannelId::new(channel.get()),
            sid::MessageId::new(message.get()),
            &reaction,
        ))
        .await
    }

    async fn lookup_user(&self, user: UserId) -> Result<UserIdentity> {
        let user = self
            .bounded(self.http.get_user(sid::UserId::new(user.get())))
            .await?;
        Ok(user_identity(&user))
    }
}

/// Run the Discord bot until the gateway connection ends or Ctrl-C.
pub async fn run_discord_daemon(
    config: DiscordConfig,
    strings: Translations,
) -> std::result::Result<(), Error> {
    tracing::info!("Starting Discord bot...");

    let http = Arc::new(Http::new(&config.token));
    let client: Arc<dyn MessagingClient> =
        Arc::new(SerenityClient::new(http, config.request_timeout));
    let registry = Arc::new(TicketRegistry::new(
        client.clone(),
        config.guild_id,
        config.category_id,
    ));
    let relay = Arc::new(MessageRelay::new(registry, client, Arc::new(strings)));
    let handler = TicketHandler::new(relay, config.guild_id);

    let mut discord = Client::builder(&config.token, TicketHandler::intents())
        .event_handler(handler)
        .await
        .map_err(|e| Error::Discord(e.to_string()))?;

    let shard_manager = discord.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down Discord bot");
            shard_manager.shutdown_all().await;
        }
    });

    discord
        .start()
        .await
        .map_err(|e| Error::Discord(e.to_string()))
}
