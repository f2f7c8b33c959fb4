//! The slice of the Discord API that tickets depend on.
//!
//! Everything the ticket code needs from Discord goes through
//! [`MessagingClient`], so the registry and relay can run against the
//! serenity-backed client in production and an in-memory one in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, PlatformError>;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// A Discord user.
    UserId
);
snowflake!(
    /// Any channel: guild text channel, category or DM.
    ChannelId
);
snowflake!(GuildId);
snowflake!(MessageId);

/// A guild channel as tickets see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ChannelId,
    pub name: String,
    /// Channel topic; this is where ticket ownership lives.
    pub topic: Option<String>,
    pub category_id: Option<ChannelId>,
}

impl Resource {
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or("")
    }
}

/// A user as returned by a Discord lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: String,
    /// `name#discriminator` for legacy accounts, otherwise the username.
    pub tag: String,
    pub avatar_url: Option<String>,
    /// Bot and system accounts.
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Platform-neutral embed; the serenity client turns it into a `CreateEmbed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Everything tickets need from Discord.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// List the text channels under `category` in `guild`.
    async fn list_category_channels(
        &self,
        guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<Resource>>;

    /// Fetch a channel by id. `Ok(None)` when it is not a guild channel.
    async fn fetch_channel(&self, channel: ChannelId) -> Result<Option<Resource>>;

    /// Create a text channel under `category` with the given topic.
    async fn create_channel(
        &self,
        guild: GuildId,
        name: &str,
        category: ChannelId,
        topic: &str,
    ) -> Result<Resource>;

    /// Delete a channel, recording `audit_reason` in the audit log.
    async fn delete_channel(&self, channel: ChannelId, audit_reason: &str) -> Result<()>;

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> Result<()>;

    /// Open (or reuse) the DM channel with `user`.
    async fn create_dm_channel(&self, user: UserId) -> Result<ChannelId>;

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    async fn lookup_user(&self, user: UserId) -> Result<UserIdentity>;
}
