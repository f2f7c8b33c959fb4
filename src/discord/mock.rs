//! In-memory `MessagingClient` for tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::api::*;

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ChannelId),
    Create { name: String, topic: String },
    Delete { channel: ChannelId, reason: String },
    Send { channel: ChannelId, embed: Embed },
    OpenDm(UserId),
    React { channel: ChannelId, message: MessageId, emoji: String },
    Lookup(UserId),
    Fetch(ChannelId),
}

#[derive(Default)]
pub struct Failures {
    pub list: bool,
    pub create: bool,
    pub delete: bool,
    pub send: bool,
    pub dm: bool,
    pub react: bool,
    pub lookup: bool,
}

/// Fake guild: a set of channels, a user directory and a call log.
pub struct MockClient {
    pub channels: Mutex<Vec<Resource>>,
    pub users: Mutex<HashMap<UserId, UserIdentity>>,
    pub calls: Mutex<Vec<Call>>,
    pub fail: Mutex<Failures>,
    /// Channels that existed once and were removed; sends to them 404.
    gone: Mutex<HashSet<ChannelId>>,
    next_id: AtomicU64,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(Vec::new()),
            users: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail: Mutex::new(Failures::default()),
            gone: Mutex::new(HashSet::new()),
            next_id: AtomicU64::new(1000),
        }
    }

    pub fn add_user(&self, id: u64, name: &str, bot: bool) -> UserIdentity {
        let user = UserIdentity {
            id: UserId(id),
            name: name.to_string(),
            tag: name.to_string(),
            avatar_url: None,
            bot,
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    pub fn add_channel(&self, id: u64, name: &str, topic: &str, category: ChannelId) -> Resource {
        let resource = Resource {
            id: ChannelId(id),
            name: name.to_string(),
            topic: Some(topic.to_string()),
            category_id: Some(category),
        };
        self.channels.lock().unwrap().push(resource.clone());
        resource
    }

    pub fn remove_channel(&self, id: ChannelId) -> Option<Resource> {
        let mut channels = self.channels.lock().unwrap();
        let pos = channels.iter().position(|c| c.id == id)?;
        self.gone.lock().unwrap().insert(id);
        Some(channels.remove(pos))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::List(_))).count()
    }

    pub fn sends(&self) -> Vec<(ChannelId, Embed)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { channel, embed } => Some((channel, embed)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failing(&self, pick: impl Fn(&Failures) -> bool) -> Result<()> {
        if pick(&self.fail.lock().unwrap()) {
            Err(PlatformError::Http("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

/// DM channel ids are derived from the user id so tests can predict them.
pub fn dm_channel_for(user: UserId) -> ChannelId {
    ChannelId(user.0 + 1_000_000)
}

#[async_trait]
impl MessagingClient for MockClient {
    async fn list_category_channels(
        &self,
        _guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<Resource>> {
        self.record(Call::List(category));
        self.failing(|f| f.list)?;
        // Yield so concurrent resolvers actually interleave.
        tokio::task::yield_now().await;
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.category_id == Some(category))
            .cloned()
            .collect())
    }

    async fn fetch_channel(&self, channel: ChannelId) -> Result<Option<Resource>> {
        self.record(Call::Fetch(channel));
        let found = self.channels.lock().unwrap().iter().find(|c| c.id == channel).cloned();
        match found {
            Some(c) => Ok(Some(c)),
            None => Err(PlatformError::NotFound(format!("channel {}", channel))),
        }
    }

    async fn create_channel(
        &self,
        _guild: GuildId,
        name: &str,
        category: ChannelId,
        topic: &str,
    ) -> Result<Resource> {
        self.record(Call::Create {
            name: name.to_string(),
            topic: topic.to_string(),
        });
        self.failing(|f| f.create)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(self.add_channel(id, name, topic, category))
    }

    async fn delete_channel(&self, channel: ChannelId, audit_reason: &str) -> Result<()> {
        self.record(Call::Delete {
            channel,
            reason: audit_reason.to_string(),
        });
        self.failing(|f| f.delete)?;
        self.remove_channel(channel);
        Ok(())
    }

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> Result<()> {
        self.record(Call::Send { channel, embed });
        self.failing(|f| f.send)?;
        if self.gone.lock().unwrap().contains(&channel) {
            return Err(PlatformError::NotFound(format!("channel {}", channel)));
        }
        Ok(())
    }

    async fn create_dm_channel(&self, user: UserId) -> Result<ChannelId> {
        self.record(Call::OpenDm(user));
        self.failing(|f| f.dm)?;
        Ok(dm_channel_for(user))
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.record(Call::React {
            channel,
            message,
            emoji: emoji.to_string(),
        });
        self.failing(|f| f.react)
    }

    async fn lookup_user(&self, user: UserId) -> Result<UserIdentity> {
        self.record(Call::Lookup(user));
        self.failing(|f| f.lookup)?;
        self.users
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("user {}", user)))
    }
}
