//! Ticket registry: user → ticket channel, cached in memory.
//!
//! Channel topics are the source of truth. The cache only saves a channel
//! listing on the hot path; dropping it at any time changes latency, never
//! behaviour. The write lock is only ever held for a map operation, never
//! across a Discord call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::discord::api::{ChannelId, GuildId, MessagingClient, Resource, UserId, UserIdentity};
use crate::error::{Error, Result};

use super::codec::OwnershipTag;
use super::content::RelayedContent;

/// An open conversation between one user and staff.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub channel: Resource,
    pub owner: UserId,
}

pub struct TicketRegistry {
    client: Arc<dyn MessagingClient>,
    guild_id: GuildId,
    category_id: ChannelId,
    cache: RwLock<HashMap<UserId, Ticket>>,
}

impl TicketRegistry {
    pub fn new(client: Arc<dyn MessagingClient>, guild_id: GuildId, category_id: ChannelId) -> Self {
        Self {
            client,
            guild_id,
            category_id,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Find the open ticket for `owner`, if any.
    ///
    /// A cache hit does no I/O. On a miss the ticket category is listed and
    /// the first channel whose topic decodes to `owner` is adopted.
    pub async fn resolve(&self, owner: UserId) -> Result<Option<Ticket>> {
        if let Some(ticket) = self.cache.read().await.get(&owner) {
            return Ok(Some(ticket.clone()));
        }

        let channels = self
            .client
            .list_category_channels(self.guild_id, self.category_id)
            .await
            .map_err(Error::ExternalLookupFailed)?;

        for channel in channels {
            match OwnershipTag::decode(channel.topic()) {
                Ok(Some(id)) if id == owner => {
                    let found = Ticket { channel, owner };
                    // Two concurrent misses both land here with equivalent
                    // tickets; whoever inserted first is what both return.
                    let mut cache = self.cache.write().await;
                    let ticket = cache.entry(owner).or_insert(found).clone();
                    tracing::debug!("Reconciled ticket {} for user {}", ticket.channel.id, owner);
                    return Ok(Some(ticket));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Skipping channel {} ({}): {}", channel.id, channel.name, e);
                }
            }
        }

        Ok(None)
    }

    /// Open a new ticket channel for `owner` and post their first message.
    ///
    /// Only call after [`resolve`](Self::resolve) returned `None`. Two first
    /// messages racing through here can leave a user with two channels; the
    /// next reconciliation picks one and the other stays orphaned.
    pub async fn create(&self, owner: &UserIdentity, first_message: &str) -> Result<Ticket> {
        let topic = OwnershipTag::encode(owner.id);
        let channel = self
            .client
            .create_channel(self.guild_id, &owner.name, self.category_id, &topic)
            .await
            .map_err(Error::ExternalCreateFailed)?;

        let ticket = Ticket {
            channel,
            owner: owner.id,
        };

        // The channel exists now and would be rediscovered by a scan anyway,
        // so cache before the summary post can fail.
        self.cache.write().await.insert(owner.id, ticket.clone());
        tracing::info!("Opened ticket {} for user {} ({})", ticket.channel.id, owner.name, owner.id);

        let summary = RelayedContent::Inbound {
            author: owner.clone(),
            body: first_message.to_string(),
        };
        self.client
            .send_embed(ticket.channel.id, summary.to_embed())
            .await
            .map_err(Error::ExternalSendFailed)?;

        Ok(ticket)
    }

    /// Forget the cached ticket for `owner`. Does not touch Discord.
    pub async fn evict(&self, owner: UserId) {
        if self.cache.write().await.remove(&owner).is_some() {
            tracing::debug!("Evicted ticket for user {} from cache", owner);
        }
    }

    /// React to a channel disappearing from the guild.
    ///
    /// Only evicts when the cached ticket is the deleted channel, so a stale
    /// delete of a duplicate cannot drop the live ticket.
    pub async fn handle_channel_deleted(&self, channel: &Resource) {
        let owner = match OwnershipTag::decode(channel.topic()) {
            Ok(Some(owner)) => owner,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Deleted channel {} had a bad ownership tag: {}", channel.id, e);
                return;
            }
        };

        let mut cache = self.cache.write().await;
        if cache.get(&owner).is_some_and(|t| t.channel.id == channel.id) {
            cache.remove(&owner);
            tracing::info!("Removed ticket {} from cache as it was deleted", channel.id);
        }
    }

    /// Whether `resource` is a ticket channel owned by a real user.
    pub async fn is_ticket_resource(&self, resource: &Resource) -> Result<bool> {
        Ok(self.ticket_owner(resource).await?.is_some())
    }

    /// The human owner encoded in `resource`'s topic.
    ///
    /// The decoded id is looked up on Discord so a topic pointing at a bot
    /// account is not treated as a ticket. A failed lookup is an error, not
    /// "not a ticket".
    pub async fn ticket_owner(&self, resource: &Resource) -> Result<Option<UserIdentity>> {
        let Some(id) = OwnershipTag::decode(resource.topic())? else {
            return Ok(None);
        };

        let user = self
            .client
            .lookup_user(id)
            .await
            .map_err(Error::ExternalLookupFailed)?;

        if user.bot {
            tracing::warn!("Channel {} is tagged with bot account {}", resource.id, id);
            return Ok(None);
        }
        Ok(Some(user))
    }

    #[cfg(test)]
    pub(crate) async fn cached(&self, owner: UserId) -> Option<Ticket> {
        self.cache.read().await.get(&owner).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::mock::{Call, MockClient};
    use crate::tickets::content::colors;

    const GUILD: GuildId = GuildId(1);
    const CATEGORY: ChannelId = ChannelId(2);

    fn setup() -> (Arc<MockClient>, TicketRegistry) {
        crate::logging::init_test();
        let mock = Arc::new(MockClient::new());
        let registry = TicketRegistry::new(mock.clone(), GUILD, CATEGORY);
        (mock, registry)
    }

    #[tokio::test]
    async fn resolve_returns_none_without_ticket() {
        let (mock, registry) = setup();
        mock.add_channel(10, "rules", "Read the rules", CATEGORY);

        assert_eq!(registry.resolve(UserId(42)).await.unwrap(), None);
        assert_eq!(mock.list_calls(), 1);
    }

    #[tokio::test]
    async fn resolve_reconciles_from_topics_then_hits_cache() {
        let (mock, registry) = setup();
        mock.add_channel(10, "bob", "User: 7", CATEGORY);
        mock.add_channel(11, "alice", "User: 42", CATEGORY);

        let ticket = registry.resolve(UserId(42)).await.unwrap().unwrap();
        assert_eq!(ticket.channel.id, ChannelId(11));
        assert_eq!(ticket.owner, UserId(42));

        let again = registry.resolve(UserId(42)).await.unwrap().unwrap();
        assert_eq!(again, ticket);
        assert_eq!(mock.list_calls(), 1);
    }

    #[tokio::test]
    async fn resolve_ignores_other_categories_and_bad_tags() {
        let (mock, registry) = setup();
        mock.add_channel(10, "elsewhere", "User: 42", ChannelId(99));
        mock.add_channel(11, "broken", "User: nope", CATEGORY);

        assert_eq!(registry.resolve(UserId(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn resolve_surfaces_listing_failure() {
        let (mock, registry) = setup();
        mock.fail.lock().unwrap().list = true;

        let err = registry.resolve(UserId(42)).await.unwrap_err();
        assert!(matches!(err, Error::ExternalLookupFailed(_)));
    }

    #[tokio::test]
    async fn create_tags_channel_posts_summary_and_caches() {
        let (mock, registry) = setup();
        let user = mock.add_user(42, "alice", false);

        let ticket = registry.create(&user, "help").await.unwrap();
        assert_eq!(ticket.channel.topic(), "User: 42");
        assert_eq!(ticket.channel.category_id, Some(CATEGORY));
        assert!(mock.calls().contains(&Call::Create {
            name: "alice".into(),
            topic: "User: 42".into(),
        }));

        let sends = mock.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, ticket.channel.id);
        assert_eq!(sends[0].1.description.as_deref(), Some("help"));
        assert_eq!(sends[0].1.color, Some(colors::GREEN));

        assert_eq!(registry.resolve(UserId(42)).await.unwrap(), Some(ticket));
        assert_eq!(mock.list_calls(), 0);
    }

    #[tokio::test]
    async fn failed_create_caches_nothing() {
        let (mock, registry) = setup();
        let user = mock.add_user(42, "alice", false);
        mock.fail.lock().unwrap().create = true;

        let err = registry.create(&user, "help").await.unwrap_err();
        assert!(matches!(err, Error::ExternalCreateFailed(_)));
        assert_eq!(registry.cached(UserId(42)).await, None);
    }

    #[tokio::test]
    async fn deletion_event_forces_fresh_reconciliation() {
        let (mock, registry) = setup();
        let user = mock.add_user(42, "alice", false);
        let ticket = registry.create(&user, "help").await.unwrap();

        let gone = mock.remove_channel(ticket.channel.id).unwrap();
        registry.handle_channel_deleted(&gone).await;
        assert_eq!(registry.cached(UserId(42)).await, None);

        assert_eq!(registry.resolve(UserId(42)).await.unwrap(), None);
        assert_eq!(mock.list_calls(), 1);
    }

    #[tokio::test]
    async fn deleting_a_duplicate_keeps_the_cached_ticket() {
        let (mock, registry) = setup();
        mock.add_channel(11, "alice", "User: 42", CATEGORY);
        let duplicate = mock.add_channel(12, "alice", "User: 42", CATEGORY);
        registry.resolve(UserId(42)).await.unwrap();

        registry.handle_channel_deleted(&duplicate).await;
        assert_eq!(registry.cached(UserId(42)).await.unwrap().channel.id, ChannelId(11));
    }

    #[tokio::test]
    async fn evict_is_idempotent() {
        let (mock, registry) = setup();
        mock.add_channel(11, "alice", "User: 42", CATEGORY);
        registry.resolve(UserId(42)).await.unwrap();

        registry.evict(UserId(42)).await;
        registry.evict(UserId(42)).await;
        assert_eq!(registry.cached(UserId(42)).await, None);
        assert!(!mock.calls().iter().any(|c| matches!(c, Call::Delete { .. })));
    }

    #[tokio::test]
    async fn concurrent_resolves_converge() {
        let (mock, registry) = setup();
        mock.add_channel(11, "alice", "User: 42", CATEGORY);
        mock.add_channel(12, "alice", "User: 42", CATEGORY);
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.resolve(UserId(42)).await.unwrap() })
            })
            .collect();

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap().unwrap());
        }
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.cached(UserId(42)).await, Some(seen[0].clone()));
    }

    #[tokio::test]
    async fn untagged_channel_is_not_a_ticket() {
        let (mock, registry) = setup();
        let channel = mock.add_channel(10, "general", "chit chat", CATEGORY);

        assert!(!registry.is_ticket_resource(&channel).await.unwrap());
        assert!(mock.calls().iter().all(|c| !matches!(c, Call::Lookup(_))));
    }

    #[tokio::test]
    async fn bot_owned_tag_is_not_a_ticket() {
        let (mock, registry) = setup();
        mock.add_user(5, "spoofbot", true);
        let channel = mock.add_channel(10, "x", "User: 5", CATEGORY);

        assert!(!registry.is_ticket_resource(&channel).await.unwrap());
    }

    #[tokio::test]
    async fn owner_lookup_failure_is_distinct_from_not_a_ticket() {
        let (mock, registry) = setup();
        let channel = mock.add_channel(10, "alice", "User: 42", CATEGORY);
        mock.fail.lock().unwrap().lookup = true;

        let err = registry.is_ticket_resource(&channel).await.unwrap_err();
        assert!(matches!(err, Error::ExternalLookupFailed(_)));
    }

    #[tokio::test]
    async fn malformed_tag_is_reported() {
        let (mock, registry) = setup();
        let channel = mock.add_channel(10, "alice", "User: 4x2", CATEGORY);

        let err = registry.ticket_owner(&channel).await.unwrap_err();
        assert!(err.is_integrity_fault());
    }
}
