//! Moves messages between users and staff.
//!
//! Inbound DMs run in the background: failures are logged and dropped so a
//! bad relay never blocks the user's next message. Staff commands always
//! come back with a short message for the invoking staff member.

use std::sync::Arc;

use crate::discord::api::{
    ChannelId, Embed, MessageId, MessagingClient, PlatformError, Resource, UserIdentity,
};
use crate::error::{Error, Result};
use crate::i18n::Translations;

use super::content::{colors, RelayedContent};
use super::registry::{Ticket, TicketRegistry};

/// Reaction added to a user's DM once it has been relayed.
pub const ACK_EMOJI: &str = "✅";

/// A message-create event, reduced to what the relay needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author: UserIdentity,
    pub body: String,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    /// Sent in a DM rather than a guild channel.
    pub is_direct: bool,
}

pub struct MessageRelay {
    registry: Arc<TicketRegistry>,
    client: Arc<dyn MessagingClient>,
    strings: Arc<Translations>,
}

impl MessageRelay {
    pub fn new(
        registry: Arc<TicketRegistry>,
        client: Arc<dyn MessagingClient>,
        strings: Arc<Translations>,
    ) -> Self {
        Self {
            registry,
            client,
            strings,
        }
    }

    pub fn registry(&self) -> &Arc<TicketRegistry> {
        &self.registry
    }

    pub fn strings(&self) -> &Translations {
        &self.strings
    }

    /// Relay a user's DM into their ticket, opening one on first contact.
    pub async fn handle_inbound_user_message(&self, msg: &InboundMessage) {
        if msg.author.bot || !msg.is_direct {
            return;
        }

        if let Err(e) = self.relay_inbound(msg).await {
            if e.is_integrity_fault() {
                tracing::warn!("Ticket data problem for user {}: {}", msg.author.id, e);
            } else {
                tracing::error!("Failed to relay message from user {}: {}", msg.author.id, e);
            }
        }

        if let Err(e) = self
            .client
            .react(msg.channel_id, msg.message_id, ACK_EMOJI)
            .await
        {
            tracing::error!("Failed to react to message {}: {}", msg.message_id, e);
        }
    }

    async fn relay_inbound(&self, msg: &InboundMessage) -> Result<()> {
        if let Some(ticket) = self.registry.resolve(msg.author.id).await? {
            match self.post_inbound(&ticket, msg).await {
                Err(PlatformError::NotFound(_)) => {
                    // The channel went away without us seeing the delete
                    // event. Drop it and fall back to a fresh scan.
                    tracing::warn!(
                        "Ticket {} for user {} no longer exists, reopening",
                        ticket.channel.id,
                        msg.author.id
                    );
                    self.registry.handle_channel_deleted(&ticket.channel).await;
                }
                other => return other.map_err(Error::ExternalSendFailed),
            }

            if let Some(ticket) = self.registry.resolve(msg.author.id).await? {
                return self
                    .post_inbound(&ticket, msg)
                    .await
                    .map_err(Error::ExternalSendFailed);
            }
        }

        self.registry.create(&msg.author, &msg.body).await?;
        Ok(())
    }

    async fn post_inbound(
        &self,
        ticket: &Ticket,
        msg: &InboundMessage,
    ) -> std::result::Result<(), PlatformError> {
        let content = RelayedContent::Inbound {
            author: msg.author.clone(),
            body: msg.body.clone(),
        };
        self.client
            .send_embed(ticket.channel.id, content.to_embed())
            .await?;
        tracing::debug!("Relayed message from {} into {}", msg.author.id, ticket.channel.id);
        Ok(())
    }

    /// `/reply`: post a staff message into the ticket and DM it to the owner.
    pub async fn handle_staff_reply(
        &self,
        staff: &UserIdentity,
        channel_id: ChannelId,
        body: &str,
    ) -> String {
        let errors = &self.strings.general.errors;

        if body.trim().is_empty() {
            return errors.no_message.message.clone();
        }

        let (channel, owner) = match self.load_ticket(channel_id).await {
            Ok(found) => found,
            Err(message) => return message,
        };

        let content = RelayedContent::StaffReply {
            author: staff.clone(),
            body: body.to_string(),
        };

        match self.deliver_reply(&channel, &owner, &content).await {
            Ok(()) => {
                tracing::info!("Staff {} replied in ticket {}", staff.id, channel.id);
                self.strings.commands.reply.success.message.clone()
            }
            Err(e) => {
                tracing::error!("Failed to deliver reply in ticket {}: {}", channel.id, e);
                self.strings.commands.reply.error.message.clone()
            }
        }
    }

    async fn deliver_reply(
        &self,
        channel: &Resource,
        owner: &UserIdentity,
        content: &RelayedContent,
    ) -> Result<()> {
        let embed = content.to_embed();
        self.client
            .send_embed(channel.id, embed.clone())
            .await
            .map_err(Error::ExternalSendFailed)?;

        let dm = self
            .client
            .create_dm_channel(owner.id)
            .await
            .map_err(Error::ExternalSendFailed)?;
        self.client
            .send_embed(dm, embed)
            .await
            .map_err(Error::ExternalSendFailed)
    }

    /// `/close`: notify the owner, then delete the ticket channel.
    ///
    /// The cache is left alone; the channel-delete event evicts the entry,
    /// which keeps eviction in one place however the channel goes away.
    pub async fn handle_close_request(&self, staff: &UserIdentity, channel_id: ChannelId) -> String {
        let (channel, owner) = match self.load_ticket(channel_id).await {
            Ok(found) => found,
            Err(message) => return message,
        };

        self.notify_closed(&owner).await;

        tracing::info!("Ticket {} closed by staff member {}", channel.id, staff.id);

        let reason = format!("Ticket closed by {}", staff.tag);
        match self.client.delete_channel(channel.id, &reason).await {
            Ok(()) => self.strings.commands.close.success.message.clone(),
            Err(e) => {
                tracing::error!("Failed to delete ticket {}: {}", channel.id, e);
                self.strings.commands.close.error.message.clone()
            }
        }
    }

    async fn notify_closed(&self, owner: &UserIdentity) {
        let strings = &self.strings.embeds.ticket_closed;
        let embed = Embed {
            title: Some(strings.title.message.clone()),
            description: Some(strings.description.message.clone()),
            color: Some(colors::RED),
            footer: Some(strings.footer.message.clone()),
            ..Embed::default()
        };

        let dm = match self.client.create_dm_channel(owner.id).await {
            Ok(dm) => dm,
            Err(e) => {
                tracing::error!("Failed to create DM channel with user {}: {}", owner.id, e);
                return;
            }
        };
        if let Err(e) = self.client.send_embed(dm, embed).await {
            tracing::error!("Failed to send close notification to user {}: {}", owner.id, e);
        }
    }

    /// Load the invoking channel and its owner, or the message explaining
    /// why the command cannot run there.
    async fn load_ticket(
        &self,
        channel_id: ChannelId,
    ) -> std::result::Result<(Resource, UserIdentity), String> {
        let errors = &self.strings.general.errors;

        let channel = match self.client.fetch_channel(channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => return Err(errors.not_a_ticket.message.clone()),
            Err(e) => {
                tracing::warn!("Could not load channel {}: {}", channel_id, e);
                return Err(errors.channel.message.clone());
            }
        };

        let owner = self
            .registry
            .ticket_owner(&channel)
            .await
            .and_then(|owner| owner.ok_or(Error::NotATicket));

        match owner {
            Ok(owner) => Ok((channel, owner)),
            Err(Error::NotATicket) => {
                tracing::debug!("Channel {} is not a ticket", channel.id);
                Err(errors.not_a_ticket.message.clone())
            }
            Err(Error::ExternalLookupFailed(e)) => {
                let e = Error::OwnerResolutionFailed(lookup_detail(&e));
                tracing::error!("Channel {}: {}", channel.id, e);
                Err(errors.owner.message.clone())
            }
            Err(e) => {
                tracing::warn!("Channel {} has a broken ownership tag: {}", channel.id, e);
                Err(errors.generic.message.clone())
            }
        }
    }
}

fn lookup_detail(e: &PlatformError) -> String {
    match e {
        PlatformError::NotFound(what) => format!("{} does not exist", what),
        other => other.to_string(),
    }
}
