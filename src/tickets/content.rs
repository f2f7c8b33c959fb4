//! Relayed message content and how it is presented.

use chrono::Utc;

use crate::discord::api::{Embed, EmbedAuthor, UserIdentity};

/// Footer on every relayed embed.
pub const FOOTER: &str = "ModMail";

/// Embed colours used by the relay.
pub mod colors {
    pub const GREEN: u32 = 0x57F287;
    pub const YELLOW: u32 = 0xFFFF00;
    pub const RED: u32 = 0xED4245;
    pub const PING: u32 = 0xFF3333;
}

/// A message being relayed between a user and staff.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayedContent {
    /// A DM the user sent to the bot.
    Inbound { author: UserIdentity, body: String },
    /// A `/reply` issued by a staff member in the ticket channel.
    StaffReply { author: UserIdentity, body: String },
}

impl RelayedContent {
    pub fn body(&self) -> &str {
        match self {
            RelayedContent::Inbound { body, .. } | RelayedContent::StaffReply { body, .. } => body,
        }
    }

    pub fn author(&self) -> &UserIdentity {
        match self {
            RelayedContent::Inbound { author, .. } | RelayedContent::StaffReply { author, .. } => {
                author
            }
        }
    }

    pub fn is_staff_originated(&self) -> bool {
        matches!(self, RelayedContent::StaffReply { .. })
    }

    pub fn color(&self) -> u32 {
        if self.is_staff_originated() {
            colors::YELLOW
        } else {
            colors::GREEN
        }
    }

    /// The embed posted for this content. The ticket channel and the user's
    /// DM get the same embed: true author, direction colour.
    pub fn to_embed(&self) -> Embed {
        let author = self.author();
        Embed {
            description: Some(self.body().to_string()),
            color: Some(self.color()),
            author: Some(EmbedAuthor {
                name: author.name.clone(),
                icon_url: author.avatar_url.clone(),
            }),
            footer: Some(FOOTER.to_string()),
            timestamp: Some(Utc::now()),
            ..Embed::default()
        }
    }
}
