//! Ownership tag stored in a ticket channel's topic.
//!
//! The topic is the only durable record of who owns a ticket, so this format
//! must stay readable by a fresh process with an empty cache.

use crate::discord::api::UserId;
use crate::error::{Error, Result};

/// Prefix marking a channel topic as a ticket ownership tag.
pub const TAG_PREFIX: &str = "User: ";

/// Encodes and decodes the `"User: <id>"` ownership tag.
pub struct OwnershipTag;

impl OwnershipTag {
    pub fn encode(owner: UserId) -> String {
        format!("{}{}", TAG_PREFIX, owner)
    }

    /// Decode a channel topic.
    ///
    /// `Ok(None)` means the topic is not a ticket tag at all. A topic that has
    /// the prefix but no valid id after it is an error: somebody edited the
    /// topic or it was written by something else.
    pub fn decode(topic: &str) -> Result<Option<UserId>> {
        let Some((_, suffix)) = topic.split_once(TAG_PREFIX) else {
            return Ok(None);
        };

        let suffix = suffix.trim();
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedOwnershipTag(topic.to_string()));
        }

        match suffix.parse::<u64>() {
            Ok(0) | Err(_) => Err(Error::MalformedOwnershipTag(topic.to_string())),
            Ok(id) => Ok(Some(UserId(id))),
        }
    }
}
