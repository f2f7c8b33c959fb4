//! Error types for ModMail.

use thiserror::Error;

use crate::discord::api::PlatformError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Discord error: {0}")]
    Discord(String),

    /// Channel topic carries no ownership tag.
    #[error("Channel is not a ticket")]
    NotATicket,

    /// Ownership prefix present but the identifier after it is unusable.
    #[error("Malformed ownership tag: {0:?}")]
    MalformedOwnershipTag(String),

    #[error("Failed to create ticket channel: {0}")]
    ExternalCreateFailed(#[source] PlatformError),

    #[error("Failed to send message: {0}")]
    ExternalSendFailed(#[source] PlatformError),

    #[error("Discord lookup failed: {0}")]
    ExternalLookupFailed(#[source] PlatformError),

    #[error("Could not resolve ticket owner: {0}")]
    OwnerResolutionFailed(String),
}

impl Error {
    /// Data-integrity problems deserve a warning; everything else on the
    /// background paths is an ordinary platform failure.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(self, Error::MalformedOwnershipTag(_))
    }
}
