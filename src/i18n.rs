//! User-facing strings, loadable per language from JSON files.
//!
//! Files live at `<dir>/<code>.json` and use the layout
//! `{ "general": { "errors": { "channel": { "message": "..." } } } }`.
//! Any key missing from a file keeps its built-in English text.

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

pub const DEFAULT_LANGUAGE: &str = "en-GB";

/// A single translated string.
#[derive(Deserialize, Clone, Debug)]
pub struct Translation {
    pub message: String,
}

impl From<&str> for Translation {
    fn from(s: &str) -> Self {
        Self { message: s.to_string() }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GeneralErrors {
    pub channel: Translation,
    pub owner: Translation,
    pub generic: Translation,
    pub not_a_ticket: Translation,
    pub no_message: Translation,
}

impl Default for GeneralErrors {
    fn default() -> Self {
        Self {
            channel: "I couldn't find this channel.".into(),
            owner: "I couldn't find the owner of this ticket.".into(),
            generic: "Something went wrong, please try again.".into(),
            not_a_ticket: "This channel is not a ticket.".into(),
            no_message: "Please provide a message.".into(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GeneralSuccess {
    pub generic: Translation,
}

impl Default for GeneralSuccess {
    fn default() -> Self {
        Self { generic: "Done!".into() }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct General {
    pub errors: GeneralErrors,
    pub success: GeneralSuccess,
}

macro_rules! outcome_strings {
    ($name:ident, $success:expr, $error:expr) => {
        #[derive(Deserialize, Clone, Debug)]
        #[serde(default)]
        pub struct $name {
            pub success: Translation,
            pub error: Translation,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    success: $success.into(),
                    error: $error.into(),
                }
            }
        }
    };
}

outcome_strings!(CloseStrings, "Ticket closed.", "Failed to close the ticket.");
outcome_strings!(ReplyStrings, "Reply sent.", "Failed to send your reply.");

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct CommandStrings {
    pub close: CloseStrings,
    pub reply: ReplyStrings,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TicketClosed {
    pub title: Translation,
    pub description: Translation,
    pub footer: Translation,
}

impl Default for TicketClosed {
    fn default() -> Self {
        Self {
            title: "Ticket closed".into(),
            description: "Your ticket has been closed by staff. Send a new message to open another one.".into(),
            footer: "ModMail".into(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct EmbedStrings {
    pub ticket_closed: TicketClosed,
}

/// All strings for one language.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Translations {
    pub general: General,
    pub commands: CommandStrings,
    pub embeds: EmbedStrings,
}

impl Translations {
    /// Load `<dir>/<code>.json`, falling back to `en-GB` and then to the
    /// built-in strings.
    pub fn load(dir: Option<&Path>, code: &str) -> Result<Self> {
        let Some(dir) = dir else {
            tracing::debug!("No language directory configured, using built-in strings");
            return Ok(Self::default());
        };

        for candidate in [code, DEFAULT_LANGUAGE] {
            let path = dir.join(format!("{}.json", candidate));
            if path.exists() {
                let content = std::fs::read_to_string(&path)?;
                let translations: Translations = serde_json::from_str(&content)?;
                tracing::info!("Language system initialized with: {}", candidate);
                return Ok(translations);
            }
            tracing::warn!("Language file {} not found", path.display());
        }

        tracing::warn!("Falling back to built-in English strings");
        Ok(Self::default())
    }
}
