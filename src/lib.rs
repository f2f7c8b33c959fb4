//! ModMail library root.

pub mod cli;
pub mod config;
pub mod discord;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod tickets;

pub use cli::Commands;
pub use config::{load_settings, validate_settings, DiscordConfig, LoggingSettings, Settings};
pub use discord::run_discord_daemon;
pub use error::{Error, Result};
pub use tickets::{MessageRelay, OwnershipTag, Ticket, TicketRegistry};
