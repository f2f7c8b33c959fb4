//! Discord integration.

pub mod api;
pub mod client;
pub mod commands;
pub mod handler;

#[cfg(test)]
pub(crate) mod mock;

pub use api::MessagingClient;
pub use client::{run_discord_daemon, SerenityClient};
