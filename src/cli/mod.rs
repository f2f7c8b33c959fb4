//! CLI commands for ModMail using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{validate_settings, Settings};
use crate::discord::api::UserId;
use crate::i18n::Translations;
use crate::tickets::OwnershipTag;

/// ModMail - private user-to-staff tickets on Discord.
#[derive(Parser)]
#[command(name = "modmail")]
#[command(version = "0.1.0")]
#[command(about = "ModMail - Discord tickets stored in channel topics", long_about = None)]
pub struct Commands {
    /// Settings file (defaults to ~/.modmail/settings.json)
    #[arg(long, global = true, env = "MODMAIL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect to Discord and start relaying tickets
    Start,

    /// Show the resolved configuration
    Config,

    /// Work with ticket ownership tags offline
    #[command(subcommand)]
    Tag(TagCommand),
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// Print the channel topic that marks a ticket owned by USER_ID
    Encode {
        /// Discord user ID
        user_id: u64,
    },

    /// Print the owner encoded in a channel topic
    Decode {
        /// Channel topic text
        topic: String,
    },
}

impl Commands {
    /// Run the command against settings already loaded from `--config`.
    pub async fn run(&self, settings: Settings) -> Result<()> {
        match &self.command {
            Command::Start => cmd_start(settings).await,
            Command::Config => cmd_config(&settings),
            Command::Tag(cmd) => cmd_tag(cmd),
        }
    }
}

async fn cmd_start(settings: Settings) -> Result<()> {
    use crate::discord::run_discord_daemon;

    let discord = validate_settings(&settings)?;
    let strings = Translations::load(settings.language.directory.as_deref(), &settings.language.code)?;

    tracing::info!(
        guild = %discord.guild_id,
        category = %discord.category_id,
        "Starting ModMail"
    );
    run_discord_daemon(discord, strings).await?;
    Ok(())
}

fn cmd_config(settings: &Settings) -> Result<()> {
    println!("{}", describe_settings(settings));

    match validate_settings(settings) {
        Ok(_) => println!("\nConfiguration OK"),
        Err(e) => println!("\nConfiguration incomplete: {}", e),
    }
    Ok(())
}

fn describe_settings(settings: &Settings) -> String {
    let show = |v: Option<u64>| v.map(|id| id.to_string()).unwrap_or_else(|| "(not set)".to_string());
    let token = if settings.discord.bot_token.is_some() {
        "(set)"
    } else {
        "(not set)"
    };
    let languages = settings
        .language
        .directory
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "(built-in)".to_string());
    let log_dir = settings
        .logging
        .directory
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "(data dir)".to_string());

    format!(
        "Discord:\n  token: {}\n  guild: {}\n  category: {}\nLanguage: {} from {}\nLogs: {}\nRequest timeout: {}s",
        token,
        show(settings.discord.guild_id),
        show(settings.discord.category_id),
        settings.language.code,
        languages,
        log_dir,
        settings.request_timeout_secs
    )
}

fn cmd_tag(cmd: &TagCommand) -> Result<()> {
    match cmd {
        TagCommand::Encode { user_id } => {
            println!("{}", OwnershipTag::encode(UserId(*user_id)));
        }
        TagCommand::Decode { topic } => match OwnershipTag::decode(topic)? {
            Some(owner) => println!("Ticket owned by user {}", owner),
            None => println!("Not a ticket topic"),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_config_flag() {
        let cli = Commands::try_parse_from(["modmail", "start", "--config", "/tmp/s.json"]).unwrap();
        assert!(matches!(cli.command, Command::Start));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn parses_tag_subcommands() {
        let cli = Commands::try_parse_from(["modmail", "tag", "encode", "42"]).unwrap();
        assert!(matches!(cli.command, Command::Tag(TagCommand::Encode { user_id: 42 })));
        assert!(Commands::try_parse_from(["modmail", "tag", "encode", "abc"]).is_err());
    }

    #[test]
    fn token_is_never_printed() {
        let mut settings = Settings::default();
        settings.discord.bot_token = Some("s3cret".into());
        settings.discord.guild_id = Some(5);

        let text = describe_settings(&settings);
        assert!(!text.contains("s3cret"));
        assert!(text.contains("guild: 5"));
        assert!(text.contains("category: (not set)"));
        assert!(text.contains("Logs: (data dir)"));
    }

    #[test]
    fn decode_rejects_malformed_topic() {
        let cmd = TagCommand::Decode {
            topic: "User: nope".into(),
        };
        assert!(cmd_tag(&cmd).is_err());
    }
}
