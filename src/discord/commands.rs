//! Slash commands: `/reply`, `/close` and `/ping`.

use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::http::Http;
use serenity::model::id as sid;

use crate::tickets::content::colors;
use crate::tickets::MessageRelay;

use super::api::{ChannelId, Embed, GuildId};
use super::client::{build_embed, user_identity};

pub const REPLY: &str = "reply";
pub const CLOSE: &str = "close";
pub const PING: &str = "ping";

/// String option carrying the body of `/reply`.
pub const MESSAGE_OPTION: &str = "message";

/// A slash command invocation, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand<'a> {
    Reply { message: &'a str },
    Close,
    Ping,
    Unknown(&'a str),
}

impl<'a> SlashCommand<'a> {
    pub fn parse(name: &'a str, message: Option<&'a str>) -> Self {
        match name {
            REPLY => SlashCommand::Reply {
                message: message.unwrap_or(""),
            },
            CLOSE => SlashCommand::Close,
            PING => SlashCommand::Ping,
            other => SlashCommand::Unknown(other),
        }
    }
}

fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(REPLY)
            .description("Reply to a ModMail ticket!")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    MESSAGE_OPTION,
                    "The message to send to the user",
                )
                .required(true),
            ),
        CreateCommand::new(CLOSE).description("Close a ModMail ticket"),
        CreateCommand::new(PING).description("Ping!"),
    ]
}

/// Overwrite the guild's slash commands with ours.
pub async fn register(http: &Http, guild: GuildId) {
    match sid::GuildId::new(guild.get())
        .set_commands(http, definitions())
        .await
    {
        Ok(commands) => tracing::info!("Registered {} commands", commands.len()),
        Err(e) => tracing::error!("Failed to register slash commands: {}", e),
    }
}

pub fn ping_embed() -> Embed {
    Embed {
        description: Some("Pong! 🏓".to_string()),
        color: Some(colors::PING),
        ..Embed::default()
    }
}

/// Run a slash command and answer it ephemerally.
pub async fn dispatch(ctx: &Context, relay: &MessageRelay, command: &CommandInteraction) {
    let message = command
        .data
        .options
        .iter()
        .find(|o| o.name == MESSAGE_OPTION)
        .and_then(|o| o.value.as_str());

    let staff = user_identity(&command.user);
    let channel = ChannelId(command.channel_id.get());

    let parsed = SlashCommand::parse(&command.data.name, message);
    tracing::debug!("Slash command {:?} from {} in {}", parsed, staff.id, channel);

    if parsed == SlashCommand::Ping {
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().embed(build_embed(ping_embed())),
        );
        if let Err(e) = command.create_response(&ctx.http, response).await {
            tracing::warn!("Failed to answer ping: {}", e);
        }
        return;
    }

    // Ticket commands make several Discord calls; acknowledge first so the
    // interaction does not expire while they run.
    if let Err(e) = command.defer_ephemeral(&ctx.http).await {
        tracing::warn!("Failed to defer /{}: {}", command.data.name, e);
        return;
    }

    let text = match parsed {
        SlashCommand::Reply { message } => relay.handle_staff_reply(&staff, channel, message).await,
        SlashCommand::Close => relay.handle_close_request(&staff, channel).await,
        SlashCommand::Unknown(name) => {
            tracing::warn!("Unknown slash command /{}", name);
            relay.strings().general.errors.generic.message.clone()
        }
        SlashCommand::Ping => return,
    };

    // After /close the channel is gone and this edit usually fails.
    if let Err(e) = command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(text))
        .await
    {
        tracing::debug!("Could not edit response for /{}: {}", command.data.name, e);
    }
}
