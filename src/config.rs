//! Configuration loading for ModMail.
//!
//! Settings come from `~/.modmail/settings.json` (optional) with environment
//! variables layered on top, then get validated into a [`DiscordConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::discord::api::{ChannelId, GuildId};
use crate::error::{Error, Result};

pub const ENV_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_GUILD_ID: &str = "DISCORD_GUILD_ID";
pub const ENV_CATEGORY_ID: &str = "DISCORD_CATEGORY_ID";
pub const ENV_LANGUAGE: &str = "BOT_LANGUAGE";
pub const ENV_LANGUAGES_DIR: &str = "MODMAIL_LANGUAGES_DIR";
pub const ENV_LOG_DIR: &str = "MODMAIL_LOG_DIR";

/// Get the ModMail home directory (~/.modmail).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".modmail"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from the given file, or from ~/.modmail/settings.json.
///
/// A missing file is not an error: the bot can be configured purely from
/// the environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with<F>(path: Option<&Path>, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_settings_path()?,
    };

    let mut settings = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        Settings::default()
    };

    apply_env_overrides(&mut settings, lookup)?;
    Ok(settings)
}

/// Layer environment variables over file settings. `lookup` is injected so
/// tests don't have to mutate the process environment.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty(ENV_TOKEN) {
        settings.discord.bot_token = Some(token);
    }
    if let Some(raw) = non_empty(ENV_GUILD_ID) {
        settings.discord.guild_id = Some(parse_id(ENV_GUILD_ID, &raw)?);
    }
    if let Some(raw) = non_empty(ENV_CATEGORY_ID) {
        settings.discord.category_id = Some(parse_id(ENV_CATEGORY_ID, &raw)?);
    }
    if let Some(code) = non_empty(ENV_LANGUAGE) {
        settings.language.code = code;
    }
    if let Some(dir) = non_empty(ENV_LANGUAGES_DIR) {
        settings.language.directory = Some(PathBuf::from(dir));
    }
    if let Some(dir) = non_empty(ENV_LOG_DIR) {
        settings.logging.directory = Some(PathBuf::from(dir));
    }
    Ok(())
}

fn parse_id(key: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::Config(format!("invalid {}: {:?}", key, raw))),
        Ok(id) => Ok(id),
    }
}

/// Check that everything needed to connect is present.
pub fn validate_settings(settings: &Settings) -> Result<DiscordConfig> {
    let missing = |key: &str| Error::Config(format!("missing environment variable: {}", key));

    let token = settings
        .discord
        .bot_token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| missing(ENV_TOKEN))?;
    let guild_id = settings.discord.guild_id.ok_or_else(|| missing(ENV_GUILD_ID))?;
    let category_id = settings
        .discord
        .category_id
        .ok_or_else(|| missing(ENV_CATEGORY_ID))?;

    if settings.request_timeout_secs == 0 {
        return Err(Error::Config(
            "request_timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(DiscordConfig {
        token,
        guild_id: GuildId(guild_id),
        category_id: ChannelId(category_id),
        request_timeout: Duration::from_secs(settings.request_timeout_secs),
    })
}

/// Discord connection settings as stored on disk.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DiscordSettings {
    pub bot_token: Option<String>,
    pub guild_id: Option<u64>,
    /// Category under which ticket channels are created and searched.
    pub category_id: Option<u64>,
}

/// Language selection.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LanguageSettings {
    #[serde(default = "default_language_code")]
    pub code: String,
    /// Directory holding `<code>.json` translation files.
    pub directory: Option<PathBuf>,
}

fn default_language_code() -> String {
    crate::i18n::DEFAULT_LANGUAGE.to_string()
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            code: default_language_code(),
            directory: None,
        }
    }
}

/// Where and how much to log. `RUST_LOG` still wins over `filter`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LoggingSettings {
    /// Directory for the daily log files; the platform data dir when unset.
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directives, e.g. `"info,modmail=trace"`.
    pub filter: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// ModMail settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub discord: DiscordSettings,

    #[serde(default)]
    pub language: LanguageSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discord: DiscordSettings::default(),
            language: LanguageSettings::default(),
            logging: LoggingSettings::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Validated connection config handed to the daemon.
#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: GuildId,
    pub category_id: ChannelId,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("category_id", &self.category_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
