//! ModMail - Discord ModMail bot.
//!
//! Users DM the bot; each conversation becomes a ticket channel in the staff
//! guild, and staff answer with `/reply` and `/close`.

use clap::Parser;
use std::process::ExitCode;

use modmail::{load_settings, logging, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Commands::parse();

    // Settings decide where logs go, so they load before the subscriber.
    let settings = match load_settings(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&settings.logging) {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
