//! # livepad
//!
//! Terminal client for livepad collaborative editing sessions.
//!
//! ## Commands
//!
//! - `join`: Join a session and edit it line by line
//! - `create`: Create a new session and print its share link
//! - `config`: Show the effective configuration (`--save` writes it out)
//!
//! ## Example
//!
//! ```bash
//! # Create a session and share the link
//! livepad create
//!
//! # Join it from another terminal
//! livepad join --session k3x9 --name ada
//!
//! # Try the interactive loop without a server
//! livepad --mock join
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use livepad_types::SessionId;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

mod commands;
mod config;

use commands::{create, join, show_config};
use config::CliConfig;

/// Terminal client for livepad collaborative editing sessions.
#[derive(Parser, Debug)]
#[command(name = "livepad")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// WebSocket base URL, overriding the config file
    #[arg(long, global = true)]
    ws_base: Option<String>,

    /// HTTP base URL, overriding the config file
    #[arg(long, global = true)]
    http_base: Option<String>,

    /// Use an in-process mock server instead of the network (for demo)
    #[arg(long, global = true)]
    mock: bool,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join a session and edit it interactively
    Join {
        /// Session to join (omit for the shared default session)
        #[arg(long, short)]
        session: Option<String>,

        /// Display name to announce
        #[arg(long, short)]
        name: Option<String>,
    },

    /// Create a new session and print its share link
    Create,

    /// Show the effective configuration
    Config {
        /// Write the effective settings (flags included) to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config_path = match cli.config {
        Some(path) => path,
        None => CliConfig::default_path()?,
    };
    let mut settings = CliConfig::load(&config_path).await?;
    if let Some(ws_base) = cli.ws_base {
        settings.ws_base = ws_base;
    }
    if let Some(http_base) = cli.http_base {
        settings.http_base = http_base;
    }

    match cli.command {
        Commands::Join { session, name } => {
            let mut config = settings.client_config();
            if let Some(session) = session {
                config = config.with_session(SessionId::new(session));
            }
            if let Some(name) = name {
                config = config.with_display_name(&name);
            }
            join::run(config, cli.mock).await?;
        }
        Commands::Create => {
            create::run(settings.client_config(), cli.mock).await?;
        }
        Commands::Config { save } => {
            show_config::run(&config_path, &settings, save).await?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays the document view.
fn init_logging(debug: bool) {
    let default_directive = if debug {
        "livepad_client=debug,livepad_cli=debug,info"
    } else {
        "livepad_client=info,livepad_cli=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
