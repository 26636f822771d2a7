//! Birthday Messenger CLI - find today's birthdays and send greeting cards.
//!
//! A command-line front end to the Birthday Messenger backend: log in,
//! upload student spreadsheets, look up birthdays for a date and send cards.

mod app;
mod commands;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use birthday_messenger_core::models::AcademicYear;
use birthday_messenger_core::Config;

use app::App;
use commands::ThemeAction;

/// Prefix of the daily rolling log files in the cache directory
const LOG_FILE_PREFIX: &str = "birthday-messenger.log";

#[derive(Debug, Parser)]
#[command(name = "birthday-messenger", version, about = "Find birthdays and send greeting cards")]
struct Cli {
    /// Backend base URL (overrides config and BIRTHDAY_MESSENGER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open an http(s) link in the system browser
    Open { url: String },

    #[command(flatten)]
    Client(ClientCommand),
}

/// Commands that work against client storage and the backend
#[derive(Debug, Subcommand)]
enum ClientCommand {
    /// Log in and cache the session
    Login {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Revoke the session and forget it locally
    Logout,
    /// Show session and theme status
    Status,
    /// Find birthdays on a date (YYYY-MM-DD or MM-DD)
    Birthdays {
        date: String,
        /// Send a card to everyone found
        #[arg(long)]
        send: bool,
    },
    /// Upload a student spreadsheet (.xlsx) for a year
    Upload { year: AcademicYear, file: PathBuf },
    /// List uploaded spreadsheets
    Files,
    /// Delete one uploaded spreadsheet
    Delete { name: String },
    /// Delete every uploaded spreadsheet
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Consolidate uploaded spreadsheets into the CSV master list
    Convert,
    /// Change the account password
    ChangePassword,
    /// Show or change the theme
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },
    /// List installers, newest first
    Downloads {
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    config.apply_env_overrides();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    match cli.command {
        Command::Open { url } => commands::open_external(&url),
        Command::Client(command) => {
            let mut app = App::new(config)?;
            dispatch(&mut app, command).await
        }
    }
}

async fn dispatch(app: &mut App, command: ClientCommand) -> Result<()> {
    match command {
        ClientCommand::Login { user } => commands::login(app, user).await,
        ClientCommand::Logout => commands::logout(app).await,
        ClientCommand::Status => commands::status(app),
        ClientCommand::Birthdays { date, send } => commands::birthdays(app, &date, send).await,
        ClientCommand::Upload { year, file } => commands::upload(app, year, &file).await,
        ClientCommand::Files => commands::files(app).await,
        ClientCommand::Delete { name } => commands::delete(app, &name).await,
        ClientCommand::DeleteAll { yes } => commands::delete_all(app, yes).await,
        ClientCommand::Convert => commands::convert(app).await,
        ClientCommand::ChangePassword => commands::change_password(app).await,
        ClientCommand::Theme { action } => commands::theme(app, action),
        ClientCommand::Downloads { manifest } => commands::downloads(app, manifest),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}; using defaults", e);
            Config::default()
        }
    };

    let guard = init_tracing(config.cache_dir().ok().as_deref());
    info!("Birthday Messenger CLI starting");

    let result = run(cli, config).await;

    info!("Birthday Messenger CLI shutting down");
    drop(guard);

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
