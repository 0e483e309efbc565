//! PayTrack CLI - Lock screen, projects and settings from the terminal
//!
//! Works against the same stores as the dashboard: a JSON file under the
//! data directory for long-lived state and a session file that only lives as
//! long as the unlock.

mod commands;
mod terminal;
mod unlock;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use paytrack_core::{AppConfig, ProjectKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "paytrack")]
#[command(about = "PIN-protected personal finance tracker", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PAYTRACK_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unlock with your PIN (or create one on first run)
    Unlock,

    /// End the unlocked session
    Lock,

    /// Show lock and session state
    Status,

    /// Project management commands
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// Settings commands
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List all projects
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Find projects by name
    Search {
        term: String,
    },

    /// Create a project and open it
    Create {
        name: String,

        /// Project type: expense or installment
        #[arg(short, long, default_value = "expense")]
        kind: ProjectKind,
    },

    /// Rename a project
    Rename {
        id: i64,
        name: String,
    },

    /// Delete a project (asks for the PIN)
    Delete {
        id: i64,

        /// PIN; prompted for when omitted
        #[arg(long)]
        pin: Option<String>,
    },

    /// Open a project in the tracker
    Open {
        id: i64,
    },

    /// Show whether the installment reminder is due today
    Reminder,

    /// Hide today's installment reminder
    DismissReminder,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,

    /// Select a preset theme, `default`, or a saved theme id
    Theme {
        name: String,
    },

    /// Apply a custom color theme
    CustomTheme(CustomThemeArgs),

    /// Save the current custom theme under a name
    SaveTheme {
        name: String,
    },

    /// Delete a saved theme
    DeleteTheme {
        id: String,
    },

    /// Change the unlock PIN (prompts for the PINs)
    ChangePin,

    /// Configure the monthly installment reminder
    Reminder {
        /// Turn the reminder off
        #[arg(long)]
        off: bool,

        /// Day of month, 1-28
        #[arg(short, long, default_value_t = 1)]
        day: u32,
    },

    /// Set the display currency
    Currency {
        /// ISO code, e.g. EUR
        code: String,

        /// Symbol override
        #[arg(long)]
        symbol: Option<String>,
    },

    /// Set the interface language
    Language {
        code: String,
    },

    /// Enable or disable biometric unlock
    Biometric {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
}

#[derive(Args)]
pub struct CustomThemeArgs {
    /// Start color, hex with or without `#`
    pub color1: String,

    /// End color; makes the theme a gradient
    #[arg(long)]
    pub gradient: Option<String>,

    /// Gradient direction
    #[arg(long, default_value = "135deg")]
    pub direction: String,
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load_from(&path)?),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paytrack=info,paytrack_core=info,paytrack_gate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let stores = config.open_stores()?;

    match cli.command {
        Commands::Unlock => unlock::run(stores, &config).await,
        Commands::Lock => commands::lock(&stores),
        Commands::Status => commands::status(&stores),
        Commands::Projects(cmd) => commands::handle_projects(cmd, &stores, &config),
        Commands::Settings(cmd) => commands::handle_settings(cmd, &stores, &config),
    }
}
