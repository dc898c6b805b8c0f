//! Rolecast CLI: the main entry point.
//!
//! Commands:
//! - `onboard`   Initialize config and storage
//! - `status`    Show configuration and storage status
//! - `roles`     Create, edit, list, import and export roles
//! - `format`    Print the prompt text for a role
//! - `detect`    Classify a hostname against the supported platforms
//! - `simulate`  Run the injection engine against a simulated chat page

use clap::{Args, Parser, Subcommand};
use rolecast_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "rolecast",
    about = "Rolecast: reusable role prompts for AI chat pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and storage
    Onboard,

    /// Show configuration and storage status
    Status,

    /// Manage saved roles
    Roles {
        #[command(subcommand)]
        action: RolesAction,
    },

    /// Print the prompt text a role would inject
    Format {
        /// Role ID
        id: String,
    },

    /// Show which chat platform a hostname belongs to
    Detect {
        /// Hostname or URL
        host: String,
    },

    /// Run the injection engine against a simulated chat page
    Simulate {
        /// Page URL, e.g. https://chatgpt.com/
        #[arg(long)]
        url: String,

        /// ID of the role to inject
        #[arg(long)]
        role: String,

        /// Text already typed into the input
        #[arg(long)]
        existing: Option<String>,

        /// Delay before the input element appears
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

#[derive(Subcommand)]
pub enum RolesAction {
    /// List saved roles
    List {
        /// Group by area the way the selector menu does
        #[arg(long)]
        grouped: bool,
    },

    /// Show one role in full
    Show { id: String },

    /// Create a role
    Add(RoleFields),

    /// Edit a role; only the given fields change
    Edit {
        id: String,

        #[command(flatten)]
        fields: RoleFields,
    },

    /// Delete a role
    Delete { id: String },

    /// Write all roles as JSON (stdout when no file is given)
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all roles with the contents of a JSON export
    Import { file: PathBuf },
}

#[derive(Args, Default)]
pub struct RoleFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub area: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Repeatable
    #[arg(long = "skill")]
    pub skills: Vec<String>,

    /// Repeatable
    #[arg(long = "tool")]
    pub tools: Vec<String>,

    /// Repeatable
    #[arg(long = "constraint")]
    pub constraints: Vec<String>,

    #[arg(long)]
    pub behavior: Option<String>,

    #[arg(long)]
    pub more_info: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config problems are reported by the command itself
    let logging = AppConfig::load().map(|c| c.logging).unwrap_or_default();
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        logging.level
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Roles { action } => commands::roles::run(action).await?,
        Commands::Format { id } => commands::format::run(&id).await?,
        Commands::Detect { host } => commands::detect::run(&host)?,
        Commands::Simulate {
            url,
            role,
            existing,
            delay_ms,
        } => commands::simulate::run(&url, &role, existing.as_deref(), delay_ms).await?,
    }

    Ok(())
}
