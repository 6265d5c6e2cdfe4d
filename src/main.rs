use anyhow::Result;
use clap::{Parser, Subcommand};
use emasbot::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for emasbot::AppCommand {
    fn from(cmd: Commands) -> emasbot::AppCommand {
        match cmd {
            Commands::Serve => emasbot::AppCommand::Serve,
            Commands::Price => emasbot::AppCommand::Price,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the WhatsApp webhook server (default)
    Serve,
    /// Print the current gold price report
    Price,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine, the environment may be set directly
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let result = match cli.command {
        Some(Commands::Setup) => emasbot::cli::setup::setup(),
        Some(cmd) => emasbot::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => emasbot::run_command(emasbot::AppCommand::Serve, cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
