use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use stockpulse::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Path to a dotenv file with provider API keys (defaults to ./.env)
    #[arg(short, long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for stockpulse::AppCommand {
    fn from(cmd: Commands) -> stockpulse::AppCommand {
        match cmd {
            Commands::Quote { symbol, json } => stockpulse::AppCommand::Quote { symbol, json },
            Commands::Invoke { event, publish } => {
                stockpulse::AppCommand::Invoke { event, publish }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch quotes for a symbol from every configured provider
    Quote {
        /// Ticker symbol; the configured default is used when omitted
        symbol: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Handle a trigger event and print the response
    Invoke {
        /// Event JSON file, `-` or omitted for stdin
        #[arg(long)]
        event: Option<PathBuf>,
        /// Publish the result to the configured queue
        #[arg(long)]
        publish: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stockpulse::cli::setup::setup(),
        Some(cmd) => {
            stockpulse::run_command(
                cmd.into(),
                cli.config_path.as_deref(),
                cli.env_file.as_deref(),
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
