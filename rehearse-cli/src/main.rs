use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "rehearse",
    about = "Play case simulations against the rehearse agent"
)]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the case store
    Cases(commands::cases::CasesArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Review finished sessions
    History(commands::history::HistoryArgs),
    /// Play a case from the terminal
    Play(commands::play::PlayArgs),
    /// Run the case and history store server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::ConfigLoader::load()?;

    match cli.command {
        Commands::Cases(args) => commands::cases::run(args, &config).await,
        Commands::Config(args) => commands::config::run(args, &config),
        Commands::History(args) => commands::history::run(args, &config).await,
        Commands::Play(args) => commands::play::run(args, &config).await,
        Commands::Serve(args) => commands::serve::run(args, &config).await,
    }
}
