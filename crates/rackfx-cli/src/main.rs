//! rackfx CLI - build, inspect, and render saved effect chains.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rackfx")]
#[command(author, version, about = "rackfx effect chain CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available effects and their parameters
    Effects(commands::effects::EffectsArgs),

    /// Build a chain from effect names and save it
    Create(commands::create::CreateArgs),

    /// Validate a saved chain and show its processors
    Inspect(commands::inspect::InspectArgs),

    /// Render a test tone offline through a saved chain
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Create(args) => commands::create::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
