//! looprig CLI - offline host for the looper pedal.

mod commands;
mod script;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "looprig")]
#[command(author, version, about = "Looper pedal rig host", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through a rig, with an optional control script
    Render(commands::render::RenderArgs),

    /// List available modules and their parameters
    Modules(commands::modules::ModulesArgs),

    /// Show, check or create rig files
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Modules(args) => commands::modules::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
