//! Acorde CLI - command-line interface for the acorde synthesizer.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "acorde")]
#[command(author, version, about = "Acorde polyphonic synthesizer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play notes live on an output device
    Play(commands::play::PlayArgs),

    /// Render notes to a WAV file
    Render(commands::render::RenderArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
