//! Flick CLI - offline rendering and settings management for the flick pedal.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flick")]
#[command(author, version, about = "Flick pedal command-line tools", long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "flick_pedal=debug"); overrides RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a WAV file through the complete pedal
    Render(commands::render::RenderArgs),

    /// Inspect or reset the persisted pedal settings
    Settings(commands::settings::SettingsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.log.as_deref() {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Settings(args) => commands::settings::run(args),
    }
}
