//! Settings record commands.
//!
//! Shows, resets, or locates the TOML file the pedal persists its
//! settings record to.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use flick_config::{Settings, SettingsStore, TomlFileStore, paths};

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the stored settings record as TOML
    Show {
        /// Settings file (defaults to the platform location)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Overwrite the stored record with the factory defaults
    Reset {
        /// Settings file (defaults to the platform location)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the settings file location
    Path {
        /// Settings file (defaults to the platform location)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

pub fn run(args: SettingsArgs) -> anyhow::Result<()> {
    match args.command {
        SettingsCommand::Show { file } => show(&resolve(file)),
        SettingsCommand::Reset { file } => reset(&resolve(file)),
        SettingsCommand::Path { file } => {
            println!("{}", resolve(file).display());
            Ok(())
        }
    }
}

fn resolve(file: Option<PathBuf>) -> PathBuf {
    file.unwrap_or_else(paths::settings_path)
}

fn show(path: &Path) -> anyhow::Result<()> {
    let mut store = TomlFileStore::new(path);
    let settings = match store
        .load()
        .with_context(|| format!("loading settings from {}", path.display()))?
    {
        Some(settings) if settings.is_current() => settings,
        Some(settings) if settings.version == 0 => {
            println!(
                "# {} is unreadable or unversioned; the pedal will use these defaults",
                path.display()
            );
            Settings::default()
        }
        Some(settings) => {
            println!(
                "# {} holds layout version {}; the pedal will use these defaults",
                path.display(),
                settings.version
            );
            Settings::default()
        }
        None => {
            println!("# no settings file at {}; showing defaults", path.display());
            Settings::default()
        }
    };
    print!("{}", TomlFileStore::to_toml(&settings)?);
    Ok(())
}

fn reset(path: &Path) -> anyhow::Result<()> {
    let mut store = TomlFileStore::new(path);
    store
        .save(&Settings::default())
        .with_context(|| format!("writing settings to {}", path.display()))?;
    tracing::info!(path = %path.display(), "settings reset to defaults");
    println!("Reset {} to factory defaults", path.display());
    Ok(())
}
