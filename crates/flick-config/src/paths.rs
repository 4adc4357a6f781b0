//! Platform-specific location of the settings file.
//!
//! - Linux: `~/.config/flick/settings.toml`
//! - macOS: `~/Library/Application Support/flick/settings.toml`
//! - Windows: `%APPDATA%\flick\settings.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use flick_config::paths;
//!
//! println!("settings live at {}", paths::settings_path().display());
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "flick";

/// File name of the settings record.
const SETTINGS_FILE: &str = "settings.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform directory cannot be
/// determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default settings file path.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_is_inside_config_dir() {
        let path = settings_path();
        assert!(path.starts_with(user_config_dir()));
        assert!(path.ends_with("flick/settings.toml"));
    }
}
