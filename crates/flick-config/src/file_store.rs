//! TOML file backend for [`SettingsStore`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{ConfigError, Settings, SettingsStore};

/// Just enough of a stored record to tell which layout wrote it.
#[derive(Deserialize)]
struct VersionHeader {
    version: Option<u32>,
}

/// Settings record kept as a TOML file.
///
/// A file that does not parse loads as `Settings::foreign(0)`, which
/// [`load_or_default`](crate::load_or_default) replaces with the defaults.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash mid-write leaves the previous record intact.
///
/// # Example
///
/// ```rust,no_run
/// use flick_config::{TomlFileStore, load_or_default, paths};
///
/// let mut store = TomlFileStore::new(paths::settings_path());
/// let settings = load_or_default(&mut store)?;
/// println!("delay bypassed: {}", settings.bypass.delay);
/// # Ok::<(), flick_config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    /// Store backed by the file at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn default_location() -> Self {
        Self::new(crate::paths::settings_path())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses a record from TOML text.
    ///
    /// A record whose version differs from this build comes back as the
    /// defaults carrying the foreign version number, whatever its other
    /// fields look like.
    pub fn parse(text: &str) -> Result<Settings, ConfigError> {
        let header: VersionHeader = toml::from_str(text)?;
        match header.version {
            Some(v) if v == crate::SETTINGS_VERSION => Ok(toml::from_str(text)?),
            other => Ok(Settings::foreign(other.unwrap_or(0))),
        }
    }

    /// Serializes a record to TOML text.
    pub fn to_toml(settings: &Settings) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(settings)?)
    }
}

impl SettingsStore for TomlFileStore {
    type Error = ConfigError;

    fn load(&mut self) -> Result<Option<Settings>, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::read_file(&self.path, e)),
        };
        match Self::parse(&text) {
            Ok(settings) => Ok(Some(settings)),
            // An unreadable record is replaced like a foreign one, so the
            // pedal still boots.
            #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
            Err(ConfigError::TomlParse(err)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %self.path.display(), %err, "settings file unreadable");
                Ok(Some(Settings::foreign(0)))
            }
            Err(err) => Err(err),
        }
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::create_dir(parent, e))?;
            }
        }

        let content = Self::to_toml(settings)?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| ConfigError::write_file(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ConfigError::write_file(&self.path, e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %self.path.display(), "settings written");
        Ok(())
    }
}
