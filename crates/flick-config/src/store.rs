//! Persistence contract.
//!
//! A [`SettingsStore`] is a blocking load/save pair. It is only ever called
//! from the cooperative service loop, never from the audio callback.

use core::convert::Infallible;

use crate::{SETTINGS_VERSION, Settings};

/// Durable storage for the settings record.
pub trait SettingsStore {
    /// Storage failure.
    type Error;

    /// Reads the stored record, or `None` when nothing has been stored yet.
    ///
    /// A record written by another layout version may come back with only
    /// its `version` field meaningful.
    fn load(&mut self) -> Result<Option<Settings>, Self::Error>;

    /// Writes the record.
    fn save(&mut self, settings: &Settings) -> Result<(), Self::Error>;
}

/// Loads the stored record, falling back to defaults.
///
/// An absent record and a record of any other version are treated alike:
/// the defaults are written back and returned. There is no migration.
pub fn load_or_default<S: SettingsStore>(store: &mut S) -> Result<Settings, S::Error> {
    match store.load()? {
        Some(settings) if settings.is_current() => Ok(settings),
        stored => {
            log_reset(stored.as_ref());
            let defaults = Settings::default();
            debug_assert_eq!(defaults.version, SETTINGS_VERSION);
            store.save(&defaults)?;
            Ok(defaults)
        }
    }
}

#[cfg(feature = "tracing")]
fn log_reset(stored: Option<&Settings>) {
    match stored {
        Some(s) => tracing::info!(
            found = s.version,
            expected = SETTINGS_VERSION,
            "settings version mismatch, restoring defaults"
        ),
        None => tracing::info!("no stored settings, writing defaults"),
    }
}

#[cfg(not(feature = "tracing"))]
fn log_reset(_stored: Option<&Settings>) {}

/// Store that keeps the record in memory.
///
/// Stands in for flash on hosts without a settings file and in tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    record: Option<Settings>,
    saves: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `settings`.
    pub fn with_record(settings: Settings) -> Self {
        Self {
            record: Some(settings),
            saves: 0,
        }
    }

    /// Current record.
    pub fn record(&self) -> Option<&Settings> {
        self.record.as_ref()
    }

    /// Number of completed saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemoryStore {
    type Error = Infallible;

    fn load(&mut self) -> Result<Option<Settings>, Infallible> {
        Ok(self.record)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), Infallible> {
        self.record = Some(*settings);
        self.saves += 1;
        Ok(())
    }
}
