//! Flick Config - the pedal's persisted settings
//!
//! - [`Settings`] - the versioned record and its enums
//! - [`SettingsStore`] - blocking load/save contract, with [`MemoryStore`]
//!   for tests and hosts
//! - [`load_or_default`] - boot-time load with reset-to-defaults on any
//!   version mismatch
//!
//! With the default `std` feature the crate also provides [`TomlFileStore`],
//! a TOML file in the platform configuration directory ([`paths`]), and the
//! [`ConfigError`] type it reports.
//!
//! # Example
//!
//! ```rust
//! use flick_config::{MemoryStore, Settings, load_or_default};
//!
//! let mut store = MemoryStore::new();
//! let Ok(settings) = load_or_default(&mut store);
//! assert_eq!(settings, Settings::default());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod settings;
pub mod store;

#[cfg(feature = "std")]
pub mod error;
#[cfg(feature = "std")]
pub mod file_store;
#[cfg(feature = "std")]
pub mod paths;

pub use settings::{
    BypassState, Polarity, ReverbKnobMode, ReverbSettings, RoutingMode, SETTINGS_VERSION,
    Settings,
};
pub use store::{MemoryStore, SettingsStore, load_or_default};

#[cfg(feature = "std")]
pub use error::ConfigError;
#[cfg(feature = "std")]
pub use file_store::TomlFileStore;
