//! Flick Pedal - the controller and audio-block driver
//!
//! This crate turns the effects, the hardware abstraction and the settings
//! record into a working pedal.
//!
//! # Audio Context
//!
//! - [`PedalEngine`] - called once per audio block: gestures, mode logic,
//!   LEDs, parameter updates and the fixed signal path
//! - [`ModeController`] - the four-mode state machine and the whole control
//!   context (bypass, parameter mirror, soft takeover, tap tempo)
//! - [`TapTempo`] - tap history and the delay derived from it
//! - [`Indicators`] - LED behavior per mode
//!
//! # Service Context
//!
//! - [`ServiceLoop`] - settings writes, the bootloader hand-off and the
//!   factory reset, polled cooperatively
//! - [`CommitFlags`] - the only state the two contexts share
//!
//! # Hosts
//!
//! With the default `std` feature, [`HostRig`] runs engine and service loop
//! together against a [`VirtualPedal`](flick_platform::VirtualPedal).
//!
//! ```rust
//! use flick_config::MemoryStore;
//! use flick_pedal::{HostRig, PedalConfig};
//! use flick_platform::VirtualPedal;
//!
//! let Ok(mut rig) = HostRig::boot(PedalConfig::default(), VirtualPedal::new(), MemoryStore::new());
//! let Ok(()) = rig.idle_ms(100);
//! assert!(rig.service().audio_enabled());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod commit;
pub mod config;
pub mod controls;
pub mod engine;
pub mod factory_reset;
pub mod leds;
pub mod mode;
pub mod service;
pub mod tap_tempo;

#[cfg(feature = "std")]
pub mod host;

pub use commit::CommitFlags;
pub use config::PedalConfig;
pub use controls::{ControlSnapshot, DelayTiming, KnobScale, PlateParameters};
pub use engine::PedalEngine;
pub use factory_reset::{FactoryReset, FactoryResetStep};
pub use leds::{IndicatorInput, Indicators};
pub use mode::{ChainParams, ControlAction, Mode, ModeController};
pub use service::{ServiceEvent, ServiceLoop};
pub use tap_tempo::TapTempo;

#[cfg(feature = "std")]
pub use host::HostRig;
