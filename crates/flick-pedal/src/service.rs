//! The cooperative service loop.
//!
//! Everything slow happens here, never in the audio context: writing the
//! settings record, the bootloader hand-off and the factory reset sequence.
//! The loop is polled every few milliseconds and never blocks; sequences
//! that the firmware would sleep through are stepped against the clock.
//!
//! Per poll, in priority order:
//!
//! 1. a pending settings write
//! 2. the bootloader sequence, once requested
//! 3. the factory reset sequence, when armed at boot

use flick_config::{Settings, SettingsStore, load_or_default};
use flick_platform::{Footswitch, Led, PedalHardware};

use crate::factory_reset::{FactoryReset, FactoryResetStep};
use crate::{CommitFlags, PedalConfig};

/// LED phases shown before the bootloader takes over.
pub const BOOTLOADER_PHASES: u32 = 6;
/// Length of each bootloader LED phase.
pub const BOOTLOADER_PHASE_MS: u32 = 100;

/// What one poll did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServiceEvent {
    /// Nothing to do.
    Idle,
    /// The committed record was written.
    SettingsWritten,
    /// The bootloader sequence is running; audio must stay stopped.
    BootloaderSequence,
    /// The bootloader was requested from the hardware.
    BootloaderEntered,
    /// The factory reset sequence is waiting on the user.
    FactoryResetPending,
    /// The factory reset was left without changes; start audio.
    FactoryResetCancelled,
    /// Defaults were restored and written; load them and start audio.
    FactoryResetComplete(Settings),
}

#[derive(Debug, Clone)]
enum State {
    Running,
    FactoryReset(FactoryReset),
    Bootloader { started_ms: u32, entered: bool },
}

/// Non-real-time half of the pedal.
#[derive(Debug, Clone)]
pub struct ServiceLoop {
    state: State,
}

impl ServiceLoop {
    /// Boots the pedal: loads the settings (writing defaults over a missing
    /// or foreign record) and arms the factory reset when footswitch B is
    /// held.
    ///
    /// Returns the loop and the settings the audio engine should start from.
    pub fn boot<H, S>(
        _config: &PedalConfig,
        hw: &mut H,
        store: &mut S,
    ) -> Result<(Self, Settings), S::Error>
    where
        H: PedalHardware + ?Sized,
        S: SettingsStore,
    {
        let settings = load_or_default(store)?;
        hw.poll();
        let state = if hw.footswitch_pressed(Footswitch::B) {
            #[cfg(feature = "tracing")]
            tracing::info!("footswitch B held at boot, entering factory reset");
            State::FactoryReset(FactoryReset::new(hw.now_ms()))
        } else {
            State::Running
        };
        Ok((Self { state }, settings))
    }

    /// Loop in the running state, for hosts that load settings themselves.
    pub fn running() -> Self {
        Self {
            state: State::Running,
        }
    }

    /// False while audio must not run: during the factory reset sequence and
    /// once the bootloader sequence has started.
    pub fn audio_enabled(&self) -> bool {
        matches!(self.state, State::Running)
    }

    /// True while the factory reset sequence is active.
    pub fn in_factory_reset(&self) -> bool {
        matches!(self.state, State::FactoryReset(_))
    }

    /// One iteration.
    ///
    /// `record` is the committed settings record the audio side maintains.
    /// A failed write leaves the request pending so the next poll retries.
    pub fn poll<H, S>(
        &mut self,
        flags: &CommitFlags,
        record: &Settings,
        hw: &mut H,
        store: &mut S,
    ) -> Result<ServiceEvent, S::Error>
    where
        H: PedalHardware + ?Sized,
        S: SettingsStore,
    {
        if flags.take_save() {
            if let Err(err) = store.save(record) {
                flags.request_save();
                return Err(err);
            }
            #[cfg(feature = "tracing")]
            tracing::debug!("settings written");
            return Ok(ServiceEvent::SettingsWritten);
        }

        if flags.take_bootloader() && !matches!(self.state, State::Bootloader { .. }) {
            #[cfg(feature = "tracing")]
            tracing::info!("starting bootloader sequence");
            self.state = State::Bootloader {
                started_ms: hw.now_ms(),
                entered: false,
            };
        }

        match &mut self.state {
            State::Running => Ok(ServiceEvent::Idle),
            State::Bootloader {
                started_ms,
                entered,
            } => {
                if *entered {
                    return Ok(ServiceEvent::BootloaderEntered);
                }
                let phase = hw.now_ms().wrapping_sub(*started_ms) / BOOTLOADER_PHASE_MS;
                if phase < BOOTLOADER_PHASES {
                    let left = phase % 2 == 0;
                    hw.set_led(Led::Left, if left { 1.0 } else { 0.0 });
                    hw.set_led(Led::Right, if left { 0.0 } else { 1.0 });
                    hw.update_leds();
                    return Ok(ServiceEvent::BootloaderSequence);
                }
                *entered = true;
                hw.request_bootloader();
                Ok(ServiceEvent::BootloaderEntered)
            }
            State::FactoryReset(reset) => match reset.step(hw) {
                FactoryResetStep::Pending => Ok(ServiceEvent::FactoryResetPending),
                FactoryResetStep::Cancelled => {
                    self.state = State::Running;
                    Ok(ServiceEvent::FactoryResetCancelled)
                }
                FactoryResetStep::Confirmed => {
                    let defaults = Settings::default();
                    store.save(&defaults)?;
                    self.state = State::Running;
                    Ok(ServiceEvent::FactoryResetComplete(defaults))
                }
            },
        }
    }
}
