//! Factory reset confirmation.
//!
//! Holding footswitch B while the pedal powers up enters the reset sequence
//! instead of starting audio. The LEDs blink alternately. Sweeping knob 1 to
//! full, to zero, to full and back to zero confirms; each completed sweep
//! flashes both LEDs and speeds the blinking up. Pressing either footswitch
//! (once both have been released) leaves without touching the settings.

use flick_platform::{Footswitch, Knob, Led, PedalHardware};

/// Knob 1 at or above this counts as full.
pub const HIGH_KNOB: f32 = 0.95;
/// Knob 1 at or below this counts as zero.
pub const LOW_KNOB: f32 = 0.05;
/// Initial alternating blink interval.
pub const INITIAL_BLINK_MS: u32 = 1000;
/// Blink interval removed per completed stage.
pub const BLINK_STEP_MS: u32 = 300;
/// Length of the confirmation flash after each stage.
pub const STAGE_FLASH_MS: u32 = 500;

/// Outcome of one step of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryResetStep {
    /// Still waiting on the user.
    Pending,
    /// A footswitch was pressed; keep the stored settings.
    Cancelled,
    /// The full sweep was made; restore defaults.
    Confirmed,
}

/// State of the reset sequence.
#[derive(Debug, Clone)]
pub struct FactoryReset {
    stage: u8,
    blink_interval_ms: u32,
    last_toggle_ms: u32,
    led_toggle: bool,
    flash_until: Option<u32>,
    released: bool,
}

impl FactoryReset {
    /// Starts the sequence at `now_ms`.
    pub fn new(now_ms: u32) -> Self {
        Self {
            stage: 0,
            blink_interval_ms: INITIAL_BLINK_MS,
            last_toggle_ms: now_ms,
            led_toggle: false,
            flash_until: None,
            released: false,
        }
    }

    /// Completed sweeps, 0..=3.
    pub fn stage(&self) -> u8 {
        self.stage
    }

    /// Current blink interval.
    pub fn blink_interval_ms(&self) -> u32 {
        self.blink_interval_ms
    }

    /// Runs one service-loop step against the hardware.
    pub fn step<H: PedalHardware + ?Sized>(&mut self, hw: &mut H) -> FactoryResetStep {
        hw.poll();
        let now = hw.now_ms();

        let any_pressed = Footswitch::ALL.iter().any(|&f| hw.footswitch_pressed(f));
        if !any_pressed {
            self.released = true;
        } else if self.released {
            #[cfg(feature = "tracing")]
            tracing::info!("factory reset cancelled");
            return FactoryResetStep::Cancelled;
        }

        if let Some(until) = self.flash_until {
            if (until.wrapping_sub(now) as i32) > 0 {
                return FactoryResetStep::Pending;
            }
            self.flash_until = None;
        }

        if now.wrapping_sub(self.last_toggle_ms) >= self.blink_interval_ms {
            self.last_toggle_ms = now;
            self.led_toggle = !self.led_toggle;
            show(hw, self.led_toggle, !self.led_toggle);
        }

        let knob = hw.knob(Knob::K1);
        let reached = match self.stage {
            0 | 2 => knob >= HIGH_KNOB,
            _ => knob <= LOW_KNOB,
        };
        if !reached {
            return FactoryResetStep::Pending;
        }

        show(hw, true, true);
        if self.stage == 3 {
            #[cfg(feature = "tracing")]
            tracing::info!("factory reset confirmed");
            return FactoryResetStep::Confirmed;
        }

        self.stage += 1;
        self.blink_interval_ms = self.blink_interval_ms.saturating_sub(BLINK_STEP_MS);
        self.flash_until = Some(now.wrapping_add(STAGE_FLASH_MS));
        #[cfg(feature = "tracing")]
        tracing::info!(stage = self.stage, "factory reset stage complete");
        FactoryResetStep::Pending
    }
}

fn show<H: PedalHardware + ?Sized>(hw: &mut H, left: bool, right: bool) {
    hw.set_led(Led::Left, if left { 1.0 } else { 0.0 });
    hw.set_led(Led::Right, if right { 1.0 } else { 0.0 });
    hw.update_leds();
}
