//! In-memory pedal enclosure.
//!
//! [`VirtualPedal`] stands in for the device on a host: controls are set
//! directly, the clock is advanced by hand, and LED output and bootloader
//! requests are recorded for inspection. The offline renderer and every
//! scenario test drive the pedal through it.

use crate::{Clock, Footswitch, Knob, Led, PedalHardware, SwitchPosition, Toggle};

/// Software model of the enclosure.
///
/// # Example
///
/// ```rust
/// use flick_platform::{Clock, Knob, PedalHardware, VirtualPedal};
///
/// let mut hw = VirtualPedal::new();
/// hw.set_knob(Knob::K3, 0.75);
/// hw.advance_ms(10);
/// assert_eq!(hw.knob(Knob::K3), 0.75);
/// assert_eq!(hw.now_ms(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualPedal {
    knobs: [f32; 6],
    toggles: [SwitchPosition; 3],
    footswitches: [bool; 2],
    staged_leds: [f32; 2],
    leds: [f32; 2],
    now_ms: u32,
    bootloader_requests: u32,
}

impl VirtualPedal {
    /// Knobs at noon, toggles centered, footswitches released, clock at 0.
    pub fn new() -> Self {
        Self {
            knobs: [0.5; 6],
            toggles: [SwitchPosition::Middle; 3],
            footswitches: [false; 2],
            staged_leds: [0.0; 2],
            leds: [0.0; 2],
            now_ms: 0,
            bootloader_requests: 0,
        }
    }

    /// Sets a knob, clamped to [0, 1].
    pub fn set_knob(&mut self, knob: Knob, value: f32) {
        self.knobs[knob.index()] = value.clamp(0.0, 1.0);
    }

    /// Sets a toggle position.
    pub fn set_toggle(&mut self, toggle: Toggle, position: SwitchPosition) {
        self.toggles[toggle.index()] = position;
    }

    /// Presses or releases a footswitch.
    pub fn set_footswitch(&mut self, footswitch: Footswitch, pressed: bool) {
        self.footswitches[footswitch.index()] = pressed;
    }

    /// Moves the clock forward.
    pub fn advance_ms(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    /// Sets the clock.
    pub fn set_now_ms(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
    }

    /// Brightness last pushed by [`PedalHardware::update_leds`].
    pub fn led(&self, led: Led) -> f32 {
        self.leds[led.index()]
    }

    /// Number of bootloader requests received.
    pub fn bootloader_requests(&self) -> u32 {
        self.bootloader_requests
    }
}

impl Default for VirtualPedal {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualPedal {
    fn now_ms(&self) -> u32 {
        self.now_ms
    }
}

impl PedalHardware for VirtualPedal {
    fn knob(&self, knob: Knob) -> f32 {
        self.knobs[knob.index()]
    }

    fn toggle(&self, toggle: Toggle) -> SwitchPosition {
        self.toggles[toggle.index()]
    }

    fn footswitch_pressed(&self, footswitch: Footswitch) -> bool {
        self.footswitches[footswitch.index()]
    }

    fn set_led(&mut self, led: Led, brightness: f32) {
        self.staged_leds[led.index()] = brightness.clamp(0.0, 1.0);
    }

    fn update_leds(&mut self) {
        self.leds = self.staged_leds;
    }

    fn request_bootloader(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::info!(at_ms = self.now_ms, "bootloader requested");
        self.bootloader_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leds_latch_on_update() {
        let mut hw = VirtualPedal::new();
        hw.set_led(Led::Left, 0.6);
        assert_eq!(hw.led(Led::Left), 0.0);
        hw.update_leds();
        assert_eq!(hw.led(Led::Left), 0.6);
    }

    #[test]
    fn knob_input_is_clamped() {
        let mut hw = VirtualPedal::new();
        hw.set_knob(Knob::K1, 1.4);
        assert_eq!(hw.knob(Knob::K1), 1.0);
    }

    #[test]
    fn records_bootloader_requests() {
        let mut hw = VirtualPedal::new();
        hw.request_bootloader();
        assert_eq!(hw.bootloader_requests(), 1);
    }
}
