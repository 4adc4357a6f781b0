//! LED behavior per mode.
//!
//! | Mode | Left | Right |
//! |------|------|-------|
//! | Normal | reverb on | tremolo/delay status, refreshed 100 times a second |
//! | TapTempo | reverb on | flash on each tap, then a 10% blink at the tempo |
//! | EditReverb | blink | blink, in step with left |
//! | EditDeviceSettings | blink | blink, opposite to left |
//!
//! Edit mode blinks toggle every half second.

use flick_config::BypassState;

use crate::Mode;

/// Brightness of the right LED when only the tremolo is on, relative to
/// both being on.
pub const TREMOLO_LED_BRIGHTNESS: f32 = 0.4;

/// Per-block inputs to the LED logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorInput {
    /// Current mode.
    pub mode: Mode,
    /// Live bypass flags.
    pub bypass: BypassState,
    /// A tap flash is showing this block.
    pub tap_flash: bool,
    /// Tapped beat period in milliseconds, 0 when unknown.
    pub tempo_ms: f32,
    /// Latest tremolo modulation value.
    pub tremolo_lfo: f32,
}

/// LED state carried across blocks.
#[derive(Debug, Clone)]
pub struct Indicators {
    block_rate: u32,
    mode: Mode,
    blink_count: u32,
    blink_on: bool,
    refresh_count: u32,
    tempo_count: u32,
    left: f32,
    right: f32,
}

impl Indicators {
    /// LEDs off, counters for `block_rate` blocks per second.
    pub fn new(block_rate: u32) -> Self {
        Self {
            block_rate: block_rate.max(1),
            mode: Mode::Normal,
            blink_count: 0,
            blink_on: true,
            refresh_count: 0,
            tempo_count: 0,
            left: 0.0,
            right: 0.0,
        }
    }

    /// Advances one block and returns (left, right) brightness.
    pub fn update(&mut self, input: &IndicatorInput) -> (f32, f32) {
        if input.mode != self.mode {
            self.mode = input.mode;
            self.blink_count = 0;
            self.blink_on = true;
            self.refresh_count = 0;
            self.tempo_count = 0;
        }

        match input.mode {
            Mode::EditReverb | Mode::EditDeviceSettings => {
                self.blink_count += 1;
                if self.blink_count >= self.block_rate / 2 {
                    self.blink_count = 0;
                    self.blink_on = !self.blink_on;
                }
                let on = f32::from(u8::from(self.blink_on));
                self.left = on;
                self.right = if input.mode == Mode::EditReverb {
                    on
                } else {
                    1.0 - on
                };
            }
            Mode::Normal => {
                self.left = reverb_led(input.bypass);
                self.refresh_count += 1;
                if self.refresh_count >= (self.block_rate / 100).max(1) {
                    self.refresh_count = 0;
                    self.right = effects_led(input.bypass, input.tremolo_lfo);
                }
            }
            Mode::TapTempo => {
                self.left = reverb_led(input.bypass);
                self.right = self.tempo_led(input);
            }
        }

        (self.left, self.right)
    }

    fn tempo_led(&mut self, input: &IndicatorInput) -> f32 {
        if input.tap_flash {
            self.tempo_count = 0;
            return 1.0;
        }
        if input.tempo_ms <= 0.0 {
            return 0.0;
        }
        let period = (input.tempo_ms * self.block_rate as f32 / 1000.0) as u32;
        if period == 0 {
            return self.right;
        }
        self.tempo_count = (self.tempo_count + 1) % period;
        if self.tempo_count < period / 10 {
            1.0
        } else {
            0.0
        }
    }
}

fn reverb_led(bypass: BypassState) -> f32 {
    if bypass.reverb { 0.0 } else { 1.0 }
}

/// Right LED in normal mode: solid for delay alone, a dimmed pulse for
/// tremolo alone, a full pulse for both.
fn effects_led(bypass: BypassState, lfo: f32) -> f32 {
    match (bypass.tremolo, bypass.delay) {
        (true, true) => 0.0,
        (true, false) => 1.0,
        (false, true) => lfo * TREMOLO_LED_BRIGHTNESS,
        (false, false) => lfo,
    }
}
