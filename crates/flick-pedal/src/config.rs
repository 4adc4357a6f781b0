//! Fixed operating parameters of the pedal.
//!
//! Every timing and range constant the controller depends on lives here so
//! hosts and tests can shorten timeouts or run at another sample rate.

use flick_platform::{DEFAULT_THRESHOLD, GestureConfig};

/// Operating parameters.
///
/// The defaults describe the hardware pedal: 48 kHz, 8-sample blocks and a
/// two second delay buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedalConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Samples per audio block.
    pub block_size: usize,
    /// Delay buffer length per channel, in samples.
    pub max_delay_samples: usize,
    /// Shortest delay the time knob or tap tempo can select, in seconds.
    pub min_delay_seconds: f32,
    /// Footswitch timing.
    pub gesture: GestureConfig,
    /// Knob travel that releases a soft-takeover capture.
    pub takeover_threshold: f32,
    /// Tap tempo gives up after this long without a tap.
    pub tap_timeout_ms: u32,
    /// Blocks the right LED stays lit after a tap.
    pub tap_flash_blocks: u32,
    /// Interval between service loop iterations on the device.
    pub service_interval_ms: u32,
}

impl Default for PedalConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 8,
            max_delay_samples: 96000,
            min_delay_seconds: 0.05,
            gesture: GestureConfig::default(),
            takeover_threshold: DEFAULT_THRESHOLD,
            tap_timeout_ms: 4000,
            tap_flash_blocks: 300,
            service_interval_ms: 10,
        }
    }
}

impl PedalConfig {
    /// Audio blocks per second.
    pub fn block_rate(&self) -> u32 {
        (self.sample_rate / self.block_size.max(1) as f32) as u32
    }

    /// Shortest selectable delay in samples.
    pub fn min_delay_samples(&self) -> f32 {
        self.sample_rate * self.min_delay_seconds
    }

    /// Longest selectable delay in samples.
    pub fn max_delay(&self) -> f32 {
        self.max_delay_samples as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_defaults() {
        let config = PedalConfig::default();
        assert_eq!(config.block_rate(), 6000);
        assert_eq!(config.min_delay_samples(), 2400.0);
        assert_eq!(config.max_delay(), 96000.0);
        assert_eq!(config.gesture.hold_ms, 2000);
    }

    #[test]
    fn zero_block_size_does_not_divide_by_zero() {
        let config = PedalConfig {
            block_size: 0,
            ..PedalConfig::default()
        };
        assert_eq!(config.block_rate(), 48000);
    }
}
