//! Flick Platform - hardware abstraction for the flick pedal
//!
//! The pedal core never touches pins, ADCs or timers directly. It sees the
//! enclosure through [`PedalHardware`]: six knobs, three 3-way toggles, two
//! momentary footswitches, two LEDs, a bootloader request and a millisecond
//! clock. Platform differences (which physical extreme of a toggle reads as
//! position 0, electrical debouncing) are resolved below this trait.
//!
//! On top of the raw capability set this crate provides the two pieces of
//! control logic that depend only on it:
//!
//! - [`GestureDetector`] - normal/double/long press classification per
//!   footswitch
//! - [`ParameterCapture`] - soft takeover for knobs ([`KnobCapture`]) and
//!   toggles ([`SwitchCapture`])
//!
//! [`VirtualPedal`] implements the trait in memory for hosts and tests.
//!
//! # no_std Support
//!
//! ```toml
//! [dependencies]
//! flick-platform = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod capture;
pub mod gesture;
pub mod virtual_hw;

pub use capture::{CaptureValue, DEFAULT_THRESHOLD, KnobCapture, ParameterCapture, SwitchCapture};
pub use gesture::{Gesture, GestureConfig, GestureDetector};
pub use virtual_hw::VirtualPedal;

/// Potentiometers, numbered as printed on the enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Knob {
    /// Knob 1.
    K1,
    /// Knob 2.
    K2,
    /// Knob 3.
    K3,
    /// Knob 4.
    K4,
    /// Knob 5.
    K5,
    /// Knob 6.
    K6,
}

impl Knob {
    /// Every knob in panel order.
    pub const ALL: [Knob; 6] = [Knob::K1, Knob::K2, Knob::K3, Knob::K4, Knob::K5, Knob::K6];

    /// Zero-based index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Three-way toggle switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    /// Toggle 1.
    T1,
    /// Toggle 2.
    T2,
    /// Toggle 3.
    T3,
}

impl Toggle {
    /// Every toggle in panel order.
    pub const ALL: [Toggle; 3] = [Toggle::T1, Toggle::T2, Toggle::T3];

    /// Zero-based index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Momentary footswitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Footswitch {
    /// Left footswitch.
    A,
    /// Right footswitch.
    B,
}

impl Footswitch {
    /// Both footswitches, left first.
    pub const ALL: [Footswitch; 2] = [Footswitch::A, Footswitch::B];

    /// Zero-based index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The other footswitch.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Footswitch::A => Footswitch::B,
            Footswitch::B => Footswitch::A,
        }
    }
}

/// Indicator LEDs, one above each footswitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// Above footswitch A.
    Left,
    /// Above footswitch B.
    Right,
}

impl Led {
    /// Zero-based index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Logical position of a 3-way toggle.
///
/// Position 0 is the same physical extreme on every supported enclosure
/// (up on vertical toggles, right on horizontal ones).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SwitchPosition {
    /// Up or right.
    Up,
    /// Center.
    #[default]
    Middle,
    /// Down or left.
    Down,
}

impl SwitchPosition {
    /// All positions in index order.
    pub const ALL: [SwitchPosition; 3] =
        [SwitchPosition::Up, SwitchPosition::Middle, SwitchPosition::Down];

    /// Index 0..=2, usable directly as a lookup-table offset.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Position for an index; anything past 2 reads as [`SwitchPosition::Down`].
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => SwitchPosition::Up,
            1 => SwitchPosition::Middle,
            _ => SwitchPosition::Down,
        }
    }
}

/// Monotonic millisecond clock.
///
/// Wraps after about 49 days; every consumer compares timestamps with
/// `wrapping_sub`.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u32;
}

/// Capability set of the pedal enclosure.
///
/// Reads reflect the state at the last [`poll`](PedalHardware::poll); LED
/// writes become visible on [`update_leds`](PedalHardware::update_leds).
pub trait PedalHardware: Clock {
    /// Refreshes the control readings. Called once per audio block.
    fn poll(&mut self) {}

    /// Normalized knob reading in [0, 1].
    fn knob(&self, knob: Knob) -> f32;

    /// Logical toggle position.
    fn toggle(&self, toggle: Toggle) -> SwitchPosition;

    /// Debounced footswitch level.
    fn footswitch_pressed(&self, footswitch: Footswitch) -> bool;

    /// Stages an LED brightness in [0, 1].
    fn set_led(&mut self, led: Led, brightness: f32);

    /// Pushes staged LED brightnesses to the hardware.
    fn update_leds(&mut self) {}

    /// Reboots into the firmware-update bootloader. On a device this does
    /// not return.
    fn request_bootloader(&mut self);
}
