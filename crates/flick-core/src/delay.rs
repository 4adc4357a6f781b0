//! Fractional-read delay line over caller-chosen storage.
//!
//! Every recirculating structure in the pedal is built on [`DelayLine`]: the
//! stereo delay, the reverb tanks, the allpass diffusers and the pre-delays.
//!
//! # Read convention
//!
//! `read(d)` returns the sample written `d` writes ago, so `read(1.0)` is the
//! most recent write. Reads may happen before or after the write of the
//! current sample; the convention does not change. Fractional delays
//! interpolate linearly toward the next-older sample.
//!
//! # Storage
//!
//! The line is generic over anything that derefs to a slice of samples. On a
//! host the default `Box<[f32]>` is convenient; on a device the buffers are
//! borrowed from a [`SampleArena`](crate::SampleArena) placed in whichever
//! memory region the board provides.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;
use alloc::vec;

/// Backing memory for a [`DelayLine`].
///
/// Blanket-implemented for every `AsRef<[f32]> + AsMut<[f32]>`, which covers
/// `Box<[f32]>`, `Vec<f32>`, fixed arrays and `&mut [f32]`.
pub trait SampleStorage: AsRef<[f32]> + AsMut<[f32]> {}

impl<T: AsRef<[f32]> + AsMut<[f32]>> SampleStorage for T {}

/// Ring buffer with fractional reads.
///
/// # Invariants
///
/// - capacity is at least 2 samples
/// - `write_pos < capacity`
/// - delays are clamped to `[1, capacity - 1]`, so a read never touches the
///   slot about to be overwritten
///
/// # Example
///
/// ```rust
/// use flick_core::DelayLine;
///
/// let mut line = DelayLine::new(8);
/// line.write(1.0);
/// line.write(0.0);
/// assert_eq!(line.read(2.0), 1.0);
/// assert_eq!(line.read(1.5), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine<S: SampleStorage = Box<[f32]>> {
    buffer: S,
    write_pos: usize,
}

impl DelayLine {
    /// Allocates a zeroed delay line holding `capacity` samples.
    ///
    /// Capacities below 2 are raised to 2.
    pub fn new(capacity: usize) -> Self {
        Self::from_storage(vec![0.0; capacity.max(2)].into_boxed_slice())
    }
}

impl<S: SampleStorage> DelayLine<S> {
    /// Wraps existing storage. The contents are zeroed.
    ///
    /// Returns `None` when the storage holds fewer than 2 samples.
    pub fn try_from_storage(mut buffer: S) -> Option<Self> {
        if buffer.as_ref().len() < 2 {
            return None;
        }
        buffer.as_mut().fill(0.0);
        Some(Self {
            buffer,
            write_pos: 0,
        })
    }

    /// Wraps existing storage of at least 2 samples. The contents are zeroed.
    ///
    /// # Panics
    ///
    /// Panics if the storage holds fewer than 2 samples. Use
    /// [`try_from_storage`](Self::try_from_storage) for caller-supplied memory.
    pub fn from_storage(buffer: S) -> Self {
        match Self::try_from_storage(buffer) {
            Some(line) => line,
            None => panic!("delay storage must hold at least 2 samples"),
        }
    }

    /// Total number of samples the line can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    /// Longest delay a read can reach, in samples.
    #[inline]
    pub fn max_delay(&self) -> usize {
        self.capacity() - 1
    }

    /// Reads the sample written `delay` writes ago with linear interpolation.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let buf = self.buffer.as_ref();
        let len = buf.len();
        let delay = delay.clamp(1.0, (len - 1) as f32);

        let whole = delay as usize;
        let frac = delay - whole as f32;

        let newer = (self.write_pos + len - whole) % len;
        let a = buf[newer];
        if frac == 0.0 {
            return a;
        }
        let older = (newer + len - 1) % len;
        let b = buf[older];
        a + (b - a) * frac
    }

    /// Reads the sample written `delay` writes ago, without interpolation.
    #[inline]
    pub fn read_at(&self, delay: usize) -> f32 {
        let buf = self.buffer.as_ref();
        let len = buf.len();
        let delay = delay.clamp(1, len - 1);
        buf[(self.write_pos + len - delay) % len]
    }

    /// Stores a sample and advances the write head.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        let len = self.capacity();
        self.buffer.as_mut()[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;
    }

    /// Zeroes every stored sample.
    pub fn clear(&mut self) {
        self.buffer.as_mut().fill(0.0);
        self.write_pos = 0;
    }

    /// Releases the backing storage.
    pub fn into_storage(self) -> S {
        self.buffer
    }
}
