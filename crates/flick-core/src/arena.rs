//! Bump allocator for delay memory.
//!
//! The pedal needs several large delay buffers (two 2-second delay lines,
//! eight hall tank lines) that must exist before audio starts and must never
//! move or be freed. A [`SampleArena`] borrows one pre-allocated pool, which
//! may live in a dedicated memory region on the device, and hands out
//! disjoint zeroed slices from it.
//!
//! ```rust
//! use flick_core::{DelayLine, SampleArena};
//!
//! let mut pool = vec![0.0f32; 1024];
//! let mut arena = SampleArena::new(&mut pool);
//! let left = DelayLine::from_storage(arena.take(512).unwrap());
//! let right = DelayLine::from_storage(arena.take(512).unwrap());
//! assert!(arena.take(1).is_none());
//! # let _ = (left, right);
//! ```

/// Hands out disjoint, zeroed slices of one borrowed sample pool.
///
/// Slices are never returned to the pool; the arena only shrinks.
#[derive(Debug)]
pub struct SampleArena<'a> {
    remaining: &'a mut [f32],
}

impl<'a> SampleArena<'a> {
    /// Creates an arena over `pool`.
    pub fn new(pool: &'a mut [f32]) -> Self {
        Self { remaining: pool }
    }

    /// Claims `len` zeroed samples, or `None` if the pool is exhausted.
    pub fn take(&mut self, len: usize) -> Option<&'a mut [f32]> {
        if len > self.remaining.len() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                requested = len,
                available = self.remaining.len(),
                "sample arena exhausted"
            );
            return None;
        }
        let pool = core::mem::take(&mut self.remaining);
        let (head, tail) = pool.split_at_mut(len);
        self.remaining = tail;
        head.fill(0.0);
        Some(head)
    }

    /// Number of samples still available.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_disjoint_and_zeroed() {
        let mut pool = [1.0f32; 10];
        let mut arena = SampleArena::new(&mut pool);
        let a = arena.take(4).unwrap();
        let b = arena.take(6).unwrap();
        assert!(a.iter().all(|&s| s == 0.0));
        a[0] = 3.0;
        b[0] = 5.0;
        assert_eq!(a[0], 3.0);
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn exhaustion_returns_none_without_consuming() {
        let mut pool = [0.0f32; 8];
        let mut arena = SampleArena::new(&mut pool);
        assert!(arena.take(9).is_none());
        assert_eq!(arena.remaining(), 8);
        assert!(arena.take(8).is_some());
    }
}
