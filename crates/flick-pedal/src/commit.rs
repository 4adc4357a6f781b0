//! Requests handed from the audio context to the service loop.
//!
//! The audio context only ever raises a flag and the service loop only ever
//! takes it, so a single atomic per request is the whole protocol. No lock
//! is taken on either side.

use core::sync::atomic::{AtomicBool, Ordering};

/// Pending work for the service loop.
///
/// ```rust
/// use flick_pedal::CommitFlags;
///
/// let flags = CommitFlags::new();
/// flags.request_save();
/// assert!(flags.save_pending());
/// assert!(flags.take_save());
/// assert!(!flags.save_pending());
/// ```
#[derive(Debug, Default)]
pub struct CommitFlags {
    save: AtomicBool,
    bootloader: AtomicBool,
}

impl CommitFlags {
    /// No pending work.
    pub const fn new() -> Self {
        Self {
            save: AtomicBool::new(false),
            bootloader: AtomicBool::new(false),
        }
    }

    /// Asks for the settings record to be written. Audio side.
    pub fn request_save(&self) {
        self.save.store(true, Ordering::Release);
    }

    /// Asks for the bootloader. Audio side.
    pub fn request_bootloader(&self) {
        self.bootloader.store(true, Ordering::Release);
    }

    /// True while a settings write is outstanding.
    pub fn save_pending(&self) -> bool {
        self.save.load(Ordering::Acquire)
    }

    /// True while a bootloader request is outstanding.
    pub fn bootloader_pending(&self) -> bool {
        self.bootloader.load(Ordering::Acquire)
    }

    /// Takes the settings write request. Service side.
    ///
    /// The flag is lowered before the write starts, so a request raised
    /// while the write is in progress stays pending for the next poll.
    pub fn take_save(&self) -> bool {
        self.save.swap(false, Ordering::AcqRel)
    }

    /// Takes the bootloader request. Service side.
    pub fn take_bootloader(&self) -> bool {
        self.bootloader.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_independent() {
        let flags = CommitFlags::new();
        flags.request_bootloader();
        assert!(!flags.save_pending());
        assert!(flags.bootloader_pending());
        assert!(flags.take_bootloader());
        assert!(!flags.take_bootloader());
    }

    #[test]
    fn repeated_requests_collapse() {
        let flags = CommitFlags::new();
        flags.request_save();
        flags.request_save();
        assert!(flags.take_save());
        assert!(!flags.take_save());
    }
}
