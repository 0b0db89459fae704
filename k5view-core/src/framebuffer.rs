//! Framebuffer store
//!
//! Holds the reconstructed 1024-byte screen and applies decoded frames to it.
//! The store never changes size; diff blocks are bounds-checked by index
//! before they are written.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use k5view_protocol::diff::{self, BLOCK_COUNT};
use k5view_protocol::{Frame, FrameError, FrameType, Framebuffer, FRAME_SIZE};

/// Result of applying a diff payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiffReport {
    /// Blocks written
    pub applied: u16,
    /// Index that stopped the diff, if any
    pub out_of_range: Option<u8>,
}

impl DiffReport {
    /// Error for the blocks that were skipped
    pub fn error(&self) -> Option<FrameError> {
        self.out_of_range.map(FrameError::OutOfRangeBlockIndex)
    }
}

/// What a committed frame did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameEvent {
    /// Whole framebuffer replaced
    Screenshot,
    /// Blocks overwritten
    Diff(DiffReport),
}

/// Anything that accepts decoded frames
pub trait FrameSink {
    /// Commit a frame
    ///
    /// Returns `Err` only when nothing was written.
    fn apply(&mut self, frame: &Frame<'_>) -> Result<FrameEvent, FrameError>;
}

impl<T: FrameSink + ?Sized> FrameSink for &mut T {
    fn apply(&mut self, frame: &Frame<'_>) -> Result<FrameEvent, FrameError> {
        (**self).apply(frame)
    }
}

/// Owned framebuffer, zeroed at creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferStore {
    buffer: Framebuffer,
}

impl Default for FramebufferStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FramebufferStore {
    /// Create a blank store
    pub const fn new() -> Self {
        Self {
            buffer: [0; FRAME_SIZE],
        }
    }

    /// Replace the whole framebuffer
    pub fn apply_screenshot(&mut self, payload: &Framebuffer) {
        self.buffer.copy_from_slice(payload);
    }

    /// Overwrite the blocks listed in a diff payload, in order
    ///
    /// Blocks before an out-of-range index stay written. Trailing bytes that
    /// do not form a whole block are ignored.
    pub fn apply_diff(&mut self, payload: &[u8]) -> DiffReport {
        let mut report = DiffReport::default();

        for block in diff::blocks(payload) {
            match block {
                Ok(block) => {
                    self.buffer[block.range()].copy_from_slice(&block.data);
                    report.applied = report.applied.saturating_add(1);
                }
                Err(FrameError::OutOfRangeBlockIndex(index)) => {
                    report.out_of_range = Some(index);
                }
                Err(_) => {}
            }
        }

        report
    }

    /// Copy of the current framebuffer
    pub fn snapshot(&self) -> Framebuffer {
        self.buffer
    }

    /// Borrow the current framebuffer
    pub fn as_bytes(&self) -> &Framebuffer {
        &self.buffer
    }

    /// Blank the screen
    pub fn clear(&mut self) {
        self.buffer = [0; FRAME_SIZE];
    }
}

impl FrameSink for FramebufferStore {
    fn apply(&mut self, frame: &Frame<'_>) -> Result<FrameEvent, FrameError> {
        match frame.frame_type() {
            FrameType::Screenshot => {
                let payload: &Framebuffer = frame.payload.try_into().map_err(|_| {
                    FrameError::InvalidLength {
                        frame_type: FrameType::Screenshot,
                        len: frame.header.payload_len,
                    }
                })?;
                self.apply_screenshot(payload);
                Ok(FrameEvent::Screenshot)
            }
            FrameType::Diff => Ok(FrameEvent::Diff(self.apply_diff(frame.payload))),
        }
    }
}

/// Framebuffer shared between a decode context and a render context
///
/// Mutation and snapshots are serialized by an `embassy-sync` blocking
/// mutex, so a reader always sees a frame that was fully applied.
pub struct SharedFramebuffer<M: RawMutex> {
    inner: Mutex<M, RefCell<FramebufferStore>>,
}

impl<M: RawMutex> SharedFramebuffer<M> {
    /// Create a blank shared store around a raw mutex
    ///
    /// `const`, so it can initialize a `static`:
    /// `SharedFramebuffer::new(CriticalSectionRawMutex::new())`.
    pub const fn new(raw: M) -> Self {
        Self {
            inner: Mutex::const_new(raw, RefCell::new(FramebufferStore::new())),
        }
    }

    /// Commit a frame under the lock
    pub fn apply(&self, frame: &Frame<'_>) -> Result<FrameEvent, FrameError> {
        self.inner.lock(|store| store.borrow_mut().apply(frame))
    }

    /// Consistent copy of the latest committed state
    pub fn snapshot(&self) -> Framebuffer {
        self.inner.lock(|store| store.borrow().snapshot())
    }

    /// Run `f` with the store locked
    pub fn with<R>(&self, f: impl FnOnce(&mut FramebufferStore) -> R) -> R {
        self.inner.lock(|store| f(&mut store.borrow_mut()))
    }
}

impl<M: RawMutex> FrameSink for &SharedFramebuffer<M> {
    fn apply(&mut self, frame: &Frame<'_>) -> Result<FrameEvent, FrameError> {
        SharedFramebuffer::apply(self, frame)
    }
}

// Keep diff indices and the store size in step
const _: () = assert!(BLOCK_COUNT * 8 == FRAME_SIZE);
