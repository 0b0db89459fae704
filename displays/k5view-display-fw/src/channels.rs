//! Inter-task communication
//!
//! The RX task owns the parser and writes the shared framebuffer; the
//! display task only ever reads snapshots of it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use k5view_core::{LinkStatus, SharedFramebuffer};

/// Mirrored K5 screen
pub static FRAMEBUFFER: SharedFramebuffer<CriticalSectionRawMutex> =
    SharedFramebuffer::new(CriticalSectionRawMutex::new());

/// Signal that a frame was committed to [`FRAMEBUFFER`]
pub static FRAME_DECODED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Link status changes (frame rate or no signal)
pub static LINK_STATUS: Signal<CriticalSectionRawMutex, LinkStatus> = Signal::new();
