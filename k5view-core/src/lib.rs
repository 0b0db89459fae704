//! Board-agnostic core of the K5 screen mirror
//!
//! - [`framebuffer`] - the reconstructed screen, owned or shared behind a mutex
//! - [`decoder`] - the decode loop: source in, committed frames out
//! - [`link`] - frame rate and "no signal" tracking
//! - [`config`] - configuration types
//!
//! ```text
//! UartRx ──> Decoder ──> FrameSink (FramebufferStore / SharedFramebuffer)
//!               │                          │
//!               └── Poll ──> LinkMonitor   └── snapshot() ──> renderer
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod decoder;
pub mod framebuffer;
pub mod link;

pub use config::{ConfigError, DisplayConfig, LinkConfig, MirrorConfig};
pub use decoder::{Decoder, Exit, Poll};
pub use framebuffer::{DiffReport, FrameEvent, FrameSink, FramebufferStore, SharedFramebuffer};
pub use link::{LinkMonitor, LinkStatus};
