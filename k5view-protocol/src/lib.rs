//! K5 Screen Mirror Protocol
//!
//! This crate defines the UART stream a Quansheng K5 radio emits to mirror
//! its 128x64 monochrome LCD. The radio sends either a full screenshot or a
//! sparse diff of changed 8-byte blocks.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌───────────┬──────┬────────────┬──────────────────────┐
//! │ MARKER    │ TYPE │ LENGTH     │ PAYLOAD              │
//! │ AA 55     │ 1B   │ 2B (BE)    │ LENGTH bytes         │
//! └───────────┴──────┴────────────┴──────────────────────┘
//! ```
//!
//! - TYPE `0x01`: screenshot, LENGTH is exactly 1024 (the whole framebuffer)
//! - TYPE `0x02`: diff, LENGTH is a multiple of 9, each block being
//!   `[index][8 data bytes]` replacing framebuffer bytes `index*8..index*8+8`
//!
//! There is no checksum. A receiver finds frames by scanning for the marker
//! and drops anything that does not validate, resynchronizing byte by byte.
//!
//! # Layers
//!
//! - [`parser::FrameParser`] - push-mode state machine, one byte at a time
//! - [`receiver::Receiver`] - pull-mode reader over a [`k5view_hal::UartRx`]
//! - [`diff`] - diff block decoding and the sender-side [`diff::DiffEncoder`]

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod diff;
pub mod frame;
pub mod parser;
pub mod receiver;

pub use diff::{DiffBlock, DiffBlocks, DiffEncoder};
pub use frame::{
    encode_frame, Frame, FrameError, FrameHeader, FrameType, Framebuffer, FRAME_MARKER,
    FRAME_SIZE, HEADER_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH,
};
pub use parser::{FrameParser, Step};
pub use receiver::{Receiver, Recv, RecvError};
