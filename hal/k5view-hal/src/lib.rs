//! k5view Hardware Abstraction Layer
//!
//! This crate defines the byte source that feeds the frame decoder. The
//! decoder never talks to a serial port directly; it pulls bytes through
//! [`uart::UartRx`], which can be backed by a host serial port, a pipe, an
//! in-memory slice or an MCU UART.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  k5view-core (decoder loop)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  k5view-hal (this crate - UartRx)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ io::IoRx      │       │ &[u8]         │
//! │ (std feature) │       │ (tests)       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Features
//!
//! - `std` - [`io::IoRx`] adapter for any `std::io::Read`
//! - `serde` - derive `Serialize`/`Deserialize` for [`uart::UartConfig`]
//! - `defmt` - derive `defmt::Format` for public types

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "std")]
pub mod io;
pub mod uart;

// Re-export key types at crate root for convenience
#[cfg(feature = "std")]
pub use io::IoRx;
pub use uart::{
    DataBits, Parity, RxStatus, StopBits, UartConfig, UartRx, DEFAULT_BAUDRATE,
    DEFAULT_READ_TIMEOUT_MS,
};
