//! UART receive abstraction
//!
//! The radio streams its screen over a plain serial line with no flow
//! control. Reads are bounded by a timeout, so a receiver has three normal
//! outcomes (bytes, nothing yet, line closed) besides a hard failure.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a single bounded read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxStatus {
    /// `n` bytes were written to the front of the buffer (`n > 0`)
    Data(usize),
    /// The read timeout elapsed with no data. Not an error.
    Idle,
    /// The source is exhausted and will not produce more bytes
    Closed,
}

/// UART receiver
///
/// Blocking trait for pulling bytes from a serial link. Each call blocks
/// for at most the source's own read timeout.
pub trait UartRx {
    /// Error type for unrecoverable receive failures (device gone, I/O error)
    type Error;

    /// Read up to `buf.len()` bytes
    ///
    /// Returns [`RxStatus::Idle`] when the timeout elapses without data
    /// and [`RxStatus::Closed`] at end of stream. Only failures that make
    /// the source unusable are reported as `Err`.
    fn read(&mut self, buf: &mut [u8]) -> Result<RxStatus, Self::Error>;
}

impl<T: UartRx + ?Sized> UartRx for &mut T {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<RxStatus, Self::Error> {
        (**self).read(buf)
    }
}

/// In-memory source: yields its bytes, then reports [`RxStatus::Closed`]
impl UartRx for &[u8] {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<RxStatus, Self::Error> {
        if self.is_empty() {
            return Ok(RxStatus::Closed);
        }
        if buf.is_empty() {
            return Ok(RxStatus::Idle);
        }

        let n = buf.len().min(self.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(RxStatus::Data(n))
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Longest a single read may block before reporting [`RxStatus::Idle`]
    pub read_timeout_ms: u32,
}

/// Baud rate used by the K5 screenshot stream
pub const DEFAULT_BAUDRATE: u32 = 38_400;

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 500;

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: DEFAULT_BAUDRATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}
