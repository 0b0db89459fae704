//! `std::io::Read` adapter
//!
//! Host serial port crates expose the port as a `Read` whose `read` fails
//! with `TimedOut` when the configured timeout elapses. [`IoRx`] maps that
//! onto [`RxStatus::Idle`] and a zero-length read onto [`RxStatus::Closed`].

use std::io::{self, ErrorKind, Read};

use crate::uart::{RxStatus, UartRx};

/// Byte source backed by any `std::io::Read`
#[derive(Debug)]
pub struct IoRx<R> {
    inner: R,
}

impl<R: Read> IoRx<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped reader
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap, returning the reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> UartRx for IoRx<R> {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<RxStatus, Self::Error> {
        loop {
            return match self.inner.read(buf) {
                Ok(0) if buf.is_empty() => Ok(RxStatus::Idle),
                Ok(0) => Ok(RxStatus::Closed),
                Ok(n) => Ok(RxStatus::Data(n)),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    Ok(RxStatus::Idle)
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
        }
    }
}
