//! Pull-mode receiver
//!
//! Drives a [`FrameParser`] from a blocking [`UartRx`]. Bytes are pulled in
//! small chunks; whatever follows a completed frame stays buffered for the
//! next call, so no byte is lost between frames.

use k5view_hal::{RxStatus, UartRx};

use crate::frame::{Frame, FrameError, FrameHeader};
use crate::parser::{FrameParser, Step};

/// Bytes requested from the source per read
pub const RX_CHUNK_SIZE: usize = 64;

/// Outcome of a receive call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recv<T> {
    /// A header or frame is available
    Ready(T),
    /// The source timed out while no frame was in progress
    NoData,
    /// The source is closed
    EndOfStream,
}

/// Receive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecvError<E> {
    /// The current frame was dropped; the next call resynchronizes
    Frame(FrameError),
    /// The byte source failed
    Source(E),
}

impl<E> RecvError<E> {
    /// True if the error came from the source rather than the stream
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecvError::Source(_))
    }
}

impl<E> From<FrameError> for RecvError<E> {
    fn from(err: FrameError) -> Self {
        RecvError::Frame(err)
    }
}

/// Frame receiver over a blocking byte source
#[derive(Debug, Clone)]
pub struct Receiver {
    parser: FrameParser,
    chunk: [u8; RX_CHUNK_SIZE],
    pos: usize,
    filled: usize,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    /// Create a receiver in marker search
    pub const fn new() -> Self {
        Self {
            parser: FrameParser::new(),
            chunk: [0; RX_CHUNK_SIZE],
            pos: 0,
            filled: 0,
        }
    }

    /// Drop any partial frame and buffered bytes
    pub fn reset(&mut self) {
        self.parser.reset();
        self.pos = 0;
        self.filled = 0;
    }

    /// Bytes read from the source but not yet parsed
    pub fn buffered(&self) -> usize {
        self.filled - self.pos
    }

    /// Scan for the next valid header
    ///
    /// A timeout with no marker matched is [`Recv::NoData`]; a timeout or
    /// end of stream after the marker is [`FrameError::TruncatedHeader`].
    /// Headers that fail validation are returned as errors and scanning
    /// resumes right after them on the next call.
    ///
    /// An unread payload from a previous header is abandoned.
    pub fn next_header<S: UartRx>(
        &mut self,
        source: &mut S,
    ) -> Result<Recv<FrameHeader>, RecvError<S::Error>> {
        if self.parser.pending_header().is_some() {
            self.parser.reset();
        }

        loop {
            while self.pos < self.filled {
                let byte = self.chunk[self.pos];
                self.pos += 1;
                match self.parser.feed(byte)? {
                    Step::Pending => {}
                    Step::Header(header) | Step::Frame(header) => {
                        return Ok(Recv::Ready(header));
                    }
                }
            }

            let status = self.refill(source)?;
            let idle = match status {
                RxStatus::Data(_) => continue,
                RxStatus::Idle => Recv::NoData,
                RxStatus::Closed => Recv::EndOfStream,
            };

            return match self.parser.abort() {
                Some(err) => Err(err.into()),
                None => Ok(idle),
            };
        }
    }

    /// Read the payload announced by `header`
    ///
    /// `header` must be the one [`Receiver::next_header`] just returned.
    /// A stall or end of stream before the last byte drops the partial
    /// payload with [`FrameError::TruncatedPayload`].
    pub fn read_payload<S: UartRx>(
        &mut self,
        source: &mut S,
        header: &FrameHeader,
    ) -> Result<&[u8], RecvError<S::Error>> {
        if header.payload_len == 0 {
            return Ok(&[]);
        }
        if self.parser.pending_header() != Some(*header) {
            self.parser.reset();
            return Err(FrameError::TruncatedPayload.into());
        }

        loop {
            while self.pos < self.filled {
                let byte = self.chunk[self.pos];
                self.pos += 1;
                if let Step::Frame(_) = self.parser.feed(byte)? {
                    return Ok(self.parser.payload());
                }
            }

            if let RxStatus::Data(_) = self.refill(source)? {
                continue;
            }

            self.parser.reset();
            return Err(FrameError::TruncatedPayload.into());
        }
    }

    /// Receive one complete frame
    pub fn next_frame<S: UartRx>(
        &mut self,
        source: &mut S,
    ) -> Result<Recv<Frame<'_>>, RecvError<S::Error>> {
        let header = match self.next_header(source)? {
            Recv::Ready(header) => header,
            Recv::NoData => return Ok(Recv::NoData),
            Recv::EndOfStream => return Ok(Recv::EndOfStream),
        };

        let payload = self.read_payload(source, &header)?;
        Ok(Recv::Ready(Frame { header, payload }))
    }

    fn refill<S: UartRx>(&mut self, source: &mut S) -> Result<RxStatus, RecvError<S::Error>> {
        self.pos = 0;
        self.filled = 0;

        match source.read(&mut self.chunk).map_err(RecvError::Source)? {
            RxStatus::Data(0) => Ok(RxStatus::Idle),
            RxStatus::Data(n) => {
                self.filled = n.min(RX_CHUNK_SIZE);
                Ok(RxStatus::Data(self.filled))
            }
            status => Ok(status),
        }
    }
}
