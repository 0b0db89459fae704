//! Decode loop
//!
//! Pulls frames from a byte source and commits them to a [`FrameSink`].
//! Every protocol problem is absorbed here and reported as
//! [`Poll::Dropped`]; only a failing source ends the loop with an error.

use core::sync::atomic::{AtomicBool, Ordering};

use k5view_hal::UartRx;
use k5view_protocol::{FrameError, Receiver, Recv, RecvError};

use crate::framebuffer::{FrameEvent, FrameSink};

/// Outcome of one decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Poll {
    /// A frame was committed
    Frame(FrameEvent),
    /// The source timed out with no frame in progress
    NoData,
    /// The source is closed
    EndOfStream,
    /// A frame was discarded; decoding continues with the next byte
    Dropped(FrameError),
}

/// Why [`Decoder::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Exit {
    /// The stop flag was raised
    Stopped,
    /// The source closed
    EndOfStream,
}

/// Frame decoder bound to no particular source or sink
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    receiver: Receiver,
}

impl Decoder {
    /// Create a decoder in marker search
    pub const fn new() -> Self {
        Self {
            receiver: Receiver::new(),
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.receiver.reset();
    }

    /// Decode at most one frame and commit it to `sink`
    pub fn poll<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<Poll, S::Error>
    where
        S: UartRx,
        K: FrameSink + ?Sized,
    {
        match self.receiver.next_frame(source) {
            Ok(Recv::Ready(frame)) => match sink.apply(&frame) {
                Ok(event) => Ok(Poll::Frame(event)),
                Err(err) => Ok(Poll::Dropped(err)),
            },
            Ok(Recv::NoData) => Ok(Poll::NoData),
            Ok(Recv::EndOfStream) => Ok(Poll::EndOfStream),
            Err(RecvError::Frame(err)) => Ok(Poll::Dropped(err)),
            Err(RecvError::Source(err)) => Err(err),
        }
    }

    /// Poll until `stop` is raised or the source closes
    ///
    /// `on_poll` sees every outcome, including [`Poll::NoData`], so a
    /// caller can drive a render loop or a link monitor from it. A blocked
    /// read delays the stop check by at most the source's read timeout.
    pub fn run<S, K, F>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        stop: &AtomicBool,
        mut on_poll: F,
    ) -> Result<Exit, S::Error>
    where
        S: UartRx,
        K: FrameSink + ?Sized,
        F: FnMut(&Poll),
    {
        loop {
            if stop.load(Ordering::Relaxed) {
                return Ok(Exit::Stopped);
            }

            let poll = self.poll(source, sink)?;
            on_poll(&poll);

            if poll == Poll::EndOfStream {
                return Ok(Exit::EndOfStream);
            }
        }
    }
}
