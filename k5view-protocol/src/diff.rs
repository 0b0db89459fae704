//! Diff blocks
//!
//! A diff payload is a sequence of 9-byte blocks:
//! - INDEX (1 byte): block number, valid range 0-127
//! - DATA (8 bytes): replacement for framebuffer bytes `INDEX*8..INDEX*8+8`
//!
//! The radio emits diffs with [`DiffEncoder`]'s algorithm: changed blocks,
//! plus one "forced" block per frame that walks the whole screen so a
//! receiver that joined late converges within 128 frames.

use core::ops::Range;

use heapless::Vec;

use crate::frame::{FrameError, FrameHeader, FrameType, Framebuffer, FRAME_SIZE, HEADER_SIZE};

/// Bytes of framebuffer data per block
pub const BLOCK_DATA_SIZE: usize = 8;

/// Blocks per framebuffer
pub const BLOCK_COUNT: usize = FRAME_SIZE / BLOCK_DATA_SIZE;

/// Index byte plus data
pub const DIFF_BLOCK_SIZE: usize = 1 + BLOCK_DATA_SIZE;

/// Byte the radio appends after every diff frame
pub const FRAME_TRAILER: u8 = 0x0A;

/// Largest diff frame [`DiffEncoder`] produces: every block once, plus trailer
pub const MAX_DIFF_FRAME_SIZE: usize = HEADER_SIZE + BLOCK_COUNT * DIFF_BLOCK_SIZE + 1;

/// Framebuffer byte range covered by a block
pub fn block_range(index: usize) -> Range<usize> {
    let start = index * BLOCK_DATA_SIZE;
    start..start + BLOCK_DATA_SIZE
}

/// One decoded diff block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiffBlock {
    /// Block number (0-127)
    pub index: u8,
    /// Replacement bytes
    pub data: [u8; BLOCK_DATA_SIZE],
}

impl DiffBlock {
    /// Create a block, rejecting indices outside the framebuffer
    pub fn new(index: u8, data: [u8; BLOCK_DATA_SIZE]) -> Result<Self, FrameError> {
        if index as usize >= BLOCK_COUNT {
            return Err(FrameError::OutOfRangeBlockIndex(index));
        }
        Ok(Self { index, data })
    }

    /// Decode a block from its 9 wire bytes
    pub fn from_bytes(bytes: &[u8; DIFF_BLOCK_SIZE]) -> Result<Self, FrameError> {
        let mut data = [0u8; BLOCK_DATA_SIZE];
        data.copy_from_slice(&bytes[1..]);
        Self::new(bytes[0], data)
    }

    /// Encode to wire bytes
    pub fn to_bytes(&self) -> [u8; DIFF_BLOCK_SIZE] {
        let mut bytes = [0u8; DIFF_BLOCK_SIZE];
        bytes[0] = self.index;
        bytes[1..].copy_from_slice(&self.data);
        bytes
    }

    /// Framebuffer bytes this block replaces
    pub fn range(&self) -> Range<usize> {
        block_range(self.index as usize)
    }
}

/// Iterate the blocks of a diff payload
///
/// Yields blocks in wire order. An out-of-range index yields one
/// [`FrameError::OutOfRangeBlockIndex`] and ends the iteration; bytes that
/// do not make up a whole block are ignored.
pub fn blocks(payload: &[u8]) -> DiffBlocks<'_> {
    DiffBlocks {
        chunks: payload.chunks_exact(DIFF_BLOCK_SIZE),
        done: false,
    }
}

/// Iterator returned by [`blocks`]
#[derive(Debug, Clone)]
pub struct DiffBlocks<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
    done: bool,
}

impl<'a> Iterator for DiffBlocks<'a> {
    type Item = Result<DiffBlock, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let chunk = self.chunks.next()?;
        let mut bytes = [0u8; DIFF_BLOCK_SIZE];
        bytes.copy_from_slice(chunk);

        let block = DiffBlock::from_bytes(&bytes);
        if block.is_err() {
            self.done = true;
        }
        Some(block)
    }
}

impl<'a> core::iter::FusedIterator for DiffBlocks<'a> {}

/// Sender-side diff generator
///
/// Tracks the last frame sent and produces the next diff frame. Every call
/// includes all changed blocks plus one forced block; the forced pointer
/// advances on every call, so a full refresh trickles out over 128 frames
/// even when the screen is static.
#[derive(Debug, Clone)]
pub struct DiffEncoder {
    previous: Framebuffer,
    forced_block: u8,
}

impl Default for DiffEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffEncoder {
    /// Create an encoder whose baseline is a blank screen
    pub const fn new() -> Self {
        Self {
            previous: [0; FRAME_SIZE],
            forced_block: 0,
        }
    }

    /// Frame the receiver is assumed to hold
    pub fn previous(&self) -> &Framebuffer {
        &self.previous
    }

    /// Block that will be forced on the next call
    pub fn forced_block(&self) -> u8 {
        self.forced_block
    }

    /// Build the diff frame that brings a receiver from the previous frame
    /// to `current`
    ///
    /// With `force` every block is sent. The result is a complete frame:
    /// marker, header, blocks and the trailing [`FRAME_TRAILER`].
    pub fn encode(&mut self, current: &Framebuffer, force: bool) -> Vec<u8, MAX_DIFF_FRAME_SIZE> {
        let mut frame = Vec::new();
        // Header is patched once the payload length is known
        let _ = frame.extend_from_slice(&[0u8; HEADER_SIZE]);

        for index in 0..BLOCK_COUNT {
            let range = block_range(index);
            let changed = current[range.clone()] != self.previous[range.clone()];
            let forced = index == self.forced_block as usize;

            if changed || forced || force {
                // Capacity covers every block once, so these cannot fail
                let _ = frame.push(index as u8);
                let _ = frame.extend_from_slice(&current[range.clone()]);
                self.previous[range.clone()].copy_from_slice(&current[range]);
            }
        }

        self.forced_block = ((self.forced_block as usize + 1) % BLOCK_COUNT) as u8;

        let payload_len = (frame.len() - HEADER_SIZE) as u16;
        let header = FrameHeader::new(FrameType::Diff, payload_len);
        frame[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        let _ = frame.push(FRAME_TRAILER);

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_bytes(index: u8, fill: u8) -> [u8; DIFF_BLOCK_SIZE] {
        let mut bytes = [fill; DIFF_BLOCK_SIZE];
        bytes[0] = index;
        bytes
    }

    #[test]
    fn test_block_range() {
        assert_eq!(block_range(0), 0..8);
        assert_eq!(block_range(5), 40..48);
        assert_eq!(block_range(127), 1016..1024);
    }

    #[test]
    fn test_block_index_bounds() {
        assert!(DiffBlock::from_bytes(&block_bytes(127, 0)).is_ok());
        assert_eq!(
            DiffBlock::from_bytes(&block_bytes(128, 0)),
            Err(FrameError::OutOfRangeBlockIndex(128))
        );
        assert_eq!(
            DiffBlock::new(0xFF, [0; 8]),
            Err(FrameError::OutOfRangeBlockIndex(0xFF))
        );
    }

    #[test]
    fn test_blocks_stop_at_bad_index() {
        let mut payload = std::vec::Vec::new();
        payload.extend_from_slice(&block_bytes(1, 0x11));
        payload.extend_from_slice(&block_bytes(200, 0x22));
        payload.extend_from_slice(&block_bytes(2, 0x33));

        let items: std::vec::Vec<_> = blocks(&payload).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unwrap().index, 1);
        assert_eq!(items[1], Err(FrameError::OutOfRangeBlockIndex(200)));
    }

    #[test]
    fn test_blocks_ignore_partial_tail() {
        let mut payload = std::vec::Vec::from(block_bytes(3, 0x44));
        payload.extend_from_slice(&[9, 9, 9]);
        assert_eq!(blocks(&payload).count(), 1);
    }

    #[test]
    fn test_block_wire_bytes() {
        let block = DiffBlock::new(5, [0x11; 8]).unwrap();
        assert_eq!(block.to_bytes(), block_bytes(5, 0x11));
        assert_eq!(block.range(), 40..48);
    }

    #[test]
    fn test_encoder_static_screen_sends_forced_block_only() {
        let mut encoder = DiffEncoder::new();
        let blank = [0u8; FRAME_SIZE];

        let frame = encoder.encode(&blank, false);
        assert_eq!(&frame[..5], &[0xAA, 0x55, 0x02, 0x00, 0x09]);
        assert_eq!(frame[5], 0); // forced block 0
        assert_eq!(frame.last(), Some(&FRAME_TRAILER));
        assert_eq!(frame.len(), 5 + 9 + 1);

        let frame = encoder.encode(&blank, false);
        assert_eq!(frame[5], 1); // pointer advanced
    }

    #[test]
    fn test_encoder_forced_pointer_wraps() {
        let mut encoder = DiffEncoder::new();
        let blank = [0u8; FRAME_SIZE];
        for _ in 0..BLOCK_COUNT {
            encoder.encode(&blank, false);
        }
        assert_eq!(encoder.forced_block(), 0);
    }

    #[test]
    fn test_encoder_sends_changed_blocks_in_order() {
        let mut encoder = DiffEncoder::new();
        let mut screen = [0u8; FRAME_SIZE];
        screen[block_range(9)].fill(0x5A);
        screen[block_range(100)][0] = 0x01;

        let frame = encoder.encode(&screen, false);
        let payload = &frame[HEADER_SIZE..frame.len() - 1];
        let indices: std::vec::Vec<u8> = blocks(payload).map(|b| b.unwrap().index).collect();

        assert_eq!(indices, [0, 9, 100]);
        assert_eq!(encoder.previous(), &screen);
    }

    #[test]
    fn test_encoder_force_sends_everything() {
        let mut encoder = DiffEncoder::new();
        let frame = encoder.encode(&[0xFF; FRAME_SIZE], true);

        assert_eq!(frame.len(), MAX_DIFF_FRAME_SIZE);
        assert_eq!(&frame[3..5], &(1152u16).to_be_bytes());
    }
}
