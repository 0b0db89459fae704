//! Frame layout, header validation and encoding
//!
//! Frame format:
//! - MARKER (2 bytes): 0xAA 0x55 synchronization sequence
//! - TYPE (1 byte): 0x01 screenshot, 0x02 diff
//! - LENGTH (2 bytes): payload length, big-endian
//! - PAYLOAD (LENGTH bytes): type-specific data

use crate::diff::DIFF_BLOCK_SIZE;

/// Frame synchronization sequence
pub const FRAME_MARKER: [u8; 2] = [0xAA, 0x55];

/// Marker + type + length
pub const HEADER_SIZE: usize = 5;

/// Screen width in pixels
pub const SCREEN_WIDTH: usize = 128;

/// Screen height in pixels
pub const SCREEN_HEIGHT: usize = 64;

/// Framebuffer size in bytes (one bit per pixel)
pub const FRAME_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT / 8;

/// Largest payload a valid header can announce
///
/// Screenshots are always [`FRAME_SIZE`]; diffs may carry any whole number
/// of blocks that fits the 16-bit length field.
pub const MAX_PAYLOAD_SIZE: usize = (u16::MAX as usize / DIFF_BLOCK_SIZE) * DIFF_BLOCK_SIZE;

/// Packed 128x64 bitmap, bit index `y * 128 + x`, LSB first within a byte
pub type Framebuffer = [u8; FRAME_SIZE];

/// Errors that can occur while decoding or encoding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Stream stalled or ended between the marker and the end of the header
    TruncatedHeader,
    /// Stream stalled or ended before the whole payload arrived
    TruncatedPayload,
    /// Frame type and announced length do not fit together
    InvalidLength { frame_type: FrameType, len: u16 },
    /// Type byte is neither screenshot nor diff
    UnknownType(u8),
    /// Diff block index outside `0..128`; the rest of the diff is ignored
    OutOfRangeBlockIndex(u8),
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Frame type carried in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameType {
    /// Full framebuffer
    Screenshot,
    /// Sparse block update
    Diff,
}

// Wire format values
const TYPE_SCREENSHOT: u8 = 0x01;
const TYPE_DIFF: u8 = 0x02;

impl FrameType {
    /// Parse a frame type from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TYPE_SCREENSHOT => Some(FrameType::Screenshot),
            TYPE_DIFF => Some(FrameType::Diff),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            FrameType::Screenshot => TYPE_SCREENSHOT,
            FrameType::Diff => TYPE_DIFF,
        }
    }
}

/// Header following the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    /// Frame type
    pub frame_type: FrameType,
    /// Announced payload length in bytes
    pub payload_len: u16,
}

impl FrameHeader {
    /// Create a header
    pub const fn new(frame_type: FrameType, payload_len: u16) -> Self {
        Self {
            frame_type,
            payload_len,
        }
    }

    /// Header for a full screenshot
    pub const fn screenshot() -> Self {
        Self::new(FrameType::Screenshot, FRAME_SIZE as u16)
    }

    /// Decode the three bytes after the marker: `[type][len_hi][len_lo]`
    ///
    /// Only the type is checked here; see [`FrameHeader::validate`].
    pub fn from_bytes(bytes: [u8; 3]) -> Result<Self, FrameError> {
        let frame_type = FrameType::from_byte(bytes[0]).ok_or(FrameError::UnknownType(bytes[0]))?;
        Ok(Self {
            frame_type,
            payload_len: u16::from_be_bytes([bytes[1], bytes[2]]),
        })
    }

    /// Check that the announced length is legal for the frame type
    ///
    /// Screenshots must carry exactly one framebuffer; diffs a whole
    /// number of 9-byte blocks (zero blocks is legal).
    pub fn validate(&self) -> Result<(), FrameError> {
        let len = self.payload_len as usize;
        let ok = match self.frame_type {
            FrameType::Screenshot => len == FRAME_SIZE,
            FrameType::Diff => len % DIFF_BLOCK_SIZE == 0,
        };

        if ok {
            Ok(())
        } else {
            Err(FrameError::InvalidLength {
                frame_type: self.frame_type,
                len: self.payload_len,
            })
        }
    }

    /// Payload length as a buffer size
    pub fn payload_size(&self) -> usize {
        self.payload_len as usize
    }

    /// Encode marker and header
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [hi, lo] = self.payload_len.to_be_bytes();
        [
            FRAME_MARKER[0],
            FRAME_MARKER[1],
            self.frame_type.to_byte(),
            hi,
            lo,
        ]
    }
}

/// A complete frame borrowed from a parser or receiver buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Validated header
    pub header: FrameHeader,
    /// Exactly `header.payload_len` bytes
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Frame type shortcut
    pub fn frame_type(&self) -> FrameType {
        self.header.frame_type
    }
}

/// Encode a frame into a byte buffer
///
/// The header is validated first, so this never produces a frame a
/// receiver would reject. Returns the number of bytes written.
pub fn encode_frame(
    frame_type: FrameType,
    payload: &[u8],
    buffer: &mut [u8],
) -> Result<usize, FrameError> {
    let payload_len = u16::try_from(payload.len()).map_err(|_| FrameError::InvalidLength {
        frame_type,
        len: u16::MAX,
    })?;
    let header = FrameHeader::new(frame_type, payload_len);
    header.validate()?;

    let frame_len = HEADER_SIZE + payload.len();
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buffer[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    buffer[HEADER_SIZE..frame_len].copy_from_slice(payload);

    Ok(frame_len)
}
