//! Push-mode frame parser
//!
//! [`FrameParser`] consumes the stream one byte at a time. It never assumes
//! alignment survives an error: every failure drops back to marker search
//! and the following bytes are scanned like any other noise.

use heapless::Vec;

use crate::frame::{FrameError, FrameHeader, FRAME_MARKER, MAX_PAYLOAD_SIZE};

/// What the parser produced for the byte just fed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Byte consumed, nothing to report
    Pending,
    /// A valid header completed; its payload follows
    Header(FrameHeader),
    /// A frame completed; read it with [`FrameParser::payload`]
    Frame(FrameHeader),
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    header: [u8; 3],
    header_len: usize,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the first marker byte (0xAA)
    SeekMarkerHigh,
    /// Got 0xAA, waiting for 0x55
    SeekMarkerLow,
    /// Got the marker, collecting type and length
    ReadHeader,
    /// Collecting payload bytes for a validated header
    ReadPayload(FrameHeader),
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub const fn new() -> Self {
        Self {
            state: ParseState::SeekMarkerHigh,
            header: [0; 3],
            header_len: 0,
            payload: Vec::new(),
        }
    }

    /// Reset the parser state, dropping any partial frame
    pub fn reset(&mut self) {
        self.restart();
        self.payload.clear();
    }

    /// Back to marker search, keeping the last completed payload
    fn restart(&mut self) {
        self.state = ParseState::SeekMarkerHigh;
        self.header_len = 0;
    }

    /// Abandon the frame in progress because the stream stalled or ended
    ///
    /// Returns the truncation error if a marker had already been matched.
    /// A lone 0xAA is not a frame yet and is dropped silently.
    pub fn abort(&mut self) -> Option<FrameError> {
        let error = match self.state {
            ParseState::SeekMarkerHigh | ParseState::SeekMarkerLow => None,
            ParseState::ReadHeader => Some(FrameError::TruncatedHeader),
            ParseState::ReadPayload(_) => Some(FrameError::TruncatedPayload),
        };
        self.reset();
        error
    }

    /// True while no marker has been matched
    pub fn is_seeking(&self) -> bool {
        matches!(
            self.state,
            ParseState::SeekMarkerHigh | ParseState::SeekMarkerLow
        )
    }

    /// Header whose payload is currently being collected
    pub fn pending_header(&self) -> Option<FrameHeader> {
        match self.state {
            ParseState::ReadPayload(header) => Some(header),
            _ => None,
        }
    }

    /// Payload of the last completed frame
    ///
    /// Valid after [`Step::Frame`] until the next header completes or the
    /// parser is reset or aborted. Empty otherwise.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Err` when a header fails validation. The parser is already
    /// back in marker search by then, so the caller just keeps feeding.
    pub fn feed(&mut self, byte: u8) -> Result<Step, FrameError> {
        match self.state {
            ParseState::SeekMarkerHigh => {
                if byte == FRAME_MARKER[0] {
                    self.state = ParseState::SeekMarkerLow;
                }
                // Silently ignore noise while waiting
                Ok(Step::Pending)
            }
            ParseState::SeekMarkerLow => {
                if byte == FRAME_MARKER[1] {
                    self.header_len = 0;
                    self.state = ParseState::ReadHeader;
                } else if byte != FRAME_MARKER[0] {
                    self.state = ParseState::SeekMarkerHigh;
                }
                // A repeated 0xAA stays a candidate first marker byte
                Ok(Step::Pending)
            }
            ParseState::ReadHeader => {
                self.header[self.header_len] = byte;
                self.header_len += 1;
                if self.header_len < self.header.len() {
                    return Ok(Step::Pending);
                }

                self.restart();
                let header = FrameHeader::from_bytes(self.header)?;
                header.validate()?;

                self.payload.clear();
                if header.payload_len == 0 {
                    Ok(Step::Frame(header))
                } else {
                    self.state = ParseState::ReadPayload(header);
                    Ok(Step::Header(header))
                }
            }
            ParseState::ReadPayload(header) => {
                // Cannot overflow: validated lengths never exceed MAX_PAYLOAD_SIZE
                let _ = self.payload.push(byte);
                if self.payload.len() < header.payload_size() {
                    return Ok(Step::Pending);
                }

                self.restart();
                Ok(Step::Frame(header))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Stops at the first completed frame and returns its header together
    /// with the number of bytes consumed. Remaining bytes are not consumed.
    /// Header validation errors are skipped over like noise.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Option<FrameHeader>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Ok(Step::Frame(header)) = self.feed(byte) {
                return (Some(header), i + 1);
            }
        }
        (None, bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_frame, FrameType, FRAME_SIZE};
    use proptest::prelude::*;

    fn screenshot_frame(fill: u8) -> std::vec::Vec<u8> {
        let mut buf = std::vec![0u8; 5 + FRAME_SIZE];
        let len = encode_frame(FrameType::Screenshot, &[fill; FRAME_SIZE], &mut buf).unwrap();
        buf.truncate(len);
        buf
    }

    /// Feed everything, collecting (header, payload) for each frame
    fn parse_all(
        parser: &mut FrameParser,
        bytes: &[u8],
    ) -> std::vec::Vec<(FrameHeader, std::vec::Vec<u8>)> {
        let mut frames = std::vec::Vec::new();
        for &byte in bytes {
            if let Ok(Step::Frame(header)) = parser.feed(byte) {
                frames.push((header, parser.payload().to_vec()));
            }
        }
        frames
    }

    #[test]
    fn test_parse_screenshot() {
        let mut parser = FrameParser::new();
        let frames = parse_all(&mut parser, &screenshot_frame(0xFF));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, FrameHeader::screenshot());
        assert!(frames[0].1.iter().all(|&b| b == 0xFF));
        assert!(parser.is_seeking());
    }

    #[test]
    fn test_header_step_precedes_payload() {
        let mut parser = FrameParser::new();
        let steps: std::vec::Vec<_> = [0xAA, 0x55, 0x02, 0x00, 0x09]
            .iter()
            .map(|&b| parser.feed(b).unwrap())
            .collect();

        assert_eq!(
            steps.last(),
            Some(&Step::Header(FrameHeader::new(FrameType::Diff, 9)))
        );
        assert_eq!(
            parser.pending_header(),
            Some(FrameHeader::new(FrameType::Diff, 9))
        );
    }

    #[test]
    fn test_empty_diff_completes_at_header() {
        let mut parser = FrameParser::new();
        let (header, used) = parser.feed_bytes(&[0xAA, 0x55, 0x02, 0x00, 0x00, 0xFF]);

        assert_eq!(header, Some(FrameHeader::new(FrameType::Diff, 0)));
        assert_eq!(used, 5);
        assert!(parser.payload().is_empty());
    }

    #[test]
    fn test_overlapping_marker() {
        // AA AA 55: the second AA restarts the marker
        let mut parser = FrameParser::new();
        let bytes = [0xAA, 0xAA, 0x55, 0x02, 0x00, 0x00];
        let (header, _) = parser.feed_bytes(&bytes);
        assert_eq!(header, Some(FrameHeader::new(FrameType::Diff, 0)));
    }

    #[test]
    fn test_broken_marker_restarts_search() {
        let mut parser = FrameParser::new();
        let bytes = [0xAA, 0x12, 0x55, 0x02, 0x00, 0x00];
        let (header, used) = parser.feed_bytes(&bytes);
        assert_eq!(header, None);
        assert_eq!(used, bytes.len());
        assert!(parser.is_seeking());
    }

    #[test]
    fn test_invalid_length_resyncs_after_header() {
        let mut parser = FrameParser::new();
        let mut result = Ok(Step::Pending);
        for byte in [0xAA, 0x55, 0x01, 0x00, 0x10] {
            result = parser.feed(byte);
        }
        assert_eq!(
            result,
            Err(FrameError::InvalidLength {
                frame_type: FrameType::Screenshot,
                len: 16
            })
        );
        assert!(parser.is_seeking());

        // The declared payload is not skipped: a frame inside it is found
        let (header, _) = parser.feed_bytes(&[0x00, 0xAA, 0x55, 0x02, 0x00, 0x00]);
        assert_eq!(header, Some(FrameHeader::new(FrameType::Diff, 0)));
    }

    #[test]
    fn test_unknown_type_resyncs() {
        let mut parser = FrameParser::new();
        let mut result = Ok(Step::Pending);
        for byte in [0xAA, 0x55, 0x7F] {
            result = parser.feed(byte);
        }
        assert_eq!(result, Ok(Step::Pending));
        for byte in [0x00, 0x00] {
            result = parser.feed(byte);
        }
        assert_eq!(result, Err(FrameError::UnknownType(0x7F)));
        assert!(parser.is_seeking());
    }

    #[test]
    fn test_abort_reports_truncation() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.abort(), None);

        parser.feed(0xAA).unwrap();
        assert_eq!(parser.abort(), None);

        parser.feed_bytes(&[0xAA, 0x55, 0x01]);
        assert_eq!(parser.abort(), Some(FrameError::TruncatedHeader));

        parser.feed_bytes(&[0xAA, 0x55, 0x01, 0x04, 0x00, 0x12, 0x34]);
        assert_eq!(parser.abort(), Some(FrameError::TruncatedPayload));
        assert!(parser.is_seeking());
    }

    #[test]
    fn test_abort_discards_partial_payload() {
        let mut parser = FrameParser::new();
        parser.feed_bytes(&[0xAA, 0x55, 0x02, 0x00, 0x09, 0x05, 0x11, 0x22]);
        assert_eq!(parser.payload(), &[0x05, 0x11, 0x22]);

        assert_eq!(parser.abort(), Some(FrameError::TruncatedPayload));
        assert!(parser.payload().is_empty());
    }

    #[test]
    fn test_reset_clears_completed_payload() {
        let mut parser = FrameParser::new();
        let (header, _) = parser.feed_bytes(&screenshot_frame(0x5A));
        assert_eq!(header, Some(FrameHeader::screenshot()));
        assert_eq!(parser.payload().len(), FRAME_SIZE);

        parser.reset();
        assert!(parser.payload().is_empty());
    }

    #[test]
    fn test_marker_byte_run_before_frame() {
        let mut stream = std::vec![0x13, 0xAA, 0x00, 0xAA, 0xAA, 0xAA];
        stream.extend_from_slice(&screenshot_frame(0x42));

        let mut parser = FrameParser::new();
        let frames = parse_all(&mut parser, &stream);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].1.iter().all(|&b| b == 0x42));
    }

    #[test]
    fn test_diff_trailer_is_noise() {
        let mut stream = std::vec::Vec::new();
        for index in [3u8, 7] {
            stream.extend_from_slice(&[0xAA, 0x55, 0x02, 0x00, 0x09, index]);
            stream.extend_from_slice(&[index; 8]);
            stream.push(0x0A);
        }

        let mut parser = FrameParser::new();
        let frames = parse_all(&mut parser, &stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].1[0], 3);
        assert_eq!(frames[1].1[0], 7);
    }

    proptest! {
        #[test]
        fn prop_garbage_before_frame_is_skipped(
            garbage in proptest::collection::vec(
                // 0xAA may appear, a full marker never does
                any::<u8>().prop_map(|b| if b == 0x55 { 0x54 } else { b }),
                0..256,
            ),
            fill in any::<u8>(),
        ) {
            let mut stream = garbage;
            stream.extend_from_slice(&screenshot_frame(fill));

            let mut parser = FrameParser::new();
            let frames = parse_all(&mut parser, &stream);

            prop_assert_eq!(frames.len(), 1);
            prop_assert!(frames[0].1.iter().all(|&b| b == fill));
        }

        #[test]
        fn prop_split_point_does_not_matter(
            split in 0usize..(5 + FRAME_SIZE),
            fill in any::<u8>(),
        ) {
            let frame = screenshot_frame(fill);
            let mut parser = FrameParser::new();

            let (first, used) = parser.feed_bytes(&frame[..split]);
            prop_assert_eq!(first, None);
            prop_assert_eq!(used, split);

            let (second, _) = parser.feed_bytes(&frame[split..]);
            prop_assert_eq!(second, Some(FrameHeader::screenshot()));
        }
    }
}
