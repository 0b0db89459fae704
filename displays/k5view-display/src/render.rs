//! Bit-to-pixel expansion
//!
//! The framebuffer is row-major with one bit per pixel: pixel `(x, y)` is
//! bit `y * 128 + x`, and bit 0 of a byte is the lowest pixel index.

use k5view_protocol::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// State of bit `bit_index`; off past the end of `framebuffer`
#[inline]
pub fn bit_at(framebuffer: &[u8], bit_index: usize) -> bool {
    framebuffer
        .get(bit_index / 8)
        .is_some_and(|byte| (byte >> (bit_index % 8)) & 1 == 1)
}

/// State of pixel `(x, y)`; off outside the screen
#[inline]
pub fn pixel_at(framebuffer: &[u8], x: usize, y: usize) -> bool {
    x < SCREEN_WIDTH && y < SCREEN_HEIGHT && bit_at(framebuffer, y * SCREEN_WIDTH + x)
}

/// Lit pixels in scan order (row by row, left to right)
pub fn lit_pixels(framebuffer: &[u8]) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..SCREEN_WIDTH * SCREEN_HEIGHT)
        .filter(move |&bit| bit_at(framebuffer, bit))
        .map(|bit| (bit % SCREEN_WIDTH, bit / SCREEN_WIDTH))
}

/// 128x64 expanded pixel states
#[derive(Clone, PartialEq, Eq)]
pub struct PixelGrid {
    rows: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

impl PixelGrid {
    /// Pixel state; off outside the grid
    pub fn is_on(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// One row, left to right
    pub fn row(&self, y: usize) -> Option<&[bool; SCREEN_WIDTH]> {
        self.rows.get(y)
    }

    /// All rows, top to bottom
    pub fn rows(&self) -> &[[bool; SCREEN_WIDTH]; SCREEN_HEIGHT] {
        &self.rows
    }

    /// Number of lit pixels
    pub fn lit_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&on| on).count()
    }
}

impl core::fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelGrid")
            .field("lit", &self.lit_count())
            .finish()
    }
}

/// Expand a framebuffer into a pixel grid
///
/// A short buffer renders its missing bytes as off.
pub fn render(framebuffer: &[u8]) -> PixelGrid {
    let mut rows = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];
    for (y, row) in rows.iter_mut().enumerate() {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = bit_at(framebuffer, y * SCREEN_WIDTH + x);
        }
    }
    PixelGrid { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k5view_protocol::FRAME_SIZE;
    use proptest::prelude::*;

    #[test]
    fn test_lsb_is_first_pixel() {
        let mut fb = [0u8; FRAME_SIZE];
        fb[0] = 0b0000_0001;

        let grid = render(&fb);
        assert!(grid.is_on(0, 0));
        for x in 1..8 {
            assert!(!grid.is_on(x, 0));
        }
        assert_eq!(grid.lit_count(), 1);
    }

    #[test]
    fn test_row_major_layout() {
        let mut fb = [0u8; FRAME_SIZE];
        // Byte 16 starts row 1
        fb[16] = 0b1000_0000;
        fb[FRAME_SIZE - 1] = 0b1000_0000;

        let grid = render(&fb);
        assert!(grid.is_on(7, 1));
        assert!(grid.is_on(127, 63));
        assert_eq!(grid.lit_count(), 2);
    }

    #[test]
    fn test_bit_past_end_is_off() {
        let fb = [0xFFu8; 4];
        assert!(bit_at(&fb, 31));
        assert!(!bit_at(&fb, 32));
        assert!(!bit_at(&[], 0));
    }

    #[test]
    fn test_short_buffer_renders_off() {
        let grid = render(&[0xFF; 16]);
        assert!(grid.row(0).unwrap().iter().all(|&on| on));
        assert!(grid.row(1).unwrap().iter().all(|&on| !on));
        assert_eq!(grid.lit_count(), 128);
    }

    #[test]
    fn test_out_of_grid_is_off() {
        let grid = render(&[0xFF; FRAME_SIZE]);
        assert!(grid.is_on(127, 63));
        assert!(!grid.is_on(128, 0));
        assert!(!grid.is_on(0, 64));
        assert!(grid.row(64).is_none());
        assert!(!pixel_at(&[0xFF; FRAME_SIZE], 128, 0));
    }

    #[test]
    fn test_lit_pixels_scan_order() {
        let mut fb = [0u8; FRAME_SIZE];
        fb[0] = 0b0000_0100;
        fb[20] = 0b0000_0001;
        let lit: Vec<_> = lit_pixels(&fb).collect();
        assert_eq!(lit, [(2, 0), (32, 1)]);
    }

    proptest! {
        #[test]
        fn prop_grid_matches_bits(fb in proptest::collection::vec(any::<u8>(), FRAME_SIZE)) {
            let grid = render(&fb);
            let ones: usize = fb.iter().map(|b| b.count_ones() as usize).sum();
            prop_assert_eq!(grid.lit_count(), ones);
            for (x, y) in lit_pixels(&fb) {
                prop_assert!(grid.is_on(x, y));
            }
        }
    }
}
