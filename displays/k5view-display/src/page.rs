//! Controller page layout
//!
//! The K5's ST7565 LCD and the SH1106 OLED both address their memory as 8
//! pages of 128 column bytes. Bit `n` of column byte `x` in page `p` is
//! pixel `(x, p * 8 + n)`. On the radio, page 0 holds the status line.

use k5view_protocol::{Framebuffer, FRAME_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Number of 8-pixel-high pages
pub const PAGES: usize = SCREEN_HEIGHT / 8;

/// Display memory in page order
pub type PageBuffer = [[u8; SCREEN_WIDTH]; PAGES];

/// Pack page memory into the row-major wire framebuffer
pub fn from_pages(pages: &PageBuffer) -> Framebuffer {
    let mut framebuffer = [0u8; FRAME_SIZE];
    for (page, columns) in pages.iter().enumerate() {
        for (x, &column) in columns.iter().enumerate() {
            for n in 0..8 {
                if column & (1 << n) != 0 {
                    let bit = (page * 8 + n) * SCREEN_WIDTH + x;
                    framebuffer[bit / 8] |= 1 << (bit % 8);
                }
            }
        }
    }
    framebuffer
}

/// Unpack a wire framebuffer into page memory
pub fn to_pages(framebuffer: &Framebuffer) -> PageBuffer {
    let mut pages = [[0u8; SCREEN_WIDTH]; PAGES];
    for (page, columns) in pages.iter_mut().enumerate() {
        for (x, column) in columns.iter_mut().enumerate() {
            for n in 0..8 {
                let bit = (page * 8 + n) * SCREEN_WIDTH + x;
                if framebuffer[bit / 8] & (1 << (bit % 8)) != 0 {
                    *column |= 1 << n;
                }
            }
        }
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pixel_at;
    use proptest::prelude::*;

    #[test]
    fn test_status_line_is_top_rows() {
        let mut pages = [[0u8; SCREEN_WIDTH]; PAGES];
        // Column 0 of the status line, top pixel
        pages[0][0] = 0b0000_0001;
        // Column 5, bottom pixel of the status line
        pages[0][5] = 0b1000_0000;

        let fb = from_pages(&pages);
        assert!(pixel_at(&fb, 0, 0));
        assert!(pixel_at(&fb, 5, 7));
        assert_eq!(fb[0], 0b0000_0001);
        // Row 7 starts at byte 112
        assert_eq!(fb[112], 0b0010_0000);
    }

    #[test]
    fn test_full_page_is_eight_rows() {
        let mut pages = [[0u8; SCREEN_WIDTH]; PAGES];
        pages[7] = [0xFF; SCREEN_WIDTH];

        let fb = from_pages(&pages);
        assert!(fb[..896].iter().all(|&b| b == 0));
        assert!(fb[896..].iter().all(|&b| b == 0xFF));
    }

    proptest! {
        #[test]
        fn prop_pages_preserve_pixels(bytes in proptest::collection::vec(any::<u8>(), FRAME_SIZE)) {
            let mut fb = [0u8; FRAME_SIZE];
            fb.copy_from_slice(&bytes);

            let pages = to_pages(&fb);
            for (page, columns) in pages.iter().enumerate() {
                for (x, &column) in columns.iter().enumerate() {
                    for n in 0..8 {
                        prop_assert_eq!(column & (1 << n) != 0, pixel_at(&fb, x, page * 8 + n));
                    }
                }
            }
            prop_assert_eq!(from_pages(&pages), fb);
        }
    }
}
