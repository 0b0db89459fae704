//! SH1106 OLED Display Driver
//!
//! Driver for 128x64 SH1106-based OLED displays via I2C. Keeps a page buffer
//! that is loaded from a mirrored framebuffer, optionally drawn over with
//! embedded-graphics, then flushed page by page.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use k5view_display::{to_pages, PageBuffer, PAGES};
use k5view_protocol::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};

/// SH1106 I2C address (typically 0x3C or 0x3D)
const SH1106_ADDR: u8 = 0x3C;

/// The SH1106 has 132 columns; a 128 pixel panel starts at column 2
const COLUMN_OFFSET: u8 = 2;

/// SH1106 commands
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
}

/// SH1106 OLED driver
pub struct Sh1106<I2C> {
    i2c: I2C,
    /// Display memory image, one byte per 8-pixel column
    buffer: PageBuffer,
}

impl<I2C> Sh1106<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    /// Create a new SH1106 driver
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            buffer: [[0; SCREEN_WIDTH]; PAGES],
        }
    }

    /// Initialize the display
    pub async fn init(&mut self, contrast: u8, inverted: bool) -> Result<(), I2C::Error> {
        let init_cmds: &[u8] = &[
            cmd::DISPLAY_OFF,
            cmd::SET_CLOCK_DIV,
            0x80, // Default clock
            cmd::SET_MUX_RATIO,
            0x3F, // 64 lines
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE,
            cmd::SET_CHARGE_PUMP,
            0x14,                  // Enable charge pump
            cmd::SET_SEG_REMAP,    // Flip horizontally
            cmd::SET_COM_SCAN_DEC, // Flip vertically
            cmd::SET_COM_PINS,
            0x12, // Alternative COM config
            cmd::SET_PRECHARGE,
            0xF1,
            cmd::SET_VCOM_DETECT,
            0x40,
        ];

        for &c in init_cmds {
            self.command(c).await?;
        }

        self.set_contrast(contrast).await?;
        self.set_inverted(inverted).await?;
        self.command(cmd::DISPLAY_ON).await
    }

    /// Send a command to the display
    async fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.i2c.write(SH1106_ADDR, &[0x00, cmd]).await
    }

    /// Replace the page buffer with a mirrored framebuffer
    pub fn load_framebuffer(&mut self, framebuffer: &Framebuffer) {
        self.buffer = to_pages(framebuffer);
    }

    /// Flush the page buffer to the display
    pub async fn flush(&mut self) -> Result<(), I2C::Error> {
        for page in 0..PAGES {
            self.command(cmd::SET_PAGE_ADDR | page as u8).await?;
            self.command(cmd::SET_LOW_COLUMN | COLUMN_OFFSET).await?;
            self.command(cmd::SET_HIGH_COLUMN).await?;

            let mut data = [0u8; SCREEN_WIDTH + 1];
            data[0] = 0x40; // Data mode
            data[1..].copy_from_slice(&self.buffer[page]);
            self.i2c.write(SH1106_ADDR, &data).await?;
        }

        Ok(())
    }

    /// Set display contrast (0-255)
    pub async fn set_contrast(&mut self, contrast: u8) -> Result<(), I2C::Error> {
        self.command(cmd::SET_CONTRAST).await?;
        self.command(contrast).await
    }

    /// Invert display colors
    pub async fn set_inverted(&mut self, inverted: bool) -> Result<(), I2C::Error> {
        if inverted {
            self.command(cmd::SET_INVERSE).await
        } else {
            self.command(cmd::SET_NORMAL).await
        }
    }
}

impl<I2C> OriginDimensions for Sh1106<I2C> {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
    }
}

/// Draws into the page buffer; nothing reaches the panel until `flush`
impl<I2C> DrawTarget for Sh1106<I2C> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
                continue;
            };
            if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
                continue;
            }

            let mask = 1 << (y % 8);
            let column = &mut self.buffer[y / 8][x];
            if color.is_on() {
                *column |= mask;
            } else {
                *column &= !mask;
            }
        }
        Ok(())
    }
}
