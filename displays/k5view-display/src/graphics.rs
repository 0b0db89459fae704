//! embedded-graphics drawables
//!
//! [`FramebufferImage`] blits a snapshot 1:1 onto any binary-color target,
//! such as a 128x64 OLED. [`ScaledImage`] draws it enlarged for color
//! targets, one rectangle per lit pixel.

use embedded_graphics::pixelcolor::{BinaryColor, Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use k5view_protocol::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::render::{bit_at, lit_pixels};

const WIDTH: u32 = SCREEN_WIDTH as u32;
const HEIGHT: u32 = SCREEN_HEIGHT as u32;

/// Framebuffer drawn one display pixel per screen pixel
#[derive(Debug, Clone, Copy)]
pub struct FramebufferImage<'a> {
    framebuffer: &'a Framebuffer,
    top_left: Point,
    invert: bool,
}

impl<'a> FramebufferImage<'a> {
    /// Image at the origin
    pub fn new(framebuffer: &'a Framebuffer) -> Self {
        Self {
            framebuffer,
            top_left: Point::zero(),
            invert: false,
        }
    }

    /// Move the image
    pub fn at(mut self, top_left: Point) -> Self {
        self.top_left = top_left;
        self
    }

    /// Draw lit pixels as `Off`
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }
}

impl OriginDimensions for FramebufferImage<'_> {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl Drawable for FramebufferImage<'_> {
    type Color = BinaryColor;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let pixels = (0..SCREEN_WIDTH * SCREEN_HEIGHT).map(|bit| {
            let x = (bit % SCREEN_WIDTH) as i32;
            let y = (bit / SCREEN_WIDTH) as i32;
            let on = bit_at(self.framebuffer, bit) != self.invert;
            Pixel(self.top_left + Point::new(x, y), BinaryColor::from(on))
        });
        target.draw_iter(pixels)
    }
}

/// Enlargement factor for [`ScaledImage`]
///
/// A scale of `n` draws each pixel as an `(n - 1) x n` cell, which keeps
/// the K5 LCD's slightly tall pixel aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelScale(u8);

impl PixelScale {
    /// Smallest scale
    pub const MIN: u8 = 2;
    /// Largest scale
    pub const MAX: u8 = 11;

    /// Scale `n`, if within `MIN..=MAX`
    pub const fn new(n: u8) -> Option<Self> {
        if n >= Self::MIN && n <= Self::MAX {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Raw factor
    pub const fn get(self) -> u8 {
        self.0
    }

    /// One step larger, stopping at `MAX`
    pub fn larger(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }

    /// One step smaller, stopping at `MIN`
    pub fn smaller(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN))
    }

    /// Size of one screen pixel
    pub fn cell_size(self) -> Size {
        Size::new(u32::from(self.0) - 1, u32::from(self.0))
    }

    /// Size of the whole scaled screen
    pub fn canvas_size(self) -> Size {
        let cell = self.cell_size();
        Size::new(WIDTH * cell.width, HEIGHT * cell.height)
    }
}

impl Default for PixelScale {
    fn default() -> Self {
        Self(4)
    }
}

/// Foreground and background colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette<C> {
    /// Lit pixels
    pub foreground: C,
    /// Everything else
    pub background: C,
}

impl<C: PixelColor> Palette<C> {
    /// Swap foreground and background
    pub fn inverted(self) -> Self {
        Self {
            foreground: self.background,
            background: self.foreground,
        }
    }
}

impl Palette<Rgb888> {
    /// Grey backlight
    pub const GREY: Self = Self {
        foreground: Rgb888::BLACK,
        background: Rgb888::new(202, 202, 202),
    };
    /// Orange backlight
    pub const ORANGE: Self = Self {
        foreground: Rgb888::BLACK,
        background: Rgb888::new(255, 180, 100),
    };
    /// Blue backlight
    pub const BLUE: Self = Self {
        foreground: Rgb888::BLACK,
        background: Rgb888::new(24, 116, 205),
    };
}

impl Default for Palette<Rgb888> {
    fn default() -> Self {
        Self::GREY
    }
}

/// Framebuffer drawn enlarged: background fill plus one cell per lit pixel
#[derive(Debug, Clone, Copy)]
pub struct ScaledImage<'a, C> {
    framebuffer: &'a Framebuffer,
    top_left: Point,
    scale: PixelScale,
    palette: Palette<C>,
}

impl<'a, C: PixelColor> ScaledImage<'a, C> {
    /// Image at the origin
    pub fn new(framebuffer: &'a Framebuffer, scale: PixelScale, palette: Palette<C>) -> Self {
        Self {
            framebuffer,
            top_left: Point::zero(),
            scale,
            palette,
        }
    }

    /// Move the image
    pub fn at(mut self, top_left: Point) -> Self {
        self.top_left = top_left;
        self
    }

    /// Area covered by screen pixel `(x, y)`
    pub fn cell(&self, x: usize, y: usize) -> Rectangle {
        let size = self.scale.cell_size();
        let offset = Point::new(
            x as i32 * size.width as i32,
            y as i32 * size.height as i32,
        );
        Rectangle::new(self.top_left + offset, size)
    }
}

impl<C: PixelColor> OriginDimensions for ScaledImage<'_, C> {
    fn size(&self) -> Size {
        self.scale.canvas_size()
    }
}

impl<C: PixelColor> Drawable for ScaledImage<'_, C> {
    type Color = C;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let canvas = Rectangle::new(self.top_left, self.scale.canvas_size());
        target.fill_solid(&canvas, self.palette.background)?;

        for (x, y) in lit_pixels(self.framebuffer) {
            target.fill_solid(&self.cell(x, y), self.palette.foreground)?;
        }
        Ok(())
    }
}
