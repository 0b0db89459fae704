//! Display update task
//!
//! Redraws the OLED from a framebuffer snapshot whenever a frame lands or
//! the link status changes.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::i2c::{Async, I2c};
use embassy_rp::peripherals::I2C0;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use k5view_core::LinkStatus;

use crate::channels::{FRAMEBUFFER, FRAME_DECODED, LINK_STATUS};
use crate::sh1106::Sh1106;

pub type Display = Sh1106<I2c<'static, I2C0, Async>>;

/// Display task - mirrors the shared framebuffer onto the OLED
#[embassy_executor::task]
pub async fn display_task(mut display: Display) {
    info!("Display task started");

    let mut link = LinkStatus::NoSignal;
    redraw(&mut display, link).await;

    loop {
        match select(FRAME_DECODED.wait(), LINK_STATUS.wait()).await {
            Either::First(()) => {}
            Either::Second(status) => link = status,
        }

        redraw(&mut display, link).await;
    }
}

async fn redraw(display: &mut Display, link: LinkStatus) {
    let snapshot = FRAMEBUFFER.snapshot();
    display.load_framebuffer(&snapshot);

    if link == LinkStatus::NoSignal {
        draw_no_signal(display);
    }

    match display.flush().await {
        Ok(()) => trace!("Display updated"),
        Err(e) => warn!("Display flush failed: {:?}", e),
    }
}

/// Boxed "NO SIGNAL" banner over the last frame
fn draw_no_signal(display: &mut Display) {
    let frame = PrimitiveStyleBuilder::new()
        .fill_color(BinaryColor::Off)
        .stroke_color(BinaryColor::On)
        .stroke_width(1)
        .build();
    let text = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let layout = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();

    // Drawing into the page buffer cannot fail
    let _ = Rectangle::new(Point::new(28, 24), Size::new(72, 16))
        .into_styled(frame)
        .draw(display);
    let _ = Text::with_text_style("NO SIGNAL", Point::new(64, 32), text, layout).draw(display);
}
