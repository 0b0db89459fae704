//! K5 UART receive task
//!
//! Feeds the screen mirror stream into the frame parser and commits every
//! complete frame to the shared framebuffer.

use defmt::*;
use embassy_rp::uart::{self, BufferedUartRx};
use embassy_time::{with_timeout, Duration, Instant};
use embedded_io_async::Read;

use k5view_core::{FrameEvent, LinkConfig, LinkMonitor, LinkStatus};
use k5view_protocol::{Frame, FrameError, FrameParser, Step};

use crate::channels::{FRAMEBUFFER, FRAME_DECODED, LINK_STATUS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// RX task - decodes frames from the radio
#[embassy_executor::task]
pub async fn uart_rx_task(
    mut rx: BufferedUartRx,
    parser: &'static mut FrameParser,
    link_config: LinkConfig,
    read_timeout_ms: u32,
) {
    info!("UART RX task started");

    parser.reset();
    let mut link = LinkMonitor::new(link_config);
    let timeout = Duration::from_millis(read_timeout_ms.into());
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match with_timeout(timeout, rx.read(&mut buf)).await {
            Ok(Ok(n)) => {
                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Step::Frame(header)) => {
                            let frame = Frame {
                                header,
                                payload: parser.payload(),
                            };
                            commit(&frame, &mut link);
                        }
                        Ok(_) => {}
                        Err(e) => dropped(e, &mut link),
                    }
                }
            }
            Ok(Err(uart::Error::Break)) => {
                error!("UART break condition, stopping receiver");
                LINK_STATUS.signal(LinkStatus::NoSignal);
                return;
            }
            Ok(Err(e)) => {
                warn!("UART read error: {:?}", e);
                if let Some(err) = parser.abort() {
                    dropped(err, &mut link);
                }
            }
            Err(_) => {
                // Read timed out
                match parser.abort() {
                    Some(err) => dropped(err, &mut link),
                    None => publish(link.record_idle()),
                }
            }
        }
    }
}

/// Apply a frame to the shared framebuffer and wake the display
fn commit(frame: &Frame<'_>, link: &mut LinkMonitor) {
    match FRAMEBUFFER.apply(frame) {
        Ok(event) => {
            if let FrameEvent::Diff(report) = event {
                if let Some(err) = report.error() {
                    warn!("Diff truncated after {} blocks: {:?}", report.applied, err);
                }
            }
            trace!("Frame: {:?}", event);
            FRAME_DECODED.signal(());
            publish(link.record_frame(Instant::now().as_millis()));
        }
        Err(e) => dropped(e, link),
    }
}

fn dropped(err: FrameError, link: &mut LinkMonitor) {
    warn!("Dropped frame: {:?}", err);
    publish(link.record_idle());
}

fn publish(change: Option<LinkStatus>) {
    if let Some(status) = change {
        match status {
            LinkStatus::NoSignal => info!("Link lost"),
            LinkStatus::Receiving { fps_x10 } => {
                info!("Receiving: {}.{} fps", fps_x10 / 10, fps_x10 % 10)
            }
        }
        LINK_STATUS.signal(status);
    }
}
