//! K5 Screen Mirror Firmware
//!
//! Firmware for an RP2040 board with a 128x64 SH1106 OLED. Listens to the
//! Quansheng K5 screenshot stream on UART0 and mirrors the radio's LCD.
//!
//! Wiring:
//! - GP1 (UART0 RX) <- K5 TX
//! - GP4 (I2C0 SDA), GP5 (I2C0 SCL) -> OLED

#![no_std]
#![no_main]

mod channels;
mod config;
mod sh1106;
mod tasks;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C0, UART0};
use embassy_rp::uart::{self, BufferedInterruptHandler, Uart};
use k5view_hal::{DataBits, Parity, StopBits, UartConfig};
use k5view_protocol::FrameParser;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use crate::sh1106::Sh1106;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// UART buffers (must live forever); TX is unused but required by the driver
static TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 2048]> = StaticCell::new();

// Frame parser with room for the largest legal payload, kept out of the task future
static PARSER: ConstStaticCell<FrameParser> = ConstStaticCell::new(FrameParser::new());

/// OLED bus speed
const I2C_FREQUENCY_HZ: u32 = 400_000;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("K5 screen mirror starting...");

    let p = embassy_rp::init(Default::default());
    let config = config::load();
    info!(
        "Config: {} baud, read timeout {} ms",
        config.uart.baudrate, config.uart.read_timeout_ms
    );

    // OLED on I2C0
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);

    let mut display = Sh1106::new(i2c);
    match display
        .init(config.display.contrast, config.display.invert)
        .await
    {
        Ok(()) => info!("OLED initialized"),
        Err(e) => error!("Failed to initialize display: {:?}", e),
    }

    // K5 link on UART0
    let tx_buf = &mut TX_BUF.init([0; 16])[..];
    let rx_buf = &mut RX_BUF.init([0; 2048])[..];
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config(&config.uart));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (_tx, rx) = uart.split();
    info!("UART initialized");

    spawner.spawn(tasks::display_task(display)).unwrap();
    spawner
        .spawn(tasks::uart_rx_task(
            rx,
            PARSER.take(),
            config.link,
            config.uart.read_timeout_ms,
        ))
        .unwrap();

    info!("All tasks spawned");
}

/// Translate the link settings into the RP2040 UART configuration
fn uart_config(config: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = config.baudrate;
    cfg.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    cfg.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}
