//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod display;
pub mod uart_rx;

pub use display::display_task;
pub use uart_rx::uart_rx_task;
