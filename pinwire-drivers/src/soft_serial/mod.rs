//! Software UART
//!
//! A bit-banged 8N1 serial channel: one start bit (low), eight data bits
//! LSB first, one stop bit (high), no parity.
//!
//! - Transmit toggles the TX pin between calibrated busy-waits with
//!   interrupts masked, so every bit is exactly one symbol long.
//! - Receive is driven by the RX pin's change interrupt. The firmware's
//!   handler calls [`SoftSerial::on_pin_change`], which samples the frame
//!   against a free-running cycle counter and stores the byte in a
//!   64-slot ring buffer.
//!
//! Any number of channels can transmit, but only one can receive at a
//! time; [`ListenerRegistry`] hands receive from channel to channel.
//!
//! # Usage
//!
//! The channel is driven from two contexts (the pin-change interrupt and
//! the main loop) and both need `&mut` access, so firmware keeps it in a
//! critical-section mutex and locks it from each side:
//!
//! ```ignore
//! static LISTENERS: ListenerRegistry<Dispatch> = ListenerRegistry::new(Dispatch::new());
//! static GPS: Mutex<CriticalSectionRawMutex, RefCell<Option<GpsSerial>>> =
//!     Mutex::new(RefCell::new(None));
//!
//! let mut gps = SoftSerial::new(ListenerId(0), rx_pin, tx_pin, delay, timer, &LISTENERS);
//! gps.begin(ClockFrequency::Mhz16, 9600)?;
//! GPS.lock(|cell| cell.replace(Some(gps)));
//!
//! // In the pin-change interrupt:
//! GPS.lock(|cell| {
//!     if let Some(gps) = cell.borrow_mut().as_mut() {
//!         gps.on_pin_change();
//!     }
//! });
//!
//! // In the main loop:
//! while let Some(byte) = GPS.lock(|cell| cell.borrow_mut().as_mut().and_then(|gps| gps.read())) {
//!     parser.feed(byte);
//! }
//! ```
//!
//! The receive buffer is also safe on its own, for firmware that splits
//! the channel differently (see [`ReceiveBuffer`]).

mod buffer;
mod channel;
mod listener;
mod timing;

pub use buffer::{ReceiveBuffer, RX_BUFFER_SIZE};
pub use channel::{ListenState, SoftSerial};
pub use listener::ListenerRegistry;
pub use timing::{BaudTimingProfile, ClockFrequency, SymbolTiming};

use core::fmt;

/// Software serial configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// No calibration row for this baud rate at this clock
    UnsupportedBaud {
        /// Clock the channel was configured for
        clock: ClockFrequency,
        /// Requested baud rate
        baud: u32,
    },
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedBaud { clock, baud } => {
                write!(f, "baud {} not supported at {} Hz", baud, clock.hz())
            }
        }
    }
}
