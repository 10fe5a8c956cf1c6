//! Shared hardware SPI master
//!
//! One physical SPI controller, several peripherals. [`SpiBus`] owns the
//! controller and the bus pins; each peripheral driver gets an
//! [`SpiDevice`] handle carrying its own chip select and the controller
//! configuration (rate, bit order, mode) it needs. Selecting a device
//! reapplies its configuration to the controller, touching the registers
//! only when they differ.
//!
//! # Usage
//!
//! ```ignore
//! let bus = SpiBus::new(controller, BusPins { sck, mosi, miso, ss });
//! let mut flash = bus.device(flash_cs, SpiDeviceConfig::default());
//! let mut display = bus.device(display_cs, SpiDeviceConfig {
//!     clock_divider: ClockDivider::Div2,
//!     ..Default::default()
//! });
//!
//! let _guard = bus.lock().try_lock();
//! flash.select();
//! flash.write(0x9F);
//! let id = flash.read();
//! flash.deselect();
//! ```
//!
//! Transfers are not locked automatically. Code sharing the bus between
//! the main loop and an interrupt handler must hold [`SpiBus::lock`]
//! around each select/transfer/deselect sequence.

mod bus;
mod config;
mod device;

pub use bus::{BusPins, SpiBus};
pub use config::{ClockDivider, ControlWords, SpiDeviceConfig};
pub use device::SpiDevice;
pub use pinwire_hal::spi::{BitOrder, Mode};

/// Controller register bits
pub mod reg {
    /// Control: transfer-complete interrupt enable
    pub const SPIE: u8 = 1 << 7;
    /// Control: SPI enable
    pub const SPE: u8 = 1 << 6;
    /// Control: data order (set = LSB first)
    pub const DORD: u8 = 1 << 5;
    /// Control: master select
    pub const MSTR: u8 = 1 << 4;
    /// Control: clock polarity
    pub const CPOL: u8 = 1 << 3;
    /// Control: clock phase
    pub const CPHA: u8 = 1 << 2;
    /// Control: rate select bits SPR1:SPR0
    pub const SPR_MASK: u8 = 0b11;

    /// Status: transfer complete
    pub const SPIF: u8 = 1 << 7;
    /// Status: double speed
    pub const SPI2X: u8 = 1 << 0;
}
