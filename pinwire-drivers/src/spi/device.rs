//! Per-peripheral SPI handle

use core::convert::Infallible;

use embedded_hal::spi::{ErrorType, SpiBus as EhSpiBus};
use pinwire_hal::gpio::{OutputPin, PinMode};
use pinwire_hal::spi::{BitOrder, Mode, SpiRegisters};

use super::bus::SpiBus;
use super::config::{ClockDivider, ControlWords, SpiDeviceConfig};

/// Byte shifted out while reading
const READ_FILL: u8 = 0xFF;

/// Handle to one peripheral on a shared [`SpiBus`]
///
/// Created by [`SpiBus::device`]. Every transfer must be bracketed by
/// [`select`](Self::select) and [`deselect`](Self::deselect), and a
/// handle must be deselected before another handle selects.
pub struct SpiDevice<'b, C, P, Cs> {
    bus: &'b SpiBus<C, P>,
    cs: Cs,
    config: SpiDeviceConfig,
    words: ControlWords,
    /// Reconfigured since the last select
    dirty: bool,
}

impl<'b, C, P, Cs> SpiDevice<'b, C, P, Cs>
where
    C: SpiRegisters,
    P: OutputPin + PinMode,
    Cs: OutputPin + PinMode,
{
    pub(super) fn new(bus: &'b SpiBus<C, P>, cs: Cs, config: SpiDeviceConfig) -> Self {
        Self {
            bus,
            cs,
            config,
            words: ControlWords::derive(&config),
            dirty: false,
        }
    }

    /// Load this device's configuration into the controller and assert
    /// chip select
    pub fn select(&mut self) {
        self.bus.apply(self.words, self.dirty);
        self.dirty = false;
        self.cs.set_low();
    }

    /// Release chip select
    pub fn deselect(&mut self) {
        self.cs.set_high();
    }

    /// Send one byte, blocking until the transfer completes
    pub fn write(&mut self, byte: u8) {
        self.bus.transfer(byte);
    }

    /// Receive one byte (clocks out 0xFF)
    pub fn read(&mut self) -> u8 {
        self.bus.transfer(READ_FILL)
    }

    /// Send one byte and return the byte received meanwhile
    pub fn transfer_byte(&mut self, byte: u8) -> u8 {
        self.bus.transfer(byte)
    }

    /// Current configuration
    pub fn config(&self) -> SpiDeviceConfig {
        self.config
    }

    /// Replace the whole configuration
    ///
    /// Takes effect on the next [`select`](Self::select).
    pub fn set_config(&mut self, config: SpiDeviceConfig) {
        self.config = config;
        self.words = ControlWords::derive(&config);
        self.dirty = true;
    }

    /// Register values loaded on select
    pub fn control_words(&self) -> ControlWords {
        self.words
    }

    pub fn clock_divider(&self) -> ClockDivider {
        self.config.clock_divider
    }

    pub fn set_clock_divider(&mut self, clock_divider: ClockDivider) {
        self.set_config(SpiDeviceConfig {
            clock_divider,
            ..self.config
        });
    }

    pub fn bit_order(&self) -> BitOrder {
        self.config.bit_order
    }

    pub fn set_bit_order(&mut self, bit_order: BitOrder) {
        self.set_config(SpiDeviceConfig {
            bit_order,
            ..self.config
        });
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.set_config(SpiDeviceConfig { mode, ..self.config });
    }

    /// The bus this device sits on
    pub fn bus(&self) -> &'b SpiBus<C, P> {
        self.bus
    }
}

impl<C, P, Cs> ErrorType for SpiDevice<'_, C, P, Cs> {
    type Error = Infallible;
}

/// Byte transfers for `embedded-hal` drivers
///
/// Chip select is not touched: bracket with
/// [`select`](SpiDevice::select)/[`deselect`](SpiDevice::deselect).
impl<C, P, Cs> EhSpiBus<u8> for SpiDevice<'_, C, P, Cs>
where
    C: SpiRegisters,
    P: OutputPin + PinMode,
    Cs: OutputPin + PinMode,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = SpiDevice::read(self);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            SpiDevice::write(self, word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        for i in 0..read.len().max(write.len()) {
            let out = write.get(i).copied().unwrap_or(READ_FILL);
            let received = self.transfer_byte(out);
            if let Some(slot) = read.get_mut(i) {
                *slot = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.transfer_byte(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Every transfer already waits for completion
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimGpio, SimSpi};
    use crate::spi::{reg, BusPins};

    fn bus(controller: &SimSpi) -> SpiBus<SimSpi, SimGpio> {
        SpiBus::new(
            controller.clone(),
            BusPins {
                sck: SimGpio::new(),
                mosi: SimGpio::new(),
                miso: SimGpio::new(),
                ss: SimGpio::new(),
            },
        )
    }

    #[test]
    fn test_repeated_select_writes_at_most_once() {
        let controller = SimSpi::new();
        let bus = bus(&controller);
        let mut device = bus.device(SimGpio::new(), SpiDeviceConfig::default());

        device.select();
        device.deselect();
        device.select();
        device.deselect();

        assert!(controller.register_writes() <= 1);
        assert_eq!(controller.control(), device.control_words().control);
        assert_eq!(device.bus().instance_count(), 1);
    }

    #[test]
    fn test_reconfigure_forces_both_registers() {
        let controller = SimSpi::new();
        let bus = bus(&controller);
        let mut device = bus.device(SimGpio::new(), SpiDeviceConfig::default());
        device.select();
        device.deselect();
        let control = controller.control_writes();
        let status = controller.status_writes();

        device.set_mode(Mode::Mode2);
        assert_eq!(device.mode(), Mode::Mode2);
        device.select();
        assert_eq!(controller.control_writes(), control + 1);
        assert_eq!(controller.status_writes(), status + 1);
        assert_eq!(controller.control() & reg::CPOL, reg::CPOL);

        // Back to comparing once the change has been applied
        device.deselect();
        device.select();
        assert_eq!(controller.control_writes(), control + 1);
    }

    #[test]
    fn test_devices_swap_configuration() {
        let controller = SimSpi::new();
        let bus = bus(&controller);
        let mut slow = bus.device(
            SimGpio::new(),
            SpiDeviceConfig {
                clock_divider: ClockDivider::Div128,
                ..Default::default()
            },
        );
        let mut fast = bus.device(
            SimGpio::new(),
            SpiDeviceConfig {
                clock_divider: ClockDivider::Div2,
                bit_order: BitOrder::LsbFirst,
                mode: Mode::Mode1,
            },
        );

        slow.select();
        assert_eq!(controller.control(), slow.control_words().control);
        assert_eq!(controller.status() & reg::SPI2X, 0);
        slow.deselect();

        fast.select();
        assert_eq!(controller.control(), fast.control_words().control);
        assert_eq!(controller.status() & reg::SPI2X, reg::SPI2X);
        fast.deselect();

        assert_eq!(fast.clock_divider(), ClockDivider::Div2);
        assert_eq!(fast.bit_order(), BitOrder::LsbFirst);
    }

    #[test]
    fn test_chip_select_bracketing() {
        let controller = SimSpi::new();
        let bus = bus(&controller);
        let cs = SimGpio::new();
        let mut device = bus.device(cs.clone(), SpiDeviceConfig::default());

        device.select();
        assert!(cs.is_set_low());
        device.write(0x01);
        device.deselect();
        assert!(cs.is_set_high());
        assert_eq!(cs.writes(), [false, true, false, true]);
    }

    #[test]
    fn test_read_sends_fill_byte() {
        let controller = SimSpi::new();
        let bus = bus(&controller);
        let mut device = bus.device(SimGpio::new(), SpiDeviceConfig::default());
        controller.queue_replies(&[0x00, 0xEF]);

        device.select();
        device.write(0x9F);
        assert_eq!(device.read(), 0xEF);
        device.deselect();

        assert_eq!(controller.sent(), [0x9F, 0xFF]);
    }

    #[test]
    fn test_embedded_hal_transfers() {
        let controller = SimSpi::new();
        let bus = bus(&controller);
        let mut device = bus.device(SimGpio::new(), SpiDeviceConfig::default());
        controller.queue_replies(&[1, 2, 3, 4, 5, 6, 7]);

        device.select();
        let mut read = [0u8; 3];
        EhSpiBus::transfer(&mut device, &mut read, &[0xA0]).unwrap();
        assert_eq!(read, [1, 2, 3]);

        let mut buf = [0x10, 0x20];
        device.transfer_in_place(&mut buf).unwrap();
        assert_eq!(buf, [4, 5]);

        EhSpiBus::write(&mut device, &[0x55]).unwrap();
        let mut one = [0u8; 1];
        EhSpiBus::read(&mut device, &mut one).unwrap();
        assert_eq!(one, [7]);
        EhSpiBus::flush(&mut device).unwrap();
        device.deselect();

        assert_eq!(controller.sent(), [0xA0, 0xFF, 0xFF, 0x10, 0x20, 0x55, 0xFF]);
    }
}
