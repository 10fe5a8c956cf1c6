//! SPI bus manager

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use pinwire_hal::gpio::{OutputPin, PinMode, Pull};
use pinwire_hal::spi::SpiRegisters;

use super::config::{ControlWords, SpiDeviceConfig};
use super::device::SpiDevice;
use super::reg;

/// Dedicated bus pins of the SPI controller
pub struct BusPins<P> {
    pub sck: P,
    pub mosi: P,
    pub miso: P,
    /// Controller's own slave-select; must stay an output high for the
    /// controller to remain master
    pub ss: P,
}

struct BusState<C, P> {
    controller: C,
    pins: BusPins<P>,
    /// Devices configured so far
    instances: usize,
}

/// One SPI controller shared by several [`SpiDevice`] handles
pub struct SpiBus<C, P> {
    state: BlockingMutex<CriticalSectionRawMutex, RefCell<BusState<C, P>>>,
    lock: Mutex<CriticalSectionRawMutex, ()>,
}

impl<C, P> SpiBus<C, P>
where
    C: SpiRegisters,
    P: OutputPin + PinMode,
{
    /// Take ownership of the controller and its pins
    ///
    /// Nothing is touched until the first device is configured.
    pub const fn new(controller: C, pins: BusPins<P>) -> Self {
        Self {
            state: BlockingMutex::new(RefCell::new(BusState {
                controller,
                pins,
                instances: 0,
            })),
            lock: Mutex::new(()),
        }
    }

    /// Configure a device on this bus
    ///
    /// The chip select becomes an output, pulsed low and left idle high.
    /// The first device also sets up the bus pins. Controller registers are
    /// only written on [`SpiDevice::select`].
    pub fn device<Cs>(&self, mut cs: Cs, config: SpiDeviceConfig) -> SpiDevice<'_, C, P, Cs>
    where
        Cs: OutputPin + PinMode,
    {
        cs.set_as_output();
        cs.set_low();
        cs.set_high();

        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.instances == 0 {
                let pins = &mut state.pins;
                pins.sck.set_as_output();
                pins.mosi.set_as_output();
                pins.miso.set_as_input(Pull::None);
                pins.ss.set_as_output();

                pins.sck.set_low();
                pins.mosi.set_low();

                pins.ss.set_low();
                pins.ss.set_high();

                #[cfg(feature = "defmt")]
                defmt::debug!("SPI bus pins configured");
            }
            state.instances += 1;
        });

        SpiDevice::new(self, cs, config)
    }

    /// Number of devices configured on this bus
    pub fn instance_count(&self) -> usize {
        self.state.lock(|state| state.borrow().instances)
    }

    /// Bus-wide lock
    ///
    /// Never taken by the bus itself. Hold it across
    /// select/transfer/deselect when the bus is used from more than one
    /// context.
    pub fn lock(&self) -> &Mutex<CriticalSectionRawMutex, ()> {
        &self.lock
    }

    /// Load `words` into the controller
    ///
    /// Unless `force` is set, a register is written only when its live
    /// value differs (status compared on the double-speed bit only).
    pub(super) fn apply(&self, words: ControlWords, force: bool) {
        self.with_controller(|controller| {
            if force || controller.control() != words.control {
                controller.set_control(words.control);
            }
            if force || (controller.status() ^ words.status) & reg::SPI2X != 0 {
                controller.set_status(words.status);
            }
        });
    }

    /// Shift one byte out and the peripheral's byte in
    ///
    /// Only the register accesses run in a critical section; interrupts
    /// stay enabled while waiting for the transfer to complete.
    pub(super) fn transfer(&self, byte: u8) -> u8 {
        self.with_controller(|controller| controller.write_data(byte));
        while !self.with_controller(|controller| controller.transfer_complete()) {
            core::hint::spin_loop();
        }
        self.with_controller(|controller| controller.read_data())
    }

    fn with_controller<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        self.state
            .lock(|state| f(&mut state.borrow_mut().controller))
    }
}
