//! Simulated GPIO and SPI controller

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use pinwire_hal::gpio::{InputPin, OutputPin, PinMode, Pull};
use pinwire_hal::spi::SpiRegisters;

use crate::spi::reg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input(Pull),
    Output,
}

#[derive(Debug)]
struct GpioState {
    direction: Option<Direction>,
    high: bool,
    /// Every level written, oldest first
    writes: Vec<bool>,
}

/// General purpose pin recording its configuration and writes
///
/// Clones share state, so a test can keep a handle to a pin it gave away.
#[derive(Debug, Clone)]
pub struct SimGpio(Rc<RefCell<GpioState>>);

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGpio {
    /// Create an unconfigured pin reading low
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(GpioState {
            direction: None,
            high: false,
            writes: Vec::new(),
        })))
    }

    /// Check whether the pin was configured as an output
    pub fn is_output(&self) -> bool {
        self.0.borrow().direction == Some(Direction::Output)
    }

    /// Check whether the pin was configured as an input
    pub fn is_input(&self) -> bool {
        matches!(self.0.borrow().direction, Some(Direction::Input(_)))
    }

    /// Levels written so far
    pub fn writes(&self) -> Vec<bool> {
        self.0.borrow().writes.clone()
    }

    /// Force the level seen by reads
    pub fn set_input_level(&self, high: bool) {
        self.0.borrow_mut().high = high;
    }
}

impl OutputPin for SimGpio {
    fn set_high(&mut self) {
        let mut state = self.0.borrow_mut();
        state.high = true;
        state.writes.push(true);
    }

    fn set_low(&mut self) {
        let mut state = self.0.borrow_mut();
        state.high = false;
        state.writes.push(false);
    }

    fn is_set_high(&self) -> bool {
        self.0.borrow().high
    }
}

impl InputPin for SimGpio {
    fn is_high(&self) -> bool {
        self.0.borrow().high
    }
}

impl PinMode for SimGpio {
    fn set_as_input(&mut self, pull: Pull) {
        self.0.borrow_mut().direction = Some(Direction::Input(pull));
    }

    fn set_as_output(&mut self) {
        self.0.borrow_mut().direction = Some(Direction::Output);
    }
}

#[derive(Debug, Default)]
struct SpiState {
    control: u8,
    status: u8,
    data: u8,
    control_writes: usize,
    status_writes: usize,
    sent: Vec<u8>,
    replies: VecDeque<u8>,
}

/// SPI controller model
///
/// Transfers complete instantly. Each transfer shifts in the next queued
/// reply byte (0x00 once the queue runs dry). Only the double-speed bit
/// of the status register is writable.
#[derive(Debug, Clone, Default)]
pub struct SimSpi(Rc<RefCell<SpiState>>);

impl SimSpi {
    /// Create a controller in its reset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes the peripheral will shift back
    pub fn queue_replies(&self, bytes: &[u8]) {
        self.0.borrow_mut().replies.extend(bytes.iter().copied());
    }

    /// Bytes shifted out so far
    pub fn sent(&self) -> Vec<u8> {
        self.0.borrow().sent.clone()
    }

    /// Number of control register writes
    pub fn control_writes(&self) -> usize {
        self.0.borrow().control_writes
    }

    /// Number of status register writes
    pub fn status_writes(&self) -> usize {
        self.0.borrow().status_writes
    }

    /// Total register writes (control + status)
    pub fn register_writes(&self) -> usize {
        self.control_writes() + self.status_writes()
    }
}

impl SpiRegisters for SimSpi {
    fn control(&self) -> u8 {
        self.0.borrow().control
    }

    fn set_control(&mut self, value: u8) {
        let mut state = self.0.borrow_mut();
        state.control = value;
        state.control_writes += 1;
    }

    fn status(&self) -> u8 {
        self.0.borrow().status
    }

    fn set_status(&mut self, value: u8) {
        let mut state = self.0.borrow_mut();
        state.status = (state.status & !reg::SPI2X) | (value & reg::SPI2X);
        state.status_writes += 1;
    }

    fn write_data(&mut self, byte: u8) {
        let mut state = self.0.borrow_mut();
        state.sent.push(byte);
        state.data = state.replies.pop_front().unwrap_or(0);
        state.status |= reg::SPIF;
    }

    fn read_data(&self) -> u8 {
        let mut state = self.0.borrow_mut();
        state.status &= !reg::SPIF;
        state.data
    }

    fn transfer_complete(&self) -> bool {
        self.0.borrow().status & reg::SPIF != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpio_records_configuration() {
        let mut pin = SimGpio::new();
        let handle = pin.clone();
        assert!(!handle.is_input() && !handle.is_output());

        pin.set_as_input(Pull::Up);
        assert!(handle.is_input());
        assert!(pin.is_low());

        // Externally driven level, not a write
        handle.set_input_level(true);
        assert!(pin.is_high());
        assert!(handle.writes().is_empty());

        pin.set_as_output();
        pin.set_low();
        assert!(handle.is_output());
        assert_eq!(handle.writes(), [false]);
    }

    #[test]
    fn test_spi_transfer_flag() {
        let mut spi = SimSpi::new();
        spi.queue_replies(&[0x12]);
        assert!(!spi.transfer_complete());

        spi.write_data(0xAB);
        assert!(spi.transfer_complete());
        assert_eq!(spi.read_data(), 0x12);
        assert!(!spi.transfer_complete());

        // Only the double-speed bit is writable
        spi.set_status(0xFF);
        assert_eq!(spi.status(), reg::SPI2X);
        assert_eq!(spi.status_writes(), 1);
    }
}
