//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins, direction control,
//! and the pin-change interrupt line a pin is wired to.

use crate::interrupt::InterruptLine;

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip. Writes are expected to take effect immediately:
/// the software UART times its bit edges from these calls.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Input bias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Floating input
    #[default]
    None,
    /// Internal pull-up enabled
    Up,
}

/// Runtime direction control
///
/// The drivers switch pins between input and output at configuration
/// time (receive lines become pulled-up inputs, chip selects and clock
/// lines become outputs).
pub trait PinMode {
    /// Configure the pin as an input with the given bias
    fn set_as_input(&mut self, pull: Pull);

    /// Configure the pin as a push-pull output
    fn set_as_output(&mut self);
}

/// Input pin wired to a pin-change interrupt line
///
/// The line identifier is fixed by the board wiring; several pins may
/// share one line on parts with grouped pin-change interrupts.
pub trait InterruptPin: InputPin {
    /// Interrupt line raised when this pin changes level
    fn interrupt_line(&self) -> InterruptLine;
}

/// Adapter for `embedded-hal` 1.0 output pins
///
/// Chip HALs built on `embedded-hal` hand out typed pins that are already
/// configured as outputs. Wrapping one lets it serve as an SPI chip select
/// or bus line. Write errors are discarded: output pins on every supported
/// chip are infallible.
pub struct EhPin<P> {
    pin: P,
    high: bool,
}

impl<P: embedded_hal::digital::OutputPin> EhPin<P> {
    /// Wrap an output pin, driving it to a known level
    pub fn new(mut pin: P, high: bool) -> Self {
        let _ = if high { pin.set_high() } else { pin.set_low() };
        Self { pin, high }
    }

    /// Release the wrapped pin
    pub fn free(self) -> P {
        self.pin
    }
}

impl<P: embedded_hal::digital::OutputPin> OutputPin for EhPin<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

impl<P> PinMode for EhPin<P> {
    // Direction is fixed by the wrapped pin's type state.
    fn set_as_input(&mut self, _pull: Pull) {}

    fn set_as_output(&mut self) {}
}
