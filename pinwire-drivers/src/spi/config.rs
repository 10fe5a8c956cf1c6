//! SPI device configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use pinwire_hal::spi::{BitOrder, Mode};

use super::reg;

/// SPI clock divider (bus clock = CPU clock / N)
///
/// The discriminant packs the double-speed bit above the two rate
/// select bits: `SPI2X << 2 | SPR1:SPR0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ClockDivider {
    Div2 = 0b100,
    #[default]
    Div4 = 0b000,
    Div8 = 0b101,
    Div16 = 0b001,
    Div32 = 0b110,
    Div64 = 0b010,
    Div128 = 0b011,
}

impl ClockDivider {
    /// Rate select bits for the control register
    pub const fn rate_bits(self) -> u8 {
        self as u8 & reg::SPR_MASK
    }

    /// Whether the double-speed bit is set
    pub const fn double_speed(self) -> bool {
        (self as u8 >> 2) & 1 != 0
    }

    /// Division factor
    pub const fn divisor(self) -> u8 {
        match self {
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
            Self::Div16 => 16,
            Self::Div32 => 32,
            Self::Div64 => 64,
            Self::Div128 => 128,
        }
    }
}

/// Controller settings one peripheral needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiDeviceConfig {
    /// Bus clock divider
    pub clock_divider: ClockDivider,
    /// Bit order
    pub bit_order: BitOrder,
    /// Clock polarity and phase
    pub mode: Mode,
}

/// Register values for a [`SpiDeviceConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlWords {
    /// Control register: enabled master, rate, bit order, mode
    pub control: u8,
    /// Status register: only the double-speed bit is meaningful
    pub status: u8,
}

impl ControlWords {
    /// Compute the register values for `config`
    pub const fn derive(config: &SpiDeviceConfig) -> Self {
        let mut control = reg::MSTR | reg::SPE | config.clock_divider.rate_bits();

        if let BitOrder::LsbFirst = config.bit_order {
            control |= reg::DORD;
        }

        control |= match config.mode {
            Mode::Mode0 => 0,
            Mode::Mode1 => reg::CPHA,
            Mode::Mode2 => reg::CPOL,
            Mode::Mode3 => reg::CPOL | reg::CPHA,
        };

        let status = if config.clock_divider.double_speed() {
            reg::SPI2X
        } else {
            0
        };

        Self { control, status }
    }
}
