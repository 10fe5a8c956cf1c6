//! Driver configuration
//!
//! Plain data describing how each driver is set up, so a board can keep
//! its serial and SPI settings in one place (and, with the `serde`
//! feature, persist them as postcard binary data).

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::soft_serial::{BaudTimingProfile, ClockFrequency, SerialError};

pub use crate::spi::SpiDeviceConfig;

/// Software serial settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SerialConfig {
    /// CPU clock the timing tables are chosen for
    pub clock: ClockFrequency,
    /// Baud rate
    pub baud: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            clock: ClockFrequency::Mhz16,
            baud: 9600,
        }
    }
}

impl SerialConfig {
    /// Create a configuration
    pub const fn new(clock: ClockFrequency, baud: u32) -> Self {
        Self { clock, baud }
    }

    /// Resolve the timing profile, failing for uncalibrated rates
    pub fn profile(&self) -> Result<BaudTimingProfile, SerialError> {
        BaudTimingProfile::lookup(self.clock, self.baud)
    }

    /// Check the configuration without keeping the profile
    pub fn validate(&self) -> Result<(), SerialError> {
        self.profile().map(|_| ())
    }
}

/// Errors persisting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Output buffer too small or value not encodable
    Serialize,
    /// Stored bytes are not a valid configuration
    Deserialize,
    /// Decoded settings rejected
    Invalid(SerialError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize => write!(f, "failed to encode configuration"),
            Self::Deserialize => write!(f, "failed to decode configuration"),
            Self::Invalid(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl From<SerialError> for ConfigError {
    fn from(e: SerialError) -> Self {
        Self::Invalid(e)
    }
}

#[cfg(feature = "serde")]
impl SerialConfig {
    /// Encode into `buf`, returning the used part
    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }

    /// Decode and validate stored settings
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SerialConfig::default();
        assert_eq!(config.clock, ClockFrequency::Mhz16);
        assert_eq!(config.baud, 9600);
        assert_eq!(config.profile().unwrap().tx_delay, 233);
    }

    #[test]
    fn test_unsupported_baud_rejected() {
        let config = SerialConfig::new(ClockFrequency::Mhz20, 250_000);
        assert_eq!(
            config.validate(),
            Err(SerialError::UnsupportedBaud {
                clock: ClockFrequency::Mhz20,
                baud: 250_000
            })
        );
    }

    #[test]
    fn test_spi_default() {
        let config = SpiDeviceConfig::default();
        assert_eq!(config.clock_divider, crate::spi::ClockDivider::Div4);
        assert_eq!(config.bit_order, crate::spi::BitOrder::MsbFirst);
        assert_eq!(config.mode, crate::spi::Mode::Mode0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_stored_config() {
        let config = SerialConfig::new(ClockFrequency::Mhz8, 57_600);
        let mut buf = [0u8; 16];
        let used = config.to_bytes(&mut buf).unwrap().len();
        assert_eq!(SerialConfig::from_bytes(&buf[..used]), Ok(config));

        let bad = SerialConfig::new(ClockFrequency::Mhz8, 1234);
        let used = bad.to_bytes(&mut buf).unwrap().len();
        assert!(matches!(
            SerialConfig::from_bytes(&buf[..used]),
            Err(ConfigError::Invalid(_))
        ));

        assert_eq!(SerialConfig::from_bytes(&[]), Err(ConfigError::Deserialize));
    }
}
