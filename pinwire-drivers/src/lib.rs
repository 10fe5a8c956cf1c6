//! Peripheral drivers built on the pinwire HAL traits
//!
//! This crate provides two drivers for small microcontrollers:
//!
//! - [`soft_serial`] - a software UART (8N1) that generates its waveform
//!   with calibrated busy-waits and samples received bits from a
//!   pin-change interrupt
//! - [`spi`] - a hardware SPI master shared by several device handles,
//!   each with its own chip select and cached controller configuration
//!
//! plus [`config`] types for both, and a host-side cycle simulator
//! ([`sim`], feature `sim`) used by the tests.

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "sim"))]
extern crate std;

pub mod config;
pub mod soft_serial;
pub mod spi;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::SerialConfig;
pub use soft_serial::{ListenState, ListenerRegistry, SerialError, SoftSerial};
pub use spi::{SpiBus, SpiDevice};
