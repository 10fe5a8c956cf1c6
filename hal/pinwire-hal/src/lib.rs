//! Pinwire Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the pinwire drivers are
//! written against. Chip support crates implement them for real silicon;
//! the drivers crate ships a host simulator implementing them for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Firmware (interrupt vectors, tasks)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinwire-drivers (SoftSerial, SpiBus)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinwire-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip HAL     │       │ host simulator│
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::PinMode`],
//!   [`gpio::InterruptPin`] - Digital I/O
//! - [`interrupt::InterruptRegistry`] - Pin-change interrupt dispatch
//! - [`timing::DelayTicks`], [`timing::CycleCounter`] - Cycle-accurate waits
//! - [`spi::SpiRegisters`] - SPI master controller registers
//! - [`serial::SerialWrite`], [`serial::SerialRead`] - Byte-level serial I/O

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod interrupt;
pub mod serial;
pub mod spi;
pub mod timing;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, InterruptPin, OutputPin, PinMode, Pull};
pub use interrupt::{InterruptLine, InterruptRegistry, ListenerId};
pub use serial::{SerialRead, SerialWrite};
pub use spi::SpiRegisters;
pub use timing::{CycleCounter, DelayTicks};
