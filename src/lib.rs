//! Async I2C drivers for the environmental sensors on the baro board
//!
//! Every driver owns an [`device::I2cDevice`], which connects to the bus through a
//! [`bus::BusTransport`], checks the chip identity and runs the device setup the first time a
//! measurement is requested.

#![no_std]

pub mod bus;
pub mod config;
pub mod device;
pub mod error;
pub mod sensors;

pub use bus::{BusSpeed, BusTransport, ConnectionSettings, DeviceHandle, SharingMode};
pub use config::SensorsConfig;
pub use device::{ConnectionState, DeviceProfile, I2cDevice};
pub use error::DriverError;
