//! Error types shared by every driver

use core::fmt::Debug;

use thiserror_no_std::Error;

/// Errors surfaced by the device lifecycle and the register primitives.
///
/// `E` is the error type of the underlying bus (`embedded_hal_async::i2c::ErrorType::Error`).
/// Bus errors are carried unchanged in [`DriverError::Transport`]; nothing is retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError<E: Debug> {
    /// No matching bus controller exists, or the transport returned no usable handle.
    #[error("A connected {0} sensor could not be found")]
    DeviceNotFound(&'static str),

    /// The identity register disagrees with the expected constant (wrong device or wiring).
    #[error("Identification number {actual:#04x} does not match the expected {expected:#04x} for a {device} sensor")]
    IdMismatch {
        device: &'static str,
        expected: u8,
        actual: u8,
    },

    /// The device was used before `connect()` succeeded.
    #[error("The {0} sensor is not connected")]
    NotConnected(&'static str),

    /// An I2C transaction failed.
    #[error("I2C transaction failed: {0:?}")]
    Transport(E),
}

impl<E: Debug> DriverError<E> {
    /// Returns `true` for errors that indicate the wrong device is wired to the bus.
    pub const fn is_id_mismatch(&self) -> bool {
        matches!(self, Self::IdMismatch { .. })
    }
}
