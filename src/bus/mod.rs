//! Bus transport boundary and register transaction primitives
//!
//! A [`BusTransport`] knows how to enumerate the I2C controllers of a board and open a
//! device on one of them. The opened device is wrapped in a [`DeviceHandle`], which is the
//! only place register transactions are issued from.

pub mod shared;

pub use shared::{BusController, SharedBusTransport, SharedI2cDevice};

use core::fmt::Debug;

use embedded_hal_async::i2c::I2c;
use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Maximum number of controllers a transport reports from [`BusTransport::enumerate`].
pub const MAX_CONTROLLERS: usize = 4;

/// I2C clock speed requested when opening a device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BusSpeed {
    /// 100 kHz
    Standard,
    /// 400 kHz
    #[default]
    Fast,
}

impl BusSpeed {
    /// Clock frequency in hertz.
    pub const fn hz(self) -> u32 {
        match self {
            Self::Standard => 100_000,
            Self::Fast => 400_000,
        }
    }
}

/// Whether other devices may be opened on the same physical bus while this one is open.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharingMode {
    Exclusive,
    #[default]
    Shared,
}

/// Everything a transport needs to open one device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// 7-bit slave address
    pub address: u8,
    pub speed: BusSpeed,
    pub sharing: SharingMode,
}

impl ConnectionSettings {
    /// Fast mode, shared access.
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            speed: BusSpeed::Fast,
            sharing: SharingMode::Shared,
        }
    }

    pub const fn with_speed(mut self, speed: BusSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub const fn with_sharing(mut self, sharing: SharingMode) -> Self {
        self.sharing = sharing;
        self
    }
}

/// Platform capability to find I2C controllers and open devices on them.
///
/// Implementations decide how bus speed and sharing mode are honoured; the drivers only
/// consume the opened [`BusTransport::Bus`].
pub trait BusTransport {
    /// Identifier of one controller, as returned by `enumerate`.
    type Controller: Clone + Debug;
    /// The opened device. Dropping it closes the connection.
    type Bus: I2c;

    /// List the controllers matching `selector` (e.g. `"I2C1"`).
    fn enumerate(
        &mut self,
        selector: &str,
    ) -> impl Future<Output = Vec<Self::Controller, MAX_CONTROLLERS>>;

    /// Open a device on `controller`. `None` means the transport could not produce a usable handle.
    fn open(
        &mut self,
        controller: &Self::Controller,
        settings: ConnectionSettings,
    ) -> impl Future<Output = Option<Self::Bus>>;
}

/// Shorthand for the error type of a transport's bus.
pub type BusErrorOf<T> = <<T as BusTransport>::Bus as embedded_hal_async::i2c::ErrorType>::Error;

/// Exclusive ownership of one open bus connection.
pub struct DeviceHandle<B> {
    bus: B,
    settings: ConnectionSettings,
}

impl<B: I2c> DeviceHandle<B> {
    pub fn new(bus: B, settings: ConnectionSettings) -> Self {
        Self { bus, settings }
    }

    pub fn address(&self) -> u8 {
        self.settings.address
    }

    pub fn settings(&self) -> ConnectionSettings {
        self.settings
    }

    /// Write the register address, read `N` bytes back in the same transaction and decode them.
    ///
    /// Byte order is the caller's business and lives in `decode`.
    pub async fn read_register<const N: usize, T>(
        &mut self,
        register: u8,
        decode: impl FnOnce([u8; N]) -> T,
    ) -> Result<T, DriverError<B::Error>> {
        let mut buffer = [0u8; N];
        self.bus
            .write_read(self.settings.address, &[register], &mut buffer)
            .await
            .map_err(DriverError::Transport)?;
        Ok(decode(buffer))
    }

    /// Write `[register, value]` in a single write-only transaction.
    pub async fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), DriverError<B::Error>> {
        self.bus
            .write(self.settings.address, &[register, value])
            .await
            .map_err(DriverError::Transport)
    }

    /// Give the bus back, closing the handle.
    pub fn release(self) -> B {
        self.bus
    }
}
