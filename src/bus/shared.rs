//! Shared I2C bus transport
//!
//! Each physical bus lives in a [`BusController`] behind Embassy's async `Mutex`, so any number
//! of [`SharedI2cDevice`]s can be handed out for it. Every transaction locks the bus for its
//! duration and yields to the executor while waiting, instead of blocking.
//!
//! The controller also keeps a claim table so the transport can honour
//! [`SharingMode`]: an exclusive device is only opened on an idle bus, and no shared device is
//! opened while an exclusive one is alive.
//!
//! # Example
//!
//! ```no_run
//! use baro_sensors::bus::{BusController, BusSpeed, SharedBusTransport};
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! # fn demo<I: embedded_hal_async::i2c::I2c>(i2c: I) {
//! let controllers = [BusController::<CriticalSectionRawMutex, _>::new("I2C1", i2c, BusSpeed::Fast)];
//!
//! let bmp280 = baro_sensors::sensors::Bmp280::new(SharedBusTransport::new(&controllers));
//! let si7021 = baro_sensors::sensors::Si7021::new(SharedBusTransport::new(&controllers));
//! # }
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use heapless::Vec;
use log::{debug, warn};

use super::{BusSpeed, BusTransport, ConnectionSettings, MAX_CONTROLLERS, SharingMode};

#[derive(Clone, Copy)]
struct Claims {
    users: usize,
    exclusive: bool,
}

/// One named physical I2C bus.
pub struct BusController<M: RawMutex, B> {
    name: &'static str,
    max_speed: BusSpeed,
    bus: Mutex<M, B>,
    claims: BlockingMutex<M, Cell<Claims>>,
}

impl<M: RawMutex, B> BusController<M, B> {
    /// Create a controller for `bus`, which is clocked at `max_speed`.
    pub const fn new(name: &'static str, bus: B, max_speed: BusSpeed) -> Self {
        Self {
            name,
            max_speed,
            bus: Mutex::new(bus),
            claims: BlockingMutex::new(Cell::new(Claims {
                users: 0,
                exclusive: false,
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of devices currently open on this bus.
    pub fn user_count(&self) -> usize {
        self.claims.lock(|claims| claims.get().users)
    }

    /// Returns `true` if an exclusive device is currently open on this bus.
    pub fn is_exclusive(&self) -> bool {
        self.claims.lock(|claims| claims.get().exclusive)
    }

    fn try_claim(&self, settings: &ConnectionSettings) -> bool {
        if settings.speed > self.max_speed {
            warn!(
                "{}: {} Hz requested for 0x{:02x}, bus runs at {} Hz",
                self.name,
                settings.speed.hz(),
                settings.address,
                self.max_speed.hz()
            );
            return false;
        }

        self.claims.lock(|cell| {
            let claims = cell.get();
            let granted = match settings.sharing {
                SharingMode::Exclusive => claims.users == 0,
                SharingMode::Shared => !claims.exclusive,
            };
            if granted {
                cell.set(Claims {
                    users: claims.users + 1,
                    exclusive: settings.sharing == SharingMode::Exclusive,
                });
            } else {
                warn!(
                    "{}: {:?} access for 0x{:02x} refused ({} open, exclusive: {})",
                    self.name, settings.sharing, settings.address, claims.users, claims.exclusive
                );
            }
            granted
        })
    }

    fn release(&self) {
        self.claims.lock(|cell| {
            let claims = cell.get();
            cell.set(Claims {
                users: claims.users.saturating_sub(1),
                exclusive: false,
            });
        });
    }
}

/// [`BusTransport`] over a fixed set of [`BusController`]s. Controllers are identified by index.
pub struct SharedBusTransport<'a, M: RawMutex, B> {
    controllers: &'a [BusController<M, B>],
}

impl<'a, M: RawMutex, B> SharedBusTransport<'a, M, B> {
    pub const fn new(controllers: &'a [BusController<M, B>]) -> Self {
        Self { controllers }
    }
}

impl<'a, M: RawMutex, B: I2c> BusTransport for SharedBusTransport<'a, M, B> {
    type Controller = usize;
    type Bus = SharedI2cDevice<'a, M, B>;

    async fn enumerate(&mut self, selector: &str) -> Vec<usize, MAX_CONTROLLERS> {
        self.controllers
            .iter()
            .enumerate()
            .filter(|(_, controller)| controller.name == selector)
            .map(|(index, _)| index)
            .take(MAX_CONTROLLERS)
            .collect()
    }

    async fn open(
        &mut self,
        controller: &usize,
        settings: ConnectionSettings,
    ) -> Option<SharedI2cDevice<'a, M, B>> {
        let controller = self.controllers.get(*controller)?;
        if !controller.try_claim(&settings) {
            return None;
        }

        debug!(
            "{}: opened 0x{:02x} ({:?}, {} Hz)",
            controller.name,
            settings.address,
            settings.sharing,
            settings.speed.hz()
        );
        Some(SharedI2cDevice { controller })
    }
}

/// A device opened on a [`BusController`]. Dropping it releases its claim on the bus.
pub struct SharedI2cDevice<'a, M: RawMutex, B> {
    controller: &'a BusController<M, B>,
}

impl<M: RawMutex, B> Drop for SharedI2cDevice<'_, M, B> {
    fn drop(&mut self) {
        self.controller.release();
    }
}

impl<M: RawMutex, B: ErrorType> ErrorType for SharedI2cDevice<'_, M, B> {
    type Error = B::Error;
}

impl<M: RawMutex, B: I2c> I2c for SharedI2cDevice<'_, M, B> {
    #[inline]
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        let mut bus = self.controller.bus.lock().await;
        bus.read(address, read).await
    }

    #[inline]
    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        let mut bus = self.controller.bus.lock().await;
        bus.write(address, write).await
    }

    /// The write and read phases run under one lock, without releasing the bus in between.
    #[inline]
    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut bus = self.controller.bus.lock().await;
        bus.write_read(address, write, read).await
    }

    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.controller.bus.lock().await;
        bus.transaction(address, operations).await
    }
}
