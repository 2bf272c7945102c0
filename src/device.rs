//! Device lifecycle shared by every driver
//!
//! ```text
//! Disconnected --connect()--> Connected --initialize()--> Initialized
//! ```
//!
//! A failed transition leaves the state where it was and returns the error, so the caller can
//! simply try again later. Every public measurement goes through [`I2cDevice::ensure_ready`],
//! which makes setup lazy: the first successful call pays for it, later calls are state checks.
//!
//! All transitions take `&mut self`. To share one driver between tasks, put it behind an
//! `embassy_sync::mutex::Mutex`; the first `ensure_ready` then runs to completion before any
//! other caller observes the state.

use log::{error, info};

use crate::bus::{BusErrorOf, BusTransport, ConnectionSettings, DeviceHandle};
use crate::error::DriverError;

/// The bus controller drivers connect to unless told otherwise.
pub const DEFAULT_CONTROLLER: &str = "I2C1";

/// Observable lifecycle state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Initialized,
}

/// A register that must read back a known value on the right device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentitySpec {
    pub register: u8,
    pub expected: u8,
}

/// Per device type connection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: &'static str,
    /// Selector passed to [`BusTransport::enumerate`].
    pub controller: &'static str,
    pub settings: ConnectionSettings,
    pub identity: Option<IdentitySpec>,
}

impl DeviceProfile {
    pub const fn new(name: &'static str, settings: ConnectionSettings) -> Self {
        Self {
            name,
            controller: DEFAULT_CONTROLLER,
            settings,
            identity: None,
        }
    }

    pub const fn with_identity(mut self, register: u8, expected: u8) -> Self {
        self.identity = Some(IdentitySpec { register, expected });
        self
    }

    pub const fn with_controller(mut self, controller: &'static str) -> Self {
        self.controller = controller;
        self
    }

    pub const fn with_settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Device specific work run once, after the identity check, during `initialize()`.
///
/// Whatever the hook produces (calibration constants, for example) is kept next to the handle
/// for as long as the device stays initialized.
pub trait DeviceSetup<B: embedded_hal_async::i2c::I2c> {
    type Context;

    fn setup(
        &mut self,
        handle: &mut DeviceHandle<B>,
    ) -> impl Future<Output = Result<Self::Context, DriverError<B::Error>>>;
}

/// Setup hook for devices that need nothing beyond the identity check.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSetup;

impl<B: embedded_hal_async::i2c::I2c> DeviceSetup<B> for NoSetup {
    type Context = ();

    async fn setup(&mut self, _handle: &mut DeviceHandle<B>) -> Result<(), DriverError<B::Error>> {
        Ok(())
    }
}

enum Phase<B, C> {
    Disconnected,
    Connected(DeviceHandle<B>),
    Initialized(DeviceHandle<B>, C),
}

/// Borrowed view of an initialized device.
pub struct Ready<'a, B, C> {
    pub handle: &'a mut DeviceHandle<B>,
    pub context: &'a C,
}

/// Connection state machine composed with a device specific [`DeviceSetup`].
pub struct I2cDevice<T: BusTransport, S: DeviceSetup<T::Bus>> {
    transport: T,
    profile: DeviceProfile,
    setup: S,
    phase: Phase<T::Bus, S::Context>,
}

impl<T: BusTransport, S: DeviceSetup<T::Bus>> I2cDevice<T, S> {
    pub fn new(transport: T, profile: DeviceProfile, setup: S) -> Self {
        Self {
            transport,
            profile,
            setup,
            phase: Phase::Disconnected,
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn state(&self) -> ConnectionState {
        match self.phase {
            Phase::Disconnected => ConnectionState::Disconnected,
            Phase::Connected(_) => ConnectionState::Connected,
            Phase::Initialized(..) => ConnectionState::Initialized,
        }
    }

    /// Find the controller and open the device on it. No-op once connected.
    pub async fn connect(&mut self) -> Result<(), DriverError<BusErrorOf<T>>> {
        if !matches!(self.phase, Phase::Disconnected) {
            return Ok(());
        }

        let name = self.profile.name;
        let controllers = self.transport.enumerate(self.profile.controller).await;
        let Some(controller) = controllers.first() else {
            error!(
                "{}: no I2C controller matching \"{}\"",
                name, self.profile.controller
            );
            return Err(DriverError::DeviceNotFound(name));
        };

        let Some(bus) = self.transport.open(controller, self.profile.settings).await else {
            error!(
                "{}: could not open 0x{:02x} on {:?}",
                name, self.profile.settings.address, controller
            );
            return Err(DriverError::DeviceNotFound(name));
        };

        info!("{}: connected at 0x{:02x}", name, self.profile.settings.address);
        self.phase = Phase::Connected(DeviceHandle::new(bus, self.profile.settings));
        Ok(())
    }

    /// Verify the identity register and run the setup hook. No-op once initialized.
    pub async fn initialize(&mut self) -> Result<(), DriverError<BusErrorOf<T>>> {
        let name = self.profile.name;
        let handle = match &mut self.phase {
            Phase::Initialized(..) => return Ok(()),
            Phase::Disconnected => return Err(DriverError::NotConnected(name)),
            Phase::Connected(handle) => handle,
        };

        if let Some(identity) = self.profile.identity {
            let actual = handle.read_register(identity.register, |[id]: [u8; 1]| id).await?;
            if actual != identity.expected {
                error!(
                    "{}: identity 0x{:02x} at 0x{:02x}, expected 0x{:02x}",
                    name, actual, identity.register, identity.expected
                );
                return Err(DriverError::IdMismatch {
                    device: name,
                    expected: identity.expected,
                    actual,
                });
            }
        }

        let context = self.setup.setup(handle).await?;

        self.phase = match core::mem::replace(&mut self.phase, Phase::Disconnected) {
            Phase::Connected(handle) => Phase::Initialized(handle, context),
            other => other,
        };
        info!("{}: initialized", name);
        Ok(())
    }

    /// `connect()` then `initialize()`, handing out the ready device.
    pub async fn ensure_ready(
        &mut self,
    ) -> Result<Ready<'_, T::Bus, S::Context>, DriverError<BusErrorOf<T>>> {
        self.connect().await?;
        self.initialize().await?;

        match &mut self.phase {
            Phase::Initialized(handle, context) => Ok(Ready {
                handle,
                context: &*context,
            }),
            _ => Err(DriverError::NotConnected(self.profile.name)),
        }
    }

    /// What the setup hook produced, once initialized.
    pub fn context(&self) -> Option<&S::Context> {
        match &self.phase {
            Phase::Initialized(_, context) => Some(context),
            _ => None,
        }
    }

    /// Close the handle and go back to `Disconnected`. Setup runs again on the next use.
    pub fn disconnect(&mut self) {
        if !matches!(self.phase, Phase::Disconnected) {
            info!("{}: disconnected", self.profile.name);
        }
        self.phase = Phase::Disconnected;
    }

    /// Access the setup hook, e.g. to change what the next `initialize()` programs.
    pub fn setup_mut(&mut self) -> &mut S {
        &mut self.setup
    }

    pub fn setup(&self) -> &S {
        &self.setup
    }

    /// Tear the device down and return the transport.
    pub fn release(self) -> T {
        self.transport
    }
}
