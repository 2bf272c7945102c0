#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use baro_sensors::bus::{BusTransport, ConnectionSettings, MAX_CONTROLLERS};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
use heapless::Vec;

pub use embedded_hal_mock::eh1::i2c::Transaction as I2cTransaction;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Transport handing out clones of one scripted I2C mock.
pub struct MockTransport {
    pub bus: I2cMock,
    pub controllers: &'static [&'static str],
    /// When `false`, `open` fails as if the device could not be opened.
    pub available: bool,
    pub opened: Rc<RefCell<std::vec::Vec<ConnectionSettings>>>,
}

impl MockTransport {
    pub fn new(bus: &I2cMock) -> Self {
        Self {
            bus: bus.clone(),
            controllers: &["I2C1"],
            available: true,
            opened: Rc::default(),
        }
    }

    pub fn without_controllers(mut self) -> Self {
        self.controllers = &[];
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl BusTransport for MockTransport {
    type Controller = &'static str;
    type Bus = I2cMock;

    async fn enumerate(&mut self, selector: &str) -> Vec<&'static str, MAX_CONTROLLERS> {
        self.controllers
            .iter()
            .copied()
            .filter(|name| *name == selector)
            .collect()
    }

    async fn open(
        &mut self,
        _controller: &&'static str,
        settings: ConnectionSettings,
    ) -> Option<I2cMock> {
        if !self.available {
            return None;
        }
        self.opened.borrow_mut().push(settings);
        Some(self.bus.clone())
    }
}

/// Delay that returns immediately and records every requested wait in nanoseconds.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    pub waits: Rc<RefCell<std::vec::Vec<u32>>>,
}

impl RecordingDelay {
    pub fn waits(&self) -> std::vec::Vec<u32> {
        self.waits.borrow().clone()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits.borrow_mut().push(ns);
    }
}

pub const MS: u32 = 1_000_000;

/// Datasheet worked example coefficients, as the 24 bytes stored at 0x88.
pub const BMP280_CALIBRATION: [u8; 24] = [
    0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C, 0x00,
    0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17,
];

/// Raw temperature 519888.
pub const BMP280_RAW_TEMPERATURE: [u8; 3] = [0x7E, 0xED, 0x00];
/// Raw pressure 415148.
pub const BMP280_RAW_PRESSURE: [u8; 3] = [0x65, 0x5A, 0xC0];

/// Identity check, calibration load and default control registers.
pub fn bmp280_setup() -> std::vec::Vec<I2cTransaction> {
    vec![
        I2cTransaction::write_read(0x77, vec![0xD0], vec![0x58]),
        I2cTransaction::write_read(0x77, vec![0x88], BMP280_CALIBRATION.to_vec()),
        I2cTransaction::write(0x77, vec![0xF4, 0x3F]),
        I2cTransaction::write(0x77, vec![0xF5, 0x00]),
    ]
}

pub fn bmp280_temperature() -> I2cTransaction {
    I2cTransaction::write_read(0x77, vec![0xFA], BMP280_RAW_TEMPERATURE.to_vec())
}

pub fn bmp280_pressure() -> I2cTransaction {
    I2cTransaction::write_read(0x77, vec![0xF7], BMP280_RAW_PRESSURE.to_vec())
}
