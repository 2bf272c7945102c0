use crate::sensors::{SensorError, SensorReadings};

use super::Sensor;
use crate::bus::{BusErrorOf, BusTransport, ConnectionSettings};
use crate::device::{ConnectionState, DeviceProfile, I2cDevice, NoSetup};
use crate::error::DriverError;

const DEFAULT_ADDRESS: u8 = 0x40;

// Hold-master measurement commands
const MEASURE_RELATIVE_HUMIDITY: u8 = 0xE5;
const MEASURE_TEMPERATURE: u8 = 0xE3;

pub const fn default_profile() -> DeviceProfile {
    DeviceProfile::new("Si7021", ConnectionSettings::new(DEFAULT_ADDRESS))
}

/// Relative humidity in percent for a raw 16-bit code.
pub fn humidity_from_raw(raw: u16) -> f64 {
    125.0 * f64::from(raw) / 65536.0 - 6.0
}

/// Temperature in °C for a raw 16-bit code.
pub fn temperature_from_raw(raw: u16) -> f64 {
    175.72 * f64::from(raw) / 65536.0 - 46.85
}

/// Typed readings from the Si7021 sensor.
pub struct Si7021Readings {
    pub humidity_milli_percent: i32,
    pub temperature_milli_celsius: i32,
}

impl SensorReadings<2> for Si7021Readings {
    fn to_array(self) -> [i32; 2] {
        [self.humidity_milli_percent, self.temperature_milli_celsius]
    }
}

/// Silicon Labs Si7021 humidity and temperature sensor. It has no identity register.
pub struct Si7021<T: BusTransport> {
    device: I2cDevice<T, NoSetup>,
}

impl<T: BusTransport> Si7021<T> {
    pub fn new(transport: T) -> Self {
        Self::with_profile(transport, default_profile())
    }

    pub fn with_profile(transport: T, profile: DeviceProfile) -> Self {
        Self {
            device: I2cDevice::new(transport, profile, NoSetup),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.device.state()
    }

    /// Relative humidity in percent.
    pub async fn get_humidity(&mut self) -> Result<f64, DriverError<BusErrorOf<T>>> {
        let raw = self.read_raw(MEASURE_RELATIVE_HUMIDITY).await?;
        Ok(humidity_from_raw(raw))
    }

    /// Temperature in °C.
    pub async fn get_temperature(&mut self) -> Result<f64, DriverError<BusErrorOf<T>>> {
        let raw = self.read_raw(MEASURE_TEMPERATURE).await?;
        Ok(temperature_from_raw(raw))
    }

    async fn read_raw(&mut self, command: u8) -> Result<u16, DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        ready.handle.read_register(command, u16::from_be_bytes).await
    }
}

impl<T: BusTransport> Sensor<2> for Si7021<T> {
    type Readings = Si7021Readings;

    async fn read(&mut self) -> Result<Si7021Readings, SensorError> {
        let humidity = self
            .get_humidity()
            .await
            .map_err(|e| SensorError::from_driver("Si7021", "measure humidity", e))?;
        let temperature = self
            .get_temperature()
            .await
            .map_err(|e| SensorError::from_driver("Si7021", "measure temperature", e))?;

        Ok(Si7021Readings {
            humidity_milli_percent: (humidity * 1000.0) as i32,
            temperature_milli_celsius: (temperature * 1000.0) as i32,
        })
    }
}
