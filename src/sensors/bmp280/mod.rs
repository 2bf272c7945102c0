//! Bosch BMP280 barometric pressure and temperature sensor.

pub mod calibration;
pub mod config;
pub mod registers;

use embedded_hal_async::i2c::I2c;
use log::debug;

use super::{Sensor, SensorError, SensorReadings};
use crate::bus::{BusErrorOf, BusTransport, ConnectionSettings, DeviceHandle};
use crate::device::{ConnectionState, DeviceProfile, DeviceSetup, I2cDevice};
use crate::error::DriverError;

pub use calibration::{CalibrationData, raw_sample};
pub use config::{Bmp280Config, Bmp280Preset, IirFilter, Oversampling, PowerMode, Standby};
pub use registers::{
    BMP280_ALTERNATE_ADDRESS, BMP280_CHIP_ID, BMP280_DEFAULT_ADDRESS, Bmp280Register,
    CALIBRATION_LEN,
};

/// Standard atmosphere at sea level, hPa.
pub const SEA_LEVEL_HPA: f64 = 1013.25;

pub const fn default_profile() -> DeviceProfile {
    DeviceProfile::new("BMP280", ConnectionSettings::new(BMP280_DEFAULT_ADDRESS))
        .with_identity(Bmp280Register::Id.addr(), BMP280_CHIP_ID)
}

/// Setup hook: load the calibration block, then program ctrl_meas and config.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bmp280Setup {
    pub config: Bmp280Config,
}

impl<B: I2c> DeviceSetup<B> for Bmp280Setup {
    type Context = CalibrationData;

    async fn setup(
        &mut self,
        handle: &mut DeviceHandle<B>,
    ) -> Result<CalibrationData, DriverError<B::Error>> {
        let calibration = handle
            .read_register(Bmp280Register::CalibStart.addr(), CalibrationData::from_bytes)
            .await?;
        debug!("BMP280: calibration {:?}", calibration);

        let (register, value) = self.config.ctrl_meas();
        handle.write_register(register, value).await?;
        let (register, value) = self.config.config();
        handle.write_register(register, value).await?;

        Ok(calibration)
    }
}

/// Typed readings from the BMP280.
#[derive(Debug, PartialEq, Eq)]
pub struct Bmp280Readings {
    pub temperature_milli_celsius: i32,
    pub pressure_pa: i32,
}

impl SensorReadings<2> for Bmp280Readings {
    fn to_array(self) -> [i32; 2] {
        [self.temperature_milli_celsius, self.pressure_pa]
    }
}

pub struct Bmp280<T: BusTransport> {
    device: I2cDevice<T, Bmp280Setup>,
}

impl<T: BusTransport> Bmp280<T> {
    /// Address 0x77 on the default controller, default measurement configuration.
    pub fn new(transport: T) -> Self {
        Self::with_profile(transport, default_profile(), Bmp280Config::default())
    }

    pub fn with_profile(transport: T, profile: DeviceProfile, config: Bmp280Config) -> Self {
        Self {
            device: I2cDevice::new(transport, profile, Bmp280Setup { config }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.device.state()
    }

    /// Calibration constants, once the device has been initialized.
    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.device.context()
    }

    /// Connect and initialize without measuring.
    pub async fn ensure_ready(&mut self) -> Result<(), DriverError<BusErrorOf<T>>> {
        self.device.ensure_ready().await.map(|_| ())
    }

    /// Temperature in °C.
    pub async fn get_temperature(&mut self) -> Result<f64, DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        let fine = fine_temperature(ready.handle, ready.context).await?;
        Ok(fine / 5120.0)
    }

    /// Pressure in Pa. Fine temperature is re-read for every call.
    pub async fn get_pressure(&mut self) -> Result<f64, DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        let raw = ready
            .handle
            .read_register(Bmp280Register::PressMsb.addr(), raw_sample)
            .await?;
        let fine = fine_temperature(ready.handle, ready.context).await?;
        Ok(ready.context.compensate_pressure(raw, fine))
    }

    /// Altitude in metres for the given sea level pressure in hPa.
    pub async fn get_altitude(
        &mut self,
        sea_level_hpa: f64,
    ) -> Result<f64, DriverError<BusErrorOf<T>>> {
        let pressure_hpa = self.get_pressure().await? / 100.0;
        Ok(altitude(pressure_hpa, sea_level_hpa))
    }

    /// Close the bus handle. Calibration is re-read on next use.
    pub fn disconnect(&mut self) {
        self.device.disconnect();
    }
}

async fn fine_temperature<B: I2c>(
    handle: &mut DeviceHandle<B>,
    calibration: &CalibrationData,
) -> Result<f64, DriverError<B::Error>> {
    let raw = handle
        .read_register(Bmp280Register::TempMsb.addr(), raw_sample)
        .await?;
    Ok(calibration.fine_temperature(raw))
}

/// International barometric formula.
pub fn altitude(pressure_hpa: f64, sea_level_hpa: f64) -> f64 {
    44330.0 * (1.0 - libm::pow(pressure_hpa / sea_level_hpa, 0.1903))
}

impl<T: BusTransport> Sensor<2> for Bmp280<T> {
    type Readings = Bmp280Readings;

    async fn read(&mut self) -> Result<Bmp280Readings, SensorError> {
        let temperature = self
            .get_temperature()
            .await
            .map_err(|e| SensorError::from_driver("BMP280", "read temperature", e))?;
        let pressure = self
            .get_pressure()
            .await
            .map_err(|e| SensorError::from_driver("BMP280", "read pressure", e))?;

        Ok(Bmp280Readings {
            temperature_milli_celsius: (temperature * 1000.0) as i32,
            pressure_pa: pressure as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_at_sea_level_is_zero() {
        assert!(altitude(SEA_LEVEL_HPA, SEA_LEVEL_HPA).abs() < 1e-9);
    }

    #[test]
    fn test_altitude_decreases_with_pressure() {
        let low = altitude(1000.0, SEA_LEVEL_HPA);
        let high = altitude(900.0, SEA_LEVEL_HPA);
        assert!(low > 100.0 && low < 120.0, "got {}", low);
        assert!(high > low);
    }
}
