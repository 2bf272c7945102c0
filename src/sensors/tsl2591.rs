//! AMS TSL2591 high dynamic range ambient light sensor.
//!
//! A measurement programs gain and integration time, enables the ADC, waits one integration
//! period, reads both photodiode channels and disables the ADC again. Channel 0 sees visible
//! plus infrared light, channel 1 infrared only.
//!
//! Dropping a [`Tsl2591::get_lux`] future while it waits leaves the ADC running. The next
//! measurement re-programs the control register and re-enables the ADC from scratch, so no state
//! leaks into it; call [`Tsl2591::disable`] to power the ADC down in the meantime.

use embedded_hal_async::delay::DelayNs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{Sensor, SensorError, SensorReadings};
use crate::bus::{BusErrorOf, BusTransport, ConnectionSettings};
use crate::device::{ConnectionState, DeviceProfile, I2cDevice, NoSetup};
use crate::error::DriverError;

mod registers {
    /// Command bit plus "normal operation" transaction type; OR-ed into every register address.
    pub const COMMAND: u8 = 0xA0;
    pub const ENABLE: u8 = 0x00;
    pub const CONTROL: u8 = 0x01;
    pub const ID: u8 = 0x12;
    pub const C0DATAL: u8 = 0x14;
    pub const C1DATAL: u8 = 0x16;

    /// Power on, ADC enable, ALS interrupt enable, no-persist interrupt enable
    pub const ENABLE_ALL: u8 = 0x01 | 0x02 | 0x10 | 0x80;
    pub const DISABLE_ALL: u8 = 0x00;

    pub const DEVICE_ID: u8 = 0x50;
    pub const DEFAULT_ADDRESS: u8 = 0x29;
}

/// Channel value reported when the analog front end overflowed.
pub const SATURATED: u16 = 0xFFFF;

/// Counts per lux normalisation divisor.
const LUX_DF: f64 = 408.0;

/// ALS gain. The nominal multiplier feeds the lux formula, the code goes into CONTROL.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    #[default]
    Low,
    Medium,
    High,
    Maximum,
}

impl Gain {
    pub const fn multiplier(self) -> u16 {
        match self {
            Self::Low => 1,
            Self::Medium => 25,
            Self::High => 428,
            Self::Maximum => 9876,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Low => 0x00,
            Self::Medium => 0x10,
            Self::High => 0x20,
            Self::Maximum => 0x30,
        }
    }
}

/// ALS integration time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationTime {
    #[default]
    Shortest,
    Shorter,
    Medium,
    Long,
    Longer,
    Longest,
}

impl IntegrationTime {
    pub const fn millis(self) -> u32 {
        match self {
            Self::Shortest => 100,
            Self::Shorter => 200,
            Self::Medium => 300,
            Self::Long => 400,
            Self::Longer => 500,
            Self::Longest => 600,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Shortest => 0x00,
            Self::Shorter => 0x01,
            Self::Medium => 0x02,
            Self::Long => 0x03,
            Self::Longer => 0x04,
            Self::Longest => 0x05,
        }
    }
}

/// The exposure currently programmed into the device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExposureSetting {
    pub gain: Gain,
    pub integration_time: IntegrationTime,
}

impl ExposureSetting {
    /// Value of the CONTROL register.
    pub const fn control(&self) -> u8 {
        self.gain.code() | self.integration_time.code()
    }

    /// Counts per lux for this exposure.
    pub fn counts_per_lux(&self) -> f64 {
        f64::from(self.gain.multiplier()) * f64::from(self.integration_time.millis()) / LUX_DF
    }
}

/// Lux from the two channel readings.
///
/// A saturated channel gives `0.0`, as does a dark channel 0 (the formula divides by it).
pub fn compute_lux(full: u16, ir: u16, exposure: &ExposureSetting) -> f64 {
    if full == SATURATED || ir == SATURATED {
        warn!("TSL2591: channel saturated (full {}, ir {})", full, ir);
        return 0.0;
    }
    if full == 0 {
        return 0.0;
    }

    let full = f64::from(full);
    let ir = f64::from(ir);
    (full - ir) * (1.0 - ir / full) / exposure.counts_per_lux()
}

pub const fn default_profile() -> DeviceProfile {
    DeviceProfile::new("TSL2591", ConnectionSettings::new(registers::DEFAULT_ADDRESS))
        .with_identity(registers::COMMAND | registers::ID, registers::DEVICE_ID)
}

pub struct Tsl2591Readings {
    pub milli_lux: i32,
}

impl SensorReadings<1> for Tsl2591Readings {
    fn to_array(self) -> [i32; 1] {
        [self.milli_lux]
    }
}

pub struct Tsl2591<T: BusTransport, D = embassy_time::Delay> {
    device: I2cDevice<T, NoSetup>,
    delay: D,
    exposure: ExposureSetting,
}

impl<T: BusTransport> Tsl2591<T> {
    pub fn new(transport: T) -> Self {
        Self::with_delay(transport, embassy_time::Delay)
    }
}

impl<T: BusTransport, D: DelayNs> Tsl2591<T, D> {
    pub fn with_delay(transport: T, delay: D) -> Self {
        Self::with_profile(transport, delay, default_profile())
    }

    pub fn with_profile(transport: T, delay: D, profile: DeviceProfile) -> Self {
        Self {
            device: I2cDevice::new(transport, profile, NoSetup),
            delay,
            exposure: ExposureSetting::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.device.state()
    }

    pub fn exposure(&self) -> ExposureSetting {
        self.exposure
    }

    /// Exposure used by [`Sensor::read`]. It is programmed on the next measurement.
    pub fn set_exposure(&mut self, exposure: ExposureSetting) {
        self.exposure = exposure;
    }

    /// Store the exposure and program it into CONTROL.
    pub async fn configure(
        &mut self,
        gain: Gain,
        integration_time: IntegrationTime,
    ) -> Result<(), DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        self.exposure = ExposureSetting {
            gain,
            integration_time,
        };
        debug!("TSL2591: exposure {:?}", self.exposure);
        ready
            .handle
            .write_register(registers::COMMAND | registers::CONTROL, self.exposure.control())
            .await
    }

    /// Run one measurement with the given exposure and return lux.
    ///
    /// Saturation is not an error: it yields `0.0`.
    pub async fn get_lux(
        &mut self,
        gain: Gain,
        integration_time: IntegrationTime,
    ) -> Result<f64, DriverError<BusErrorOf<T>>> {
        self.configure(gain, integration_time).await?;
        let (full, ir) = self.measure().await?;
        Ok(compute_lux(full, ir, &self.exposure))
    }

    /// Power the ADC down.
    pub async fn disable(&mut self) -> Result<(), DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        ready
            .handle
            .write_register(registers::COMMAND | registers::ENABLE, registers::DISABLE_ALL)
            .await
    }

    /// Enable, wait one integration period, read both channels, disable.
    async fn measure(&mut self) -> Result<(u16, u16), DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        ready
            .handle
            .write_register(registers::COMMAND | registers::ENABLE, registers::ENABLE_ALL)
            .await?;

        self.delay
            .delay_ms(self.exposure.integration_time.millis())
            .await;

        let full = ready
            .handle
            .read_register(registers::COMMAND | registers::C0DATAL, u16::from_le_bytes)
            .await?;
        let ir = ready
            .handle
            .read_register(registers::COMMAND | registers::C1DATAL, u16::from_le_bytes)
            .await?;

        ready
            .handle
            .write_register(registers::COMMAND | registers::ENABLE, registers::DISABLE_ALL)
            .await?;

        debug!("TSL2591: full {} ir {}", full, ir);
        Ok((full, ir))
    }
}

/// Measures with the stored exposure.
impl<T: BusTransport, D: DelayNs> Sensor<1> for Tsl2591<T, D> {
    type Readings = Tsl2591Readings;

    async fn read(&mut self) -> Result<Tsl2591Readings, SensorError> {
        let ExposureSetting {
            gain,
            integration_time,
        } = self.exposure;
        let lux = self
            .get_lux(gain, integration_time)
            .await
            .map_err(|e| SensorError::from_driver("TSL2591", "read lux", e))?;

        Ok(Tsl2591Readings {
            milli_lux: (lux * 1000.0) as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_lux() {
        let exposure = ExposureSetting::default();
        let lux = compute_lux(1000, 500, &exposure);
        assert!((lux - 1020.0).abs() < 0.5, "got {}", lux);
    }

    #[test]
    fn test_saturation_is_zero_for_every_exposure() {
        for gain in [Gain::Low, Gain::Medium, Gain::High, Gain::Maximum] {
            let exposure = ExposureSetting {
                gain,
                integration_time: IntegrationTime::Longest,
            };
            assert_eq!(compute_lux(SATURATED, 10, &exposure), 0.0);
            assert_eq!(compute_lux(10, SATURATED, &exposure), 0.0);
        }
    }

    #[test]
    fn test_dark_full_channel_is_zero() {
        assert_eq!(compute_lux(0, 12, &ExposureSetting::default()), 0.0);
    }

    #[test]
    fn test_lux_scales_inversely_with_integration_time() {
        let short = ExposureSetting {
            gain: Gain::Medium,
            integration_time: IntegrationTime::Shortest,
        };
        let long = ExposureSetting {
            integration_time: IntegrationTime::Medium,
            ..short
        };
        let ratio = compute_lux(4000, 1000, &short) / compute_lux(4000, 1000, &long);
        assert!((ratio - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_control_register_encoding() {
        let exposure = ExposureSetting {
            gain: Gain::High,
            integration_time: IntegrationTime::Long,
        };
        assert_eq!(exposure.control(), 0x23);
    }
}
