use embedded_hal_async::delay::DelayNs;
use serde::{Deserialize, Serialize};

use super::{Sensor, SensorError, SensorReadings};
use crate::bus::{BusErrorOf, BusTransport, ConnectionSettings};
use crate::device::{ConnectionState, DeviceProfile, I2cDevice, NoSetup};
use crate::error::DriverError;

const DEFAULT_ADDRESS: u8 = 0x39;

const ADDRESS_HIGH: u8 = 0x39;
const ADDRESS_LOW: u8 = 0x38;
const ALERT_RESPONSE: u8 = 0x0C;

/// Integration time of one 1T period with the recommended 270 kΩ RSET.
const BASE_INTEGRATION_MS: u32 = 63;

/// Integration time as a multiple of the base period.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationTime {
    #[default]
    Short,
    Medium,
    Long,
    Longer,
}

impl IntegrationTime {
    pub const fn level(self) -> u32 {
        match self {
            Self::Short => 1,
            Self::Medium => 2,
            Self::Long => 4,
            Self::Longer => 8,
        }
    }

    pub const fn millis(self) -> u32 {
        BASE_INTEGRATION_MS * self.level()
    }
}

pub const fn default_profile() -> DeviceProfile {
    DeviceProfile::new("VEML6070", ConnectionSettings::new(DEFAULT_ADDRESS))
}

pub struct Veml6070Readings {
    pub uv: i32,
}

impl SensorReadings<1> for Veml6070Readings {
    fn to_array(self) -> [i32; 1] {
        [self.uv]
    }
}

/// Vishay VEML6070 UV sensor. It has no identity register.
pub struct Veml6070<T: BusTransport, D = embassy_time::Delay> {
    device: I2cDevice<T, NoSetup>,
    delay: D,
    integration_time: IntegrationTime,
}

impl<T: BusTransport> Veml6070<T> {
    pub fn new(transport: T) -> Self {
        Self::with_delay(transport, embassy_time::Delay)
    }
}

impl<T: BusTransport, D: DelayNs> Veml6070<T, D> {
    pub fn with_delay(transport: T, delay: D) -> Self {
        Self::with_profile(transport, delay, default_profile())
    }

    pub fn with_profile(transport: T, delay: D, profile: DeviceProfile) -> Self {
        Self {
            device: I2cDevice::new(transport, profile, NoSetup),
            delay,
            integration_time: IntegrationTime::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.device.state()
    }

    /// Integration time used by [`Sensor::read`].
    pub fn set_integration_time(&mut self, integration_time: IntegrationTime) {
        self.integration_time = integration_time;
    }

    /// Raw UV counts after one integration period.
    pub async fn get_uv(
        &mut self,
        integration_time: IntegrationTime,
    ) -> Result<f64, DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;

        self.delay.delay_ms(integration_time.millis()).await;

        ready.handle.write_register(ALERT_RESPONSE, 0x01).await?;
        let high = ready.handle.read_register(ADDRESS_HIGH, |[b]: [u8; 1]| b).await?;
        let low = ready.handle.read_register(ADDRESS_LOW, |[b]: [u8; 1]| b).await?;

        Ok(f64::from(u16::from_be_bytes([high, low])))
    }
}

impl<T: BusTransport, D: DelayNs> Sensor<1> for Veml6070<T, D> {
    type Readings = Veml6070Readings;

    async fn read(&mut self) -> Result<Veml6070Readings, SensorError> {
        let uv = self
            .get_uv(self.integration_time)
            .await
            .map_err(|e| SensorError::from_driver("VEML6070", "read UV", e))?;

        Ok(Veml6070Readings { uv: uv as i32 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_time_scales_with_level() {
        assert_eq!(IntegrationTime::Short.millis(), 63);
        assert_eq!(IntegrationTime::Longer.millis(), 504);
    }
}
