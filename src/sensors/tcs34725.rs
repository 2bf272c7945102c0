//! AMS TCS34725 colour light-to-digital converter.

use embedded_hal_async::delay::DelayNs;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{Sensor, SensorError, SensorReadings};
use crate::bus::{BusErrorOf, BusTransport, ConnectionSettings};
use crate::device::{ConnectionState, DeviceProfile, I2cDevice, NoSetup};
use crate::error::DriverError;

mod registers {
    pub const COMMAND: u8 = 0x80;
    /// Auto-increment transaction type, for the 8-byte colour burst.
    pub const AUTO_INCREMENT: u8 = 0x20;
    pub const ENABLE: u8 = 0x00;
    pub const ATIME: u8 = 0x01;
    pub const CONTROL: u8 = 0x0F;
    pub const ID: u8 = 0x12;
    pub const CDATAL: u8 = 0x14;

    pub const ENABLE_PON: u8 = 0x01;
    pub const ENABLE_AEN: u8 = 0x02;

    /// TCS34721/TCS34725; the 3 and 7 variants answer 0x4D.
    pub const DEVICE_ID: u8 = 0x44;
    pub const DEFAULT_ADDRESS: u8 = 0x29;

    /// Oscillator wake-up time after PON (2.4 ms minimum), ms.
    pub const POWER_ON_DELAY_MS: u32 = 3;
}

/// RGBC gain.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    /// 1×
    #[default]
    Low,
    /// 4×
    Medium,
    /// 16×
    High,
    /// 60×
    Maximum,
}

impl Gain {
    pub const fn code(self) -> u8 {
        match self {
            Self::Low => 0x00,
            Self::Medium => 0x01,
            Self::High => 0x02,
            Self::Maximum => 0x03,
        }
    }
}

/// RGBC integration time (ATIME).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationTime {
    /// 2.4 ms
    Shortest,
    /// 24 ms
    Shorter,
    /// 103.2 ms
    #[default]
    Medium,
    /// 153.6 ms
    Long,
    /// 614.4 ms
    Longer,
}

impl IntegrationTime {
    pub const fn code(self) -> u8 {
        match self {
            Self::Shortest => 0xFF,
            Self::Shorter => 0xF6,
            Self::Medium => 0xD5,
            Self::Long => 0xC0,
            Self::Longer => 0x00,
        }
    }

    /// 2.4 ms per integration cycle, 256 - ATIME cycles.
    pub const fn micros(self) -> u32 {
        (256 - self.code() as u32) * 2400
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSetting {
    pub gain: Gain,
    pub integration_time: IntegrationTime,
}

/// Raw channel counts of one RGBC conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb {
    /// Decode the CDATAL..BDATAH burst.
    pub fn from_bytes(buffer: [u8; 8]) -> Self {
        let channel = |i: usize| u16::from_le_bytes([buffer[i], buffer[i + 1]]);
        Self {
            clear: channel(0),
            red: channel(2),
            green: channel(4),
            blue: channel(6),
        }
    }
}

impl SensorReadings<4> for Rgb {
    fn to_array(self) -> [i32; 4] {
        [
            i32::from(self.clear),
            i32::from(self.red),
            i32::from(self.green),
            i32::from(self.blue),
        ]
    }
}

pub const fn default_profile() -> DeviceProfile {
    DeviceProfile::new("TCS34725", ConnectionSettings::new(registers::DEFAULT_ADDRESS))
        .with_identity(registers::COMMAND | registers::ID, registers::DEVICE_ID)
}

pub struct Tcs34725<T: BusTransport, D = embassy_time::Delay> {
    device: I2cDevice<T, NoSetup>,
    delay: D,
    setting: ColorSetting,
}

impl<T: BusTransport> Tcs34725<T> {
    pub fn new(transport: T) -> Self {
        Self::with_delay(transport, embassy_time::Delay)
    }
}

impl<T: BusTransport, D: DelayNs> Tcs34725<T, D> {
    pub fn with_delay(transport: T, delay: D) -> Self {
        Self::with_profile(transport, delay, default_profile())
    }

    pub fn with_profile(transport: T, delay: D, profile: DeviceProfile) -> Self {
        Self {
            device: I2cDevice::new(transport, profile, NoSetup),
            delay,
            setting: ColorSetting::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.device.state()
    }

    pub fn setting(&self) -> ColorSetting {
        self.setting
    }

    /// Programmed on the next [`Tcs34725::get_rgb`].
    pub fn set_setting(&mut self, setting: ColorSetting) {
        self.setting = setting;
    }

    /// Store gain and integration time and program ATIME and CONTROL.
    pub async fn configure(
        &mut self,
        gain: Gain,
        integration_time: IntegrationTime,
    ) -> Result<(), DriverError<BusErrorOf<T>>> {
        let ready = self.device.ensure_ready().await?;
        self.setting = ColorSetting {
            gain,
            integration_time,
        };
        debug!("TCS34725: {:?}", self.setting);

        ready
            .handle
            .write_register(registers::COMMAND | registers::ATIME, integration_time.code())
            .await?;
        ready
            .handle
            .write_register(registers::COMMAND | registers::CONTROL, gain.code())
            .await
    }

    /// One RGBC conversion with the stored setting.
    pub async fn get_rgb(&mut self) -> Result<Rgb, DriverError<BusErrorOf<T>>> {
        let ColorSetting {
            gain,
            integration_time,
        } = self.setting;
        self.configure(gain, integration_time).await?;

        let ready = self.device.ensure_ready().await?;
        let enable = registers::COMMAND | registers::ENABLE;

        ready
            .handle
            .write_register(enable, registers::ENABLE_PON)
            .await?;
        self.delay.delay_ms(registers::POWER_ON_DELAY_MS).await;
        ready
            .handle
            .write_register(enable, registers::ENABLE_PON | registers::ENABLE_AEN)
            .await?;

        self.delay.delay_us(integration_time.micros()).await;

        let rgb = ready
            .handle
            .read_register(
                registers::COMMAND | registers::AUTO_INCREMENT | registers::CDATAL,
                Rgb::from_bytes,
            )
            .await?;

        ready.handle.write_register(enable, 0x00).await?;
        Ok(rgb)
    }
}

impl<T: BusTransport, D: DelayNs> Sensor<4> for Tcs34725<T, D> {
    type Readings = Rgb;

    async fn read(&mut self) -> Result<Rgb, SensorError> {
        self.get_rgb()
            .await
            .map_err(|e| SensorError::from_driver("TCS34725", "read colour", e))
    }
}
