use serde::{Deserialize, Serialize};

use crate::bus::ConnectionSettings;
use crate::device::{DEFAULT_CONTROLLER, DeviceProfile};
use crate::sensors::bmp280::Bmp280Config;
use crate::sensors::tcs34725::ColorSetting;
use crate::sensors::tsl2591::ExposureSetting;
use crate::sensors::{bmp280, si7021, tcs34725, tsl2591, veml6070};

/// Board wiring and measurement settings for every sensor.
///
/// Profiles can only be built from a `SensorsConfig<'static>`, since [`DeviceProfile`] keeps the
/// controller name for the lifetime of the driver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct SensorsConfig<'a> {
    /// Controller selector shared by all sensors
    pub controller: &'a str,
    pub bmp280: Bmp280Settings,
    pub si7021: ConnectionSettings,
    pub tsl2591: Tsl2591Settings,
    pub veml6070: Veml6070Settings,
    pub tcs34725: Tcs34725Settings,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bmp280Settings {
    pub connection: ConnectionSettings,
    pub measurement: Bmp280Config,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tsl2591Settings {
    pub connection: ConnectionSettings,
    pub exposure: ExposureSetting,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Veml6070Settings {
    pub connection: ConnectionSettings,
    pub integration_time: veml6070::IntegrationTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tcs34725Settings {
    pub connection: ConnectionSettings,
    pub color: ColorSetting,
}

impl Default for SensorsConfig<'_> {
    fn default() -> Self {
        Self {
            controller: DEFAULT_CONTROLLER,
            bmp280: Bmp280Settings {
                connection: bmp280::default_profile().settings,
                measurement: Bmp280Config::default(),
            },
            si7021: si7021::default_profile().settings,
            tsl2591: Tsl2591Settings {
                connection: tsl2591::default_profile().settings,
                exposure: ExposureSetting::default(),
            },
            veml6070: Veml6070Settings {
                connection: veml6070::default_profile().settings,
                integration_time: veml6070::IntegrationTime::default(),
            },
            tcs34725: Tcs34725Settings {
                connection: tcs34725::default_profile().settings,
                color: ColorSetting::default(),
            },
        }
    }
}

impl SensorsConfig<'static> {
    fn profile(&self, base: DeviceProfile, settings: ConnectionSettings) -> DeviceProfile {
        base.with_controller(self.controller).with_settings(settings)
    }

    pub fn bmp280_profile(&self) -> DeviceProfile {
        self.profile(bmp280::default_profile(), self.bmp280.connection)
    }

    pub fn si7021_profile(&self) -> DeviceProfile {
        self.profile(si7021::default_profile(), self.si7021)
    }

    pub fn tsl2591_profile(&self) -> DeviceProfile {
        self.profile(tsl2591::default_profile(), self.tsl2591.connection)
    }

    pub fn veml6070_profile(&self) -> DeviceProfile {
        self.profile(veml6070::default_profile(), self.veml6070.connection)
    }

    pub fn tcs34725_profile(&self) -> DeviceProfile {
        self.profile(tcs34725::default_profile(), self.tcs34725.connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusSpeed, SharingMode};

    #[test]
    fn test_default_wiring() {
        let config = SensorsConfig::default();
        assert_eq!(config.controller, "I2C1");
        assert_eq!(config.bmp280.connection.address, 0x77);
        assert_eq!(config.si7021.address, 0x40);
        assert_eq!(config.tsl2591.connection.address, 0x29);
        assert_eq!(config.veml6070.connection.address, 0x39);
        assert_eq!(config.tcs34725.connection.address, 0x29);
        assert_eq!(config.si7021.speed, BusSpeed::Fast);
        assert_eq!(config.si7021.sharing, SharingMode::Shared);
    }

    #[test]
    fn test_profile_keeps_identity_and_takes_wiring() {
        let mut config = SensorsConfig::default();
        config.controller = "I2C0";
        config.bmp280.connection.address = 0x76;

        let profile = config.bmp280_profile();
        assert_eq!(profile.controller, "I2C0");
        assert_eq!(profile.settings.address, 0x76);
        assert_eq!(profile.identity, bmp280::default_profile().identity);
    }
}
