//! Measurement configuration written to `ctrl_meas` (0xF4) and `config` (0xF5).

use serde::{Deserialize, Serialize};

use super::registers::Bmp280Register;

/// Oversampling for either channel (osrs_t in ctrl_meas bits 7:5, osrs_p in bits 4:2).
///
/// | Variant | Bits | Resolution | Pressure RMS noise (typ) |
/// |---------|------|------------|--------------------------|
/// | Skipped | 000  | -          | channel not measured     |
/// | X1      | 001  | 16 bit     | ~3.3 Pa                  |
/// | X2      | 010  | 17 bit     | ~2.6 Pa                  |
/// | X4      | 011  | 18 bit     | ~2.1 Pa                  |
/// | X8      | 100  | 19 bit     | ~1.6 Pa                  |
/// | X16     | 111  | 20 bit     | ~1.3 Pa                  |
///
/// 101, 110 and 111 all select ×16.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b111,
}

/// Power mode (ctrl_meas bits 1:0).
///
/// Only modes that keep the result registers fresh without a host trigger are offered.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerMode {
    Sleep = 0b00,
    Normal = 0b11,
}

/// IIR filter coefficient (config bits 4:2).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum IirFilter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// Standby time between measurements in normal mode (config bits 7:5).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Standby {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms2000 = 0b110,
    Ms4000 = 0b111,
}

/// Datasheet recommended settings (section 3.4, table 7) that run in normal mode.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bmp280Preset {
    /// Handheld device, low power
    HandheldLowPower,
    /// Handheld device, dynamic
    HandheldDynamic,
    /// Elevator / floor change detection
    Elevator,
    /// Drop detection
    Drop,
    /// Indoor navigation
    Indoor,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bmp280Config {
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub mode: PowerMode,
    pub filter: IirFilter,
    pub standby: Standby,
}

impl Default for Bmp280Config {
    /// Temperature ×1, pressure ×16, normal mode, no filter: ctrl_meas `0x3F`, config `0x00`.
    fn default() -> Self {
        Self {
            temperature: Oversampling::X1,
            pressure: Oversampling::X16,
            mode: PowerMode::Normal,
            filter: IirFilter::Off,
            standby: Standby::Ms0_5,
        }
    }
}

impl Bmp280Config {
    pub fn from_preset(preset: Bmp280Preset, standby: Standby) -> Self {
        let (temperature, pressure, filter) = match preset {
            Bmp280Preset::HandheldLowPower => (Oversampling::X2, Oversampling::X16, IirFilter::X4),
            Bmp280Preset::HandheldDynamic => (Oversampling::X1, Oversampling::X4, IirFilter::X16),
            Bmp280Preset::Elevator => (Oversampling::X1, Oversampling::X4, IirFilter::X4),
            Bmp280Preset::Drop => (Oversampling::X1, Oversampling::X2, IirFilter::Off),
            Bmp280Preset::Indoor => (Oversampling::X2, Oversampling::X16, IirFilter::X16),
        };

        Self {
            temperature,
            pressure,
            mode: PowerMode::Normal,
            filter,
            standby,
        }
    }

    pub fn with_temperature(mut self, temperature: Oversampling) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_pressure(mut self, pressure: Oversampling) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn with_mode(mut self, mode: PowerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filter(mut self, filter: IirFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_standby(mut self, standby: Standby) -> Self {
        self.standby = standby;
        self
    }

    /// `(register, value)` for ctrl_meas.
    pub const fn ctrl_meas(&self) -> (u8, u8) {
        (
            Bmp280Register::CtrlMeas.addr(),
            (self.temperature as u8) << 5 | (self.pressure as u8) << 2 | self.mode as u8,
        )
    }

    /// `(register, value)` for config. The SPI 3-wire bit is always left clear.
    pub const fn config(&self) -> (u8, u8) {
        (
            Bmp280Register::Config.addr(),
            (self.standby as u8) << 5 | (self.filter as u8) << 2,
        )
    }
}
