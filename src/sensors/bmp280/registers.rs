/// BMP280 register map (Bosch Sensortec BMP280 datasheet, revision 1.26).
///
/// Key groups:
/// - **Measurement results** - 0xF7–0xFC: pressure (20-bit) then temperature (20-bit), MSB first
/// - **Control registers** - 0xF4 (ctrl_meas), 0xF5 (config: IIR + standby)
/// - **ID** - 0xD0 (chip ID)
/// - **Calibration** - 0x88–0x9F (24 bytes, read-only, factory trimmed)
///
/// Reads auto-increment, so a burst starting at an MSB register returns MSB, LSB, XLSB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bmp280Register {
    // followed by TempLsb, TempXlsb
    TempMsb = 0xFA,
    // followed by PressLsb, PressXlsb
    PressMsb = 0xF7,
    Config = 0xF5,
    CtrlMeas = 0xF4,
    // Chip identification number, 0x58 after start up
    Id = 0xD0,
    // dig_T1 LSB, first of twelve little-endian pairs
    CalibStart = 0x88,
}

impl Bmp280Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

pub const BMP280_CHIP_ID: u8 = 0x58;

/// Slave address with SDO pulled high, as on the common breakout boards.
pub const BMP280_DEFAULT_ADDRESS: u8 = 0x77;
/// Slave address with SDO tied to GND.
pub const BMP280_ALTERNATE_ADDRESS: u8 = 0x76;

/// Length of the calibration block starting at [`Bmp280Register::CalibStart`].
pub const CALIBRATION_LEN: usize = 24;
