//! BMP280 calibration coefficients and compensation functions.
//!
//! The factory-trimmed coefficients live in registers 0x88–0x9F as twelve little-endian pairs
//! (BST-BMP280-DS001 rev 1.26, section 3.11.2). Temperature is compensated with the
//! double-precision formula, pressure with the 64-bit fixed-point recurrence (section 3.11.3
//! and appendix 8).

use super::registers::CALIBRATION_LEN;

/// Factory-trimmed calibration coefficients (dig_T* and dig_P*).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalibrationData {
    /// Temperature coefficient 1 (unsigned, typical ~27000–28000)
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    /// Pressure coefficient 1 (unsigned, typical ~30000–37000)
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
}

impl CalibrationData {
    /// Decode the 24-byte block read from 0x88.
    pub fn from_bytes(buffer: [u8; CALIBRATION_LEN]) -> Self {
        let unsigned = |i: usize| u16::from_le_bytes([buffer[i], buffer[i + 1]]);
        let signed = |i: usize| i16::from_le_bytes([buffer[i], buffer[i + 1]]);

        Self {
            t1: unsigned(0),
            t2: signed(2),
            t3: signed(4),
            p1: unsigned(6),
            p2: signed(8),
            p3: signed(10),
            p4: signed(12),
            p5: signed(14),
            p6: signed(16),
            p7: signed(18),
            p8: signed(20),
            p9: signed(22),
        }
    }

    /// Fine temperature (t_fine) for a raw 20-bit temperature sample.
    ///
    /// Pure in `(raw, t1, t2, t3)`; identical inputs give bit-identical output.
    ///
    /// The T3 term uses the squared datasheet form on purpose: it reproduces the 25.08 °C worked
    /// example, the unsquared form does not.
    pub fn fine_temperature(&self, raw: i32) -> f64 {
        let raw = f64::from(raw);
        let t1 = f64::from(self.t1);

        let a = (raw / 16384.0 - t1 / 1024.0) * f64::from(self.t2);
        let b = raw / 131072.0 - t1 / 8192.0;
        a + b * b * f64::from(self.t3)
    }

    /// Temperature in °C for a raw 20-bit temperature sample.
    pub fn temperature(&self, raw: i32) -> f64 {
        self.fine_temperature(raw) / 5120.0
    }

    /// Pressure in Pa for a raw 20-bit pressure sample.
    ///
    /// Every intermediate is `i64`; `i32` silently truncates at the 35 and 47 bit shifts.
    /// Returns `0.0` when the scaled `p1` denominator is zero.
    pub fn compensate_pressure(&self, raw: i32, fine_temperature: f64) -> f64 {
        let mut a = fine_temperature as i64 - 128_000;
        let mut b = a * a * i64::from(self.p6);
        b += (a * i64::from(self.p5)) << 17;
        b += i64::from(self.p4) << 35;
        a = ((a * a * i64::from(self.p3)) >> 8) + ((a * i64::from(self.p2)) << 12);
        a = (((1_i64 << 47) + a) * i64::from(self.p1)) >> 33;

        if a == 0 {
            return 0.0; // avoid division by zero
        }

        let mut pressure = 1_048_576 - i64::from(raw);
        pressure = (((pressure << 31) - b) * 3125) / a;

        a = (i64::from(self.p9) * (pressure >> 13) * (pressure >> 13)) >> 25;
        b = (i64::from(self.p8) * pressure) >> 19;
        pressure = ((pressure + a + b) >> 8) + (i64::from(self.p7) << 4);

        pressure as f64 / 256.0
    }
}

/// Assemble a 20-bit sample from its MSB, LSB and XLSB registers.
pub fn raw_sample([msb, lsb, xlsb]: [u8; 3]) -> i32 {
    (i32::from(msb) << 12) + (i32::from(lsb) << 4) + (i32::from(xlsb) >> 4)
}
