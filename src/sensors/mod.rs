pub mod bmp280;
pub mod si7021;
pub mod tcs34725;
pub mod tsl2591;
pub mod veml6070;

use core::fmt::Debug;
use core::marker::PhantomData;

use log::error;
use thiserror_no_std::Error;

use crate::error::DriverError;

/// Maximum number of sensor values collected in one sweep over all sensors
pub const MAX_READINGS: usize = 10;

/// Error reported by [`Sensor::read`].
///
/// The bus error itself is logged where it happens; this type only keeps what the caller can
/// act on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} not found on the bus")]
    NotFound { sensor: &'static str },

    #[error("{sensor} answered with identity {actual:#04x}, expected {expected:#04x}")]
    WrongDevice {
        sensor: &'static str,
        expected: u8,
        actual: u8,
    },

    #[error("{sensor}: {operation} failed")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
    },
}

impl SensorError {
    /// Collapse a driver error into a [`SensorError`], logging the details.
    pub fn from_driver<E: Debug>(
        sensor: &'static str,
        operation: &'static str,
        err: DriverError<E>,
    ) -> Self {
        error!("{} {} failed: {:?}", sensor, operation, err);
        match err {
            DriverError::DeviceNotFound(_) => Self::NotFound { sensor },
            DriverError::IdMismatch {
                expected, actual, ..
            } => Self::WrongDevice {
                sensor,
                expected,
                actual,
            },
            DriverError::NotConnected(_) | DriverError::Transport(_) => {
                Self::ReadFailed { sensor, operation }
            }
        }
    }
}

/// Trait for sensor reading data structures.
/// Provides compile-time guarantees about the number of values and their conversion to arrays.
pub trait SensorReadings<const COUNT: usize> {
    /// Convert the readings into a fixed-size array.
    fn to_array(self) -> [i32; COUNT];
}

/// Trait for sensors that produce typed readings.
pub trait Sensor<const COUNT: usize> {
    /// The type of readings this sensor produces.
    type Readings: SensorReadings<COUNT>;

    /// Read the sensor and return typed readings.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, SensorError>>;
}

// Type-level index markers
pub struct Idx<const N: usize>;

/// A sensor pinned to a slot range of the readings array.
pub struct IndexedSensor<S, const START: usize, const COUNT: usize>
where
    S: Sensor<COUNT>,
{
    sensor: S,
    _marker: PhantomData<Idx<START>>,
}

impl<S, const START: usize, const COUNT: usize> From<S> for IndexedSensor<S, START, COUNT>
where
    S: Sensor<COUNT>,
{
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

impl<S, const START: usize, const COUNT: usize> IndexedSensor<S, START, COUNT>
where
    S: Sensor<COUNT>,
{
    pub const fn new(sensor: S) -> Self {
        Self {
            sensor,
            _marker: PhantomData,
        }
    }

    /// Read the sensor and store its values at `START..START + COUNT`.
    pub async fn read_into(&mut self, values: &mut [i32; MAX_READINGS]) -> Result<(), SensorError> {
        let readings = self.sensor.read().await?;
        values[START..START + COUNT].copy_from_slice(&readings.to_array());
        Ok(())
    }

    pub const fn start_index() -> usize {
        START
    }

    pub const fn value_count() -> usize {
        COUNT
    }

    /// Absolute index of one of this sensor's readings.
    pub const fn reading_index(offset: usize) -> usize {
        START + offset
    }

    pub fn sensor(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn into_inner(self) -> S {
        self.sensor
    }
}

pub mod indices {
    //! Slot layout of the readings array.
    //!
    //! Nothing ties these constants to the sensors other than the aliases below, so keep the
    //! two in sync when adding a sensor.

    use crate::sensors::IndexedSensor;
    use crate::sensors::{Bmp280, Si7021, Tcs34725, Tsl2591, Veml6070};

    pub type Bmp280Indexed<T> = IndexedSensor<Bmp280<T>, 0, 2>;
    pub type Si7021Indexed<T> = IndexedSensor<Si7021<T>, 2, 2>;
    pub type Tsl2591Indexed<T, D> = IndexedSensor<Tsl2591<T, D>, 4, 1>;
    pub type Veml6070Indexed<T, D> = IndexedSensor<Veml6070<T, D>, 5, 1>;
    pub type Tcs34725Indexed<T, D> = IndexedSensor<Tcs34725<T, D>, 6, 4>;

    /// BMP280 temperature, m°C
    pub const TEMPERATURE: usize = 0;
    /// BMP280 pressure, Pa
    pub const PRESSURE: usize = 1;
    /// Si7021 relative humidity, milli-percent
    pub const HUMIDITY: usize = 2;
    /// Si7021 temperature, m°C
    pub const HUMIDITY_TEMPERATURE: usize = 3;
    /// TSL2591 illuminance, milli-lux
    pub const LUX: usize = 4;
    /// VEML6070 raw UV counts
    pub const UV: usize = 5;
    /// TCS34725 clear, red, green, blue counts
    pub const CLEAR: usize = 6;
    pub const RED: usize = 7;
    pub const GREEN: usize = 8;
    pub const BLUE: usize = 9;
}

pub use bmp280::Bmp280;
pub use indices::*;
pub use si7021::Si7021;
pub use tcs34725::Tcs34725;
pub use tsl2591::Tsl2591;
pub use veml6070::Veml6070;
