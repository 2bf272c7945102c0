mod common;

use baro_sensors::device::ConnectionState;
use baro_sensors::error::DriverError;
use baro_sensors::sensors::tsl2591::{ExposureSetting, Gain, IntegrationTime};
use baro_sensors::sensors::{Sensor, SensorReadings, Tsl2591};
use common::*;
use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
use std::future::Future;
use std::pin::pin;
use std::task::{Context, Waker};

/// Never finishes its first wait; later waits return immediately.
#[derive(Default)]
struct StallFirstDelay {
    stalled: bool,
}

impl DelayNs for StallFirstDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        if !self.stalled {
            self.stalled = true;
            core::future::pending::<()>().await;
        }
    }
}

fn identity() -> I2cTransaction {
    I2cTransaction::write_read(0x29, vec![0xB2], vec![0x50])
}

fn measurement(control: u8, full: u16, ir: u16) -> Vec<I2cTransaction> {
    vec![
        I2cTransaction::write(0x29, vec![0xA1, control]),
        I2cTransaction::write(0x29, vec![0xA0, 0x93]),
        I2cTransaction::write_read(0x29, vec![0xB4], full.to_le_bytes().to_vec()),
        I2cTransaction::write_read(0x29, vec![0xB6], ir.to_le_bytes().to_vec()),
        I2cTransaction::write(0x29, vec![0xA0, 0x00]),
    ]
}

#[test]
fn reference_measurement() {
    init_logger();
    let mut expectations = vec![identity()];
    expectations.extend(measurement(0x00, 1000, 500));
    let mut i2c = I2cMock::new(&expectations);
    let delay = RecordingDelay::default();
    let mut tsl = Tsl2591::with_delay(MockTransport::new(&i2c), delay.clone());

    let lux = block_on(tsl.get_lux(Gain::Low, IntegrationTime::Shortest)).unwrap();

    assert!((lux - 1020.0).abs() < 0.5, "got {}", lux);
    assert_eq!(delay.waits(), vec![100 * MS]);
    assert_eq!(tsl.state(), ConnectionState::Initialized);
    i2c.done();
}

#[test]
fn saturated_channel_is_zero_lux() {
    let mut expectations = vec![identity()];
    expectations.extend(measurement(0x35, 0xFFFF, 1200));
    expectations.extend(measurement(0x35, 3000, 0xFFFF));
    let mut i2c = I2cMock::new(&expectations);
    let delay = RecordingDelay::default();
    let mut tsl = Tsl2591::with_delay(MockTransport::new(&i2c), delay.clone());

    let first = block_on(tsl.get_lux(Gain::Maximum, IntegrationTime::Longest)).unwrap();
    let second = block_on(tsl.get_lux(Gain::Maximum, IntegrationTime::Longest)).unwrap();

    assert_eq!(first, 0.0);
    assert_eq!(second, 0.0);
    assert_eq!(delay.waits(), vec![600 * MS, 600 * MS]);
    i2c.done();
}

#[test]
fn exposure_persists_for_sensor_reads() {
    let mut expectations = vec![identity()];
    expectations.extend(measurement(0x21, 4000, 1000));
    expectations.extend(measurement(0x21, 4000, 1000));
    let mut i2c = I2cMock::new(&expectations);
    let delay = RecordingDelay::default();
    let mut tsl = Tsl2591::with_delay(MockTransport::new(&i2c), delay.clone());

    let explicit = block_on(tsl.get_lux(Gain::High, IntegrationTime::Shorter)).unwrap();
    assert_eq!(
        tsl.exposure(),
        ExposureSetting {
            gain: Gain::High,
            integration_time: IntegrationTime::Shorter,
        }
    );

    let [milli_lux] = block_on(tsl.read()).unwrap().to_array();

    assert_eq!(milli_lux, (explicit * 1000.0) as i32);
    assert_eq!(delay.waits(), vec![200 * MS, 200 * MS]);
    i2c.done();
}

#[test]
fn wrong_identity_is_reported() {
    let mut i2c = I2cMock::new(&[I2cTransaction::write_read(0x29, vec![0xB2], vec![0x44])]);
    let mut tsl = Tsl2591::with_delay(MockTransport::new(&i2c), RecordingDelay::default());

    let result = block_on(tsl.get_lux(Gain::Low, IntegrationTime::Shortest));

    assert_eq!(
        result,
        Err(DriverError::IdMismatch {
            device: "TSL2591",
            expected: 0x50,
            actual: 0x44,
        })
    );
    assert_eq!(tsl.state(), ConnectionState::Connected);
    i2c.done();
}

#[test]
fn disable_powers_down() {
    let mut i2c = I2cMock::new(&[identity(), I2cTransaction::write(0x29, vec![0xA0, 0x00])]);
    let mut tsl = Tsl2591::with_delay(MockTransport::new(&i2c), RecordingDelay::default());

    block_on(tsl.disable()).unwrap();
    i2c.done();
}

#[test]
fn measurement_after_cancelled_wait_starts_over() {
    init_logger();
    let mut expectations = vec![
        identity(),
        I2cTransaction::write(0x29, vec![0xA1, 0x00]),
        I2cTransaction::write(0x29, vec![0xA0, 0x93]),
    ];
    expectations.extend(measurement(0x00, 1000, 500));
    let mut i2c = I2cMock::new(&expectations);
    let mut tsl = Tsl2591::with_delay(MockTransport::new(&i2c), StallFirstDelay::default());

    {
        let first = pin!(tsl.get_lux(Gain::Low, IntegrationTime::Shortest));
        let mut cx = Context::from_waker(Waker::noop());
        assert!(first.poll(&mut cx).is_pending());
    }

    let lux = block_on(tsl.get_lux(Gain::Low, IntegrationTime::Shortest)).unwrap();

    assert!((lux - 1020.0).abs() < 0.5, "got {}", lux);
    assert_eq!(tsl.state(), ConnectionState::Initialized);
    i2c.done();
}
