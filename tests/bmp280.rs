mod common;

use baro_sensors::bus::ConnectionSettings;
use baro_sensors::sensors::bmp280::{
    self, BMP280_ALTERNATE_ADDRESS, Bmp280Config, Bmp280Preset, SEA_LEVEL_HPA, Standby,
};
use baro_sensors::sensors::{Bmp280, Sensor, SensorReadings};
use common::*;
use embassy_futures::block_on;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;

#[test]
fn datasheet_temperature_end_to_end() {
    init_logger();
    let mut expectations = bmp280_setup();
    expectations.push(bmp280_temperature());
    let mut i2c = I2cMock::new(&expectations);
    let mut bmp = Bmp280::new(MockTransport::new(&i2c));

    let temperature = block_on(bmp.get_temperature()).unwrap();

    assert!((temperature - 25.08).abs() < 0.01, "got {}", temperature);
    i2c.done();
}

#[test]
fn pressure_reads_pressure_then_temperature() {
    let mut expectations = bmp280_setup();
    expectations.push(bmp280_pressure());
    expectations.push(bmp280_temperature());
    let mut i2c = I2cMock::new(&expectations);
    let mut bmp = Bmp280::new(MockTransport::new(&i2c));

    let pressure = block_on(bmp.get_pressure()).unwrap();

    assert!((pressure - 100653.25).abs() < 0.1, "got {}", pressure);
    i2c.done();
}

#[test]
fn altitude_from_datasheet_pressure() {
    let mut expectations = bmp280_setup();
    expectations.push(bmp280_pressure());
    expectations.push(bmp280_temperature());
    let mut i2c = I2cMock::new(&expectations);
    let mut bmp = Bmp280::new(MockTransport::new(&i2c));

    let altitude = block_on(bmp.get_altitude(SEA_LEVEL_HPA)).unwrap();

    assert!((altitude - 56.08).abs() < 0.05, "got {}", altitude);
    i2c.done();
}

#[test]
fn zero_p1_gives_zero_pressure() {
    let mut calibration = BMP280_CALIBRATION;
    calibration[6] = 0;
    calibration[7] = 0;
    let mut i2c = I2cMock::new(&[
        I2cTransaction::write_read(0x77, vec![0xD0], vec![0x58]),
        I2cTransaction::write_read(0x77, vec![0x88], calibration.to_vec()),
        I2cTransaction::write(0x77, vec![0xF4, 0x3F]),
        I2cTransaction::write(0x77, vec![0xF5, 0x00]),
        bmp280_pressure(),
        bmp280_temperature(),
    ]);
    let mut bmp = Bmp280::new(MockTransport::new(&i2c));

    assert_eq!(block_on(bmp.get_pressure()).unwrap(), 0.0);
    i2c.done();
}

#[test]
fn preset_and_alternate_address_are_programmed() {
    let config = Bmp280Config::from_preset(Bmp280Preset::Indoor, Standby::Ms62_5);
    let profile =
        bmp280::default_profile().with_settings(ConnectionSettings::new(BMP280_ALTERNATE_ADDRESS));
    let mut i2c = I2cMock::new(&[
        I2cTransaction::write_read(0x76, vec![0xD0], vec![0x58]),
        I2cTransaction::write_read(0x76, vec![0x88], BMP280_CALIBRATION.to_vec()),
        I2cTransaction::write(0x76, vec![0xF4, 0b010_111_11]),
        I2cTransaction::write(0x76, vec![0xF5, 0b001_100_00]),
    ]);
    let mut bmp = Bmp280::with_profile(MockTransport::new(&i2c), profile, config);

    block_on(bmp.ensure_ready()).unwrap();
    i2c.done();
}

#[test]
fn sensor_readings_in_milli_units() {
    let mut expectations = bmp280_setup();
    expectations.push(bmp280_temperature());
    expectations.push(bmp280_pressure());
    expectations.push(bmp280_temperature());
    let mut i2c = I2cMock::new(&expectations);
    let mut bmp = Bmp280::new(MockTransport::new(&i2c));

    let [temperature, pressure] = block_on(bmp.read()).unwrap().to_array();

    assert_eq!(temperature, 25082);
    assert_eq!(pressure, 100653);
    i2c.done();
}
