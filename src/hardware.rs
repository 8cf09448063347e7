use core::cell::RefCell;

use bme280::{Configuration, i2c::BME280};
use embedded_hal_bus::i2c::RefCellDevice;
use esp_hal::gpio::AnyPin;
use esp_hal::{
    Blocking,
    delay::Delay,
    i2c::master::{Config as I2cConfig, I2c},
    peripherals::I2C0,
    time::Rate,
};

use crate::{
    config::{BME280_PRIMARY_ADDRESS, BME280_SECONDARY_ADDRESS, I2C_FREQ_KHZ},
    error::SensorError,
    sampling::{SETTINGS_LEN, SETTINGS_START_REGISTER, SamplingSettings},
    traits::HumiditySensor,
};

/// The sensor bus, shared so the BME280 can be tried at both addresses.
pub type I2cBus = RefCell<I2c<'static, Blocking>>;

pub fn init_i2c<SDA, SCL>(
    i2c_periph: I2C0<'static>,
    sda: SDA,
    scl: SCL,
) -> Result<I2c<'static, Blocking>, SensorError>
where
    SDA: Into<AnyPin<'static>>,
    SCL: Into<AnyPin<'static>>,
{
    let i2c = I2c::new(
        i2c_periph,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQ_KHZ)),
    )
    .map_err(|e| {
        log::error!("[I2C] invalid bus configuration: {:?}", e);
        SensorError::Bus
    })?
    .with_sda(sda.into())
    .with_scl(scl.into());

    Ok(i2c)
}

/// Log every address that acknowledges an empty write.
pub fn scan(bus: &I2cBus) {
    esp_println::println!("I2C scan start");
    let mut i2c = bus.borrow_mut();
    for addr in 0x03..=0x77u8 {
        if i2c.write(addr, &[]).is_ok() {
            esp_println::println!("Found device at 0x{:02X}", addr);
        }
    }
    esp_println::println!("I2C scan done");
}

/// Read the measurement settings the sensor at `address` is running with.
pub fn read_settings(bus: &I2cBus, address: u8) -> Result<SamplingSettings, SensorError> {
    let mut regs = [0u8; SETTINGS_LEN];
    bus.borrow_mut()
        .write_read(address, &[SETTINGS_START_REGISTER], &mut regs)
        .map_err(|_| SensorError::Bus)?;
    Ok(SamplingSettings::from_registers(regs))
}

pub struct Bme280Hardware<'a> {
    sensor: BME280<RefCellDevice<'a, I2c<'static, Blocking>>>,
    delay: Delay,
    address: u8,
}

impl<'a> Bme280Hardware<'a> {
    /// Initialise the BME280 at 0x76, falling back to 0x77.
    ///
    /// `Configuration::default()` is 1x oversampling on all channels with
    /// the IIR filter off. The plain `init` would program 2x/16x and filter
    /// 16 instead. Every read runs a forced conversion.
    pub fn detect(bus: &'a I2cBus) -> Result<Self, SensorError> {
        let mut delay = Delay::new();

        for address in [BME280_PRIMARY_ADDRESS, BME280_SECONDARY_ADDRESS] {
            let device = RefCellDevice::new(bus);
            let mut sensor = if address == BME280_PRIMARY_ADDRESS {
                BME280::new_primary(device)
            } else {
                BME280::new_secondary(device)
            };

            log::info!("[BME280] Trying 0x{:02X}", address);
            match sensor.init_with_config(&mut delay, Configuration::default()) {
                Ok(()) => {
                    log::info!("[BME280] Initialized at 0x{:02X}", address);
                    match read_settings(bus, address) {
                        Ok(settings) => log::info!("[BME280] Sampling: {:?}", settings),
                        Err(e) => log::warn!("[BME280] Could not read back settings: {}", e),
                    }
                    return Ok(Self {
                        sensor,
                        delay,
                        address,
                    });
                }
                Err(e) => log::warn!("[BME280] No sensor at 0x{:02X}: {:?}", address, e),
            }
        }

        Err(SensorError::NotFound)
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

impl HumiditySensor for Bme280Hardware<'_> {
    fn read_humidity(&mut self) -> Result<f32, SensorError> {
        let measurements = self.sensor.measure(&mut self.delay).map_err(|e| {
            log::error!("[BME280] measurement failed: {:?}", e);
            SensorError::Bus
        })?;

        log::debug!(
            "[BME280] {:.2} C, {:.0} Pa, {:.2} %",
            measurements.temperature,
            measurements.pressure,
            measurements.humidity
        );
        Ok(measurements.humidity)
    }
}
