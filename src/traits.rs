//! Hardware abstraction traits

use crate::error::SensorError;

/// Trait for relative humidity sensors
pub trait HumiditySensor {
    /// Read relative humidity in percent
    fn read_humidity(&mut self) -> Result<f32, SensorError>;
}

/// Trait for the outbound side of the BLE service
pub trait PublishChannel {
    /// Store `encoded` as the characteristic value and notify the subscribed client
    fn publish(&mut self, encoded: u16);
}
