use core::fmt;

/// Failures of the humidity sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No BME280 answered at either I2C address.
    NotFound,
    /// I2C transfer or compensation failed.
    Bus,
    /// The sensor produced a non-finite value.
    InvalidReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "BME280 not found at 0x76 or 0x77, check wiring"),
            Self::Bus => write!(f, "BME280 I2C read failed"),
            Self::InvalidReading => write!(f, "BME280 returned a non-finite humidity"),
        }
    }
}

/// Failures while bringing up the BLE stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    Radio,
    Connector,
    Gatt(&'static str),
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio => write!(f, "radio initialisation failed"),
            Self::Connector => write!(f, "BLE HCI connector could not be created"),
            Self::Gatt(reason) => write!(f, "GATT server setup failed: {}", reason),
        }
    }
}
