//! Compile-time configuration. There is no runtime configuration surface.

/// Name advertised in the scan response and exposed by the GAP service.
pub const DEVICE_NAME: &str = "ESP32-BME280";

/// Automatic publish interval while a client is connected (60000ms = 1 minute).
pub const UPDATE_INTERVAL_MS: u64 = 60_000;

/// Sleep between main loop iterations.
pub const POLL_PERIOD_MS: u64 = 100;

// BME280 wiring: SDA on GPIO8, SCL on GPIO9 (same header as the BMP280 board)
pub const I2C_FREQ_KHZ: u32 = 100;
pub const BME280_PRIMARY_ADDRESS: u8 = 0x76;
pub const BME280_SECONDARY_ADDRESS: u8 = 0x77;

/// Static random address; the two most significant bits must be set.
pub const BLE_ADDRESS: [u8; 6] = [0xff, 0x8f, 0x1a, 0x05, 0xe4, 0xc3];

/// Longest accepted write to the command characteristic.
pub const COMMAND_MAX_LEN: usize = 20;

/// Heap handed to esp-alloc, used by the radio driver.
pub const HEAP_SIZE: usize = 72 * 1024;
