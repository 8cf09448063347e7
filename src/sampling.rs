//! Decoding of the BME280 measurement settings registers.
//!
//! Reading `ctrl_hum` (0xF2) through `config` (0xF5) back after init shows
//! what the driver actually programmed.

/// First register of the settings block.
pub const SETTINGS_START_REGISTER: u8 = 0xF2;

/// `ctrl_hum`, `status`, `ctrl_meas`, `config`.
pub const SETTINGS_LEN: usize = 4;

/// Oversampling factors (0 = channel skipped) and IIR filter coefficient
/// (0 = off).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSettings {
    pub humidity_oversampling: u8,
    pub temperature_oversampling: u8,
    pub pressure_oversampling: u8,
    pub filter_coefficient: u8,
}

impl SamplingSettings {
    /// 1x on every channel, filter off.
    pub const PLAIN: Self = Self {
        humidity_oversampling: 1,
        temperature_oversampling: 1,
        pressure_oversampling: 1,
        filter_coefficient: 0,
    };

    pub fn from_registers(regs: [u8; SETTINGS_LEN]) -> Self {
        let [ctrl_hum, _status, ctrl_meas, config] = regs;
        Self {
            humidity_oversampling: oversampling(ctrl_hum & 0b111),
            temperature_oversampling: oversampling(ctrl_meas >> 5),
            pressure_oversampling: oversampling((ctrl_meas >> 2) & 0b111),
            filter_coefficient: filter((config >> 2) & 0b111),
        }
    }
}

fn oversampling(bits: u8) -> u8 {
    match bits {
        0 => 0,
        1 => 1,
        2 => 2,
        3 => 4,
        4 => 8,
        _ => 16,
    }
}

fn filter(bits: u8) -> u8 {
    match bits {
        0 => 0,
        1 => 2,
        2 => 4,
        3 => 8,
        _ => 16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_configuration() {
        // osrs_h=1x, osrs_t=1x, osrs_p=1x, forced mode, filter off
        let settings = SamplingSettings::from_registers([0x01, 0x00, 0b001_001_01, 0x00]);
        assert_eq!(settings, SamplingSettings::PLAIN);
    }

    #[test]
    fn mode_and_standby_bits_are_ignored() {
        let sleeping = SamplingSettings::from_registers([0x01, 0x08, 0b001_001_00, 0b101_000_00]);
        assert_eq!(sleeping, SamplingSettings::PLAIN);
    }

    #[test]
    fn decodes_driver_init_defaults() {
        // what the driver's plain `init` programs: 2x temperature, 16x
        // pressure, 1x humidity, filter coefficient 16
        let settings = SamplingSettings::from_registers([0x01, 0x00, 0b010_101_11, 0b000_100_00]);
        assert_eq!(
            settings,
            SamplingSettings {
                humidity_oversampling: 1,
                temperature_oversampling: 2,
                pressure_oversampling: 16,
                filter_coefficient: 16,
            }
        );
        assert_ne!(settings, SamplingSettings::PLAIN);
    }

    #[test]
    fn skipped_channel_reads_as_zero() {
        let settings = SamplingSettings::from_registers([0x00, 0x00, 0b000_001_01, 0x00]);
        assert_eq!(settings.humidity_oversampling, 0);
        assert_eq!(settings.temperature_oversampling, 0);
    }
}
