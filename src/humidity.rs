//! Humidity wire format shared with the client.
//!
//! The characteristic carries a `u16` equal to the relative humidity times
//! 100. The presentation format descriptor tells the client to scale it by
//! 10^-2 and display it as a percentage.

use crate::error::SensorError;

/// Largest encoded value (100.00 %).
pub const MAX_ENCODED: u16 = 10_000;

/// Characteristic Presentation Format (0x2904) for the humidity value.
pub const PRESENTATION_FORMAT: [u8; 7] = [
    0x06, // format: uint16
    0xFE, // exponent: -2
    0xAD, 0x27, // unit: percentage (0x27AD), little endian
    0x01, // namespace: Bluetooth SIG
    0x00, 0x00, // description: none
];

/// Convert a humidity reading in percent to the characteristic value.
///
/// Non-finite readings are rejected. Finite readings are clamped into
/// [0, 100] so the result always fits the advertised range.
pub fn encode(humidity: f32) -> Result<u16, SensorError> {
    if !humidity.is_finite() {
        return Err(SensorError::InvalidReading);
    }

    // Exact in f64. Non-negative after the clamp, so adding 0.5 rounds half
    // away from zero.
    let scaled = humidity.clamp(0.0, 100.0) as f64 * 100.0;
    Ok((scaled + 0.5) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_example_reading() {
        assert_eq!(encode(55.5), Ok(5550));
        // sent little endian
        assert_eq!(5550u16.to_le_bytes(), [0xAE, 0x15]);
    }

    #[test]
    fn rounds_to_nearest_hundredth() {
        assert_eq!(encode(42.004), Ok(4200));
        assert_eq!(encode(42.006), Ok(4201));
        assert_eq!(encode(0.0), Ok(0));
    }

    #[test]
    fn full_range_fits_u16() {
        let mut step = 0;
        while step <= 1000 {
            let humidity = step as f32 / 10.0;
            let encoded = encode(humidity).unwrap();
            let expected = (humidity as f64 * 100.0).round() as i64;
            assert_eq!(encoded as i64, expected, "{humidity}");
            assert!(encoded <= MAX_ENCODED);
            step += 1;
        }
        assert_eq!(encode(100.0), Ok(MAX_ENCODED));
    }

    #[test]
    fn matches_round_at_half_hundredth_boundaries() {
        let below = 0.005f32.next_down();
        let cases = [0.005f32, below, 0.015, 12.345, 55.555, 99.995, 99.994];
        for humidity in cases {
            let expected = (humidity as f64 * 100.0).round() as i64;
            assert_eq!(encode(humidity).unwrap() as i64, expected, "{humidity}");
        }
    }

    #[test]
    fn rejects_non_finite_readings() {
        assert_eq!(encode(f32::NAN), Err(SensorError::InvalidReading));
        assert_eq!(encode(f32::INFINITY), Err(SensorError::InvalidReading));
        assert_eq!(encode(f32::NEG_INFINITY), Err(SensorError::InvalidReading));
    }

    #[test]
    fn clamps_out_of_range_readings() {
        assert_eq!(encode(-3.0), Ok(0));
        assert_eq!(encode(104.2), Ok(MAX_ENCODED));
    }

    #[test]
    fn presentation_format_declares_percent_hundredths() {
        assert_eq!(PRESENTATION_FORMAT[0], 0x06);
        assert_eq!(PRESENTATION_FORMAT[1] as i8, -2);
        assert_eq!(u16::from_le_bytes([PRESENTATION_FORMAT[2], PRESENTATION_FORMAT[3]]), 0x27AD);
        assert_eq!(PRESENTATION_FORMAT[4], 0x01);
    }
}
