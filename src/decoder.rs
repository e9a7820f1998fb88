//! Decoder for ATC_MiThermometer service data.
//!
//! Sensors running the ATC_MiThermometer firmware broadcast their readings as
//! service data under the Environmental Sensing UUID (0x181A). Two layouts are
//! in use and they are told apart only by length:
//!
//! | bytes | custom (15 bytes, little-endian) | ATC1441 (13 bytes, big-endian) |
//! |-------|----------------------------------|--------------------------------|
//! | 0-5   | MAC address                      | MAC address                    |
//! | 6-7   | temperature, 0.01 °C             | temperature, 0.1 °C            |
//! | 8     | humidity low byte, 0.01 %        | humidity, 1 %                  |
//! | 9     | humidity high byte               | battery level, %               |
//! | 10-11 | battery voltage, mV              | battery voltage, mV            |
//! | 12    | battery level, %                 | frame counter (ignored)        |
//! | 13    | counter                          |                                |
//! | 14    | flags                            |                                |
//!
//! The two layouts use opposite byte orders; both are normalized to the
//! 0.01 units of the custom format.

use crate::reading::{DecodedFields, PayloadFormat, SensorFlags};
use thiserror::Error;

/// Length of a custom (pvvx) format payload.
pub const CUSTOM_FORMAT_LEN: usize = 15;

/// Length of an ATC1441 format payload.
pub const ATC1441_FORMAT_LEN: usize = 13;

/// Error returned for service data that is not one of the known layouts.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized service data format: {len} bytes")]
    UnrecognizedFormat { len: usize },
}

/// Decode one service data payload.
///
/// The format is selected by `data.len()` alone; any length other than 13 or
/// 15 yields [`DecodeError::UnrecognizedFormat`].
pub fn decode(data: &[u8]) -> Result<DecodedFields, DecodeError> {
    match data.len() {
        CUSTOM_FORMAT_LEN => Ok(decode_custom(data)),
        ATC1441_FORMAT_LEN => Ok(decode_atc1441(data)),
        len => Err(DecodeError::UnrecognizedFormat { len }),
    }
}

// Callers guarantee data.len() == CUSTOM_FORMAT_LEN.
fn decode_custom(data: &[u8]) -> DecodedFields {
    DecodedFields {
        format: PayloadFormat::Custom,
        temperature: i16::from_le_bytes([data[6], data[7]]),
        humidity: u16::from_le_bytes([data[8], data[9]]),
        battery_voltage: u16::from_le_bytes([data[10], data[11]]),
        battery_level: data[12],
        count: Some(data[13]),
        flags: Some(SensorFlags::from(data[14])),
    }
}

// Callers guarantee data.len() == ATC1441_FORMAT_LEN.
fn decode_atc1441(data: &[u8]) -> DecodedFields {
    // 0.1 °C -> 0.01 °C. Wraps on i16 like the firmware client does; the
    // sensor range (-40..85 °C) never gets there.
    let temperature = i16::from_be_bytes([data[6], data[7]]).wrapping_mul(10);

    DecodedFields {
        format: PayloadFormat::Atc1441,
        temperature,
        // whole percent -> 0.01 %, at most 25500
        humidity: u16::from(data[8]) * 100,
        battery_voltage: u16::from_be_bytes([data[10], data[11]]),
        battery_level: data[9],
        count: None,
        flags: None,
    }
}
