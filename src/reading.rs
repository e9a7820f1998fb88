//! Per-sensor reading slots and the fields a payload decodes into.

use std::fmt;

/// Service data layout a reading was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// 15-byte pvvx custom format, little-endian, 0.01 unit resolution.
    Custom,
    /// 13-byte ATC1441 format, big-endian, coarser native units.
    Atc1441,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Custom => write!(f, "custom"),
            PayloadFormat::Atc1441 => write!(f, "atc1441"),
        }
    }
}

/// Status bits carried in the last byte of the custom format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorFlags {
    /// Reed switch state (bit 0)
    pub reed_switch: bool,
    /// GPIO_TRG pin output state (bit 1)
    pub gpio_trigger_output: bool,
    /// Control parameters are set (bit 2)
    pub control_parameters: bool,
    /// Temperature trigger event (bit 3)
    pub temperature_trigger_event: bool,
    /// Humidity trigger event (bit 4)
    pub humidity_trigger_event: bool,
}

impl SensorFlags {
    fn bit(byte: u8, n: u8) -> bool {
        (byte >> n) & 0x01 == 1
    }
}

impl From<u8> for SensorFlags {
    fn from(byte: u8) -> Self {
        Self {
            reed_switch: Self::bit(byte, 0),
            gpio_trigger_output: Self::bit(byte, 1),
            control_parameters: Self::bit(byte, 2),
            temperature_trigger_event: Self::bit(byte, 3),
            humidity_trigger_event: Self::bit(byte, 4),
        }
    }
}

/// Values recovered from one service data payload.
///
/// Temperature and humidity are already normalized to 0.01 units regardless of
/// which format they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFields {
    pub format: PayloadFormat,
    /// Temperature in 0.01 °C
    pub temperature: i16,
    /// Relative humidity in 0.01 %
    pub humidity: u16,
    /// Battery voltage in millivolts
    pub battery_voltage: u16,
    /// Battery level in percent
    pub battery_level: u8,
    /// Event counter, custom format only
    pub count: Option<u8>,
    /// Status bits, custom format only
    pub flags: Option<SensorFlags>,
}

/// The reading slot of one known sensor.
///
/// Only `valid` is cleared between scan cycles. Every other field keeps its
/// last value until a new advertisement overwrites it, so consumers must check
/// `valid` before treating a slot as fresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reading {
    /// Set when the sensor was seen in the current scan cycle
    pub valid: bool,
    /// Advertised device name, empty if none was advertised
    pub name: String,
    /// Temperature in 0.01 °C
    pub temperature: i16,
    /// Relative humidity in 0.01 %
    pub humidity: u16,
    /// Battery voltage in millivolts
    pub battery_voltage: u16,
    /// Battery level in percent (0-100)
    pub battery_level: u8,
    /// Event counter (custom format only)
    pub count: Option<u8>,
    /// Status bits (custom format only)
    pub flags: Option<SensorFlags>,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Format of the last successfully decoded payload
    pub format: Option<PayloadFormat>,
}

impl Reading {
    /// Overwrite the payload-derived fields. Name, RSSI and validity are left alone.
    pub fn apply(&mut self, fields: &DecodedFields) {
        self.temperature = fields.temperature;
        self.humidity = fields.humidity;
        self.battery_voltage = fields.battery_voltage;
        self.battery_level = fields.battery_level;
        self.count = fields.count;
        self.flags = fields.flags;
        self.format = Some(fields.format);
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f64 {
        f64::from(self.temperature) / 100.0
    }

    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> f64 {
        f64::from(self.humidity) / 100.0
    }

    /// Battery voltage in volts.
    pub fn battery_volts(&self) -> f64 {
        f64::from(self.battery_voltage) / 1000.0
    }
}
