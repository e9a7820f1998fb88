//! InfluxDB line protocol output formatter.

use crate::mac_address::MacAddress;
use crate::output::OutputFormatter;
use crate::reading::Reading;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Backslash-escape `special` characters. Line breaks cannot be escaped in
/// line protocol and become escaped spaces.
fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' | '\r' => out.push_str("\\ "),
            c if c == '\\' || special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape commas, equals signs and spaces in tag keys and values.
fn escape_tag(value: &str) -> String {
    escape(value, &[',', '=', ' '])
}

/// Escape commas and spaces in the measurement name.
fn escape_measurement(value: &str) -> String {
    escape(value, &[',', ' '])
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<SystemTime>,
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", escape_measurement(&self.measurement))?;
        for (key, value) in &self.tag_set {
            write!(fmt, ",{}={}", escape_tag(key), escape_tag(value))?;
        }

        let mut sep = " ";
        for (key, value) in &self.field_set {
            write!(fmt, "{sep}{}={value}", escape_tag(key))?;
            sep = ",";
        }

        // Timestamps before the epoch are dropped and InfluxDB assigns its own.
        if let Some(nanos) = self
            .timestamp
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
        {
            write!(fmt, " {nanos}")?;
        }
        Ok(())
    }
}

/// InfluxDB line protocol formatter.
///
/// Temperature is written in °C, humidity as a fraction (0-1) and battery
/// potential in volts.
/// Counter and flag fields are only present for custom-format readings.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    /// Create a formatter writing points under `measurement_name`.
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn tag_set(mac: &MacAddress, reading: &Reading, name: &str) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("mac".to_string(), mac.to_string());
        tags.insert("name".to_string(), name.to_string());
        if let Some(format) = reading.format {
            tags.insert("format".to_string(), format.to_string());
        }
        tags
    }

    fn field_set(reading: &Reading) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();

        macro_rules! add {
            ($name:literal, $val:expr) => {
                fields.insert($name.into(), $val);
            };
        }

        add!("rssi", FieldValue::Float(f64::from(reading.rssi)));

        // A sensor seen without any decodable payload has only name and RSSI.
        if reading.format.is_none() {
            return fields;
        }

        add!("temperature", FieldValue::Float(reading.temperature_celsius()));
        add!("humidity", FieldValue::Float(reading.humidity_percent() / 100.0));
        add!("battery_potential", FieldValue::Float(reading.battery_volts()));
        add!("battery_level", FieldValue::Float(f64::from(reading.battery_level)));

        if let Some(count) = reading.count {
            add!("count", FieldValue::Float(f64::from(count)));
        }
        if let Some(flags) = reading.flags {
            add!("reed_switch", FieldValue::Boolean(flags.reed_switch));
            add!("gpio_trigger_output", FieldValue::Boolean(flags.gpio_trigger_output));
            add!("control_parameters", FieldValue::Boolean(flags.control_parameters));
            add!(
                "temperature_trigger_event",
                FieldValue::Boolean(flags.temperature_trigger_event)
            );
            add!(
                "humidity_trigger_event",
                FieldValue::Boolean(flags.humidity_trigger_event)
            );
        }

        fields
    }

    fn to_data_point(
        &self,
        mac: &MacAddress,
        reading: &Reading,
        name: &str,
        timestamp: SystemTime,
    ) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: Self::tag_set(mac, reading, name),
            field_set: Self::field_set(reading),
            timestamp: Some(timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(
        &self,
        mac: &MacAddress,
        reading: &Reading,
        name: &str,
        timestamp: SystemTime,
    ) -> String {
        self.to_data_point(mac, reading, name, timestamp).to_string()
    }
}
