//! `mithermometer-listener` library.
//!
//! Decodes the service data broadcast by thermometers running the
//! ATC_MiThermometer firmware, for a fixed list of known sensors.
//!
//! The core is [`decoder::decode`], a pure function from service data bytes
//! to a reading, and [`SensorRegistry`], which matches discovered
//! advertisements to known sensors and keeps one reading slot per sensor.
//! Scanning itself is left to a [`DiscoverySource`].
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing and process exit
//! codes; the scan loop lives in [`crate::app`].

pub mod advertising;
pub mod alias;
pub mod app;
pub mod decoder;
pub mod discovery;
pub mod duration;
pub mod mac_address;
pub mod output;
pub mod reading;
pub mod registry;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use alias::{Alias, AliasMap, parse_alias, resolve_name, to_map};
pub use decoder::{DecodeError, decode};
pub use discovery::{DiscoveryRecord, DiscoverySource, LineSource, ScanError};
pub use duration::parse_duration;
pub use mac_address::{MacAddress, ParseMacError};
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use reading::{DecodedFields, PayloadFormat, Reading, SensorFlags};
pub use registry::SensorRegistry;
