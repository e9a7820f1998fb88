//! Output formatters for sensor readings.
//!
//! Only fresh slots are handed to a formatter; the caller decides which
//! readings are `valid`.

pub mod influxdb;

use crate::mac_address::MacAddress;
use crate::reading::Reading;
use std::time::SystemTime;

/// Trait for formatting one sensor reading into an output line.
pub trait OutputFormatter: Send + Sync {
    /// Format a reading.
    ///
    /// # Arguments
    /// * `mac` - Address of the sensor the slot belongs to
    /// * `reading` - The reading slot
    /// * `name` - Display name, already resolved from aliases
    /// * `timestamp` - When the scan cycle that produced the reading finished
    fn format(
        &self,
        mac: &MacAddress,
        reading: &Reading,
        name: &str,
        timestamp: SystemTime,
    ) -> String;
}
