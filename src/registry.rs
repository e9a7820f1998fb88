//! Registry of known sensors and their reading slots.
//!
//! The registry is built once from an ordered list of addresses and never
//! changes shape afterwards: slot `n` always belongs to `known_sensors()[n]`.
//! Each scan cycle the caller [`reset`](SensorRegistry::reset)s it and hands
//! the discovered advertisements to [`process`](SensorRegistry::process).

use crate::decoder;
use crate::discovery::DiscoveryRecord;
use crate::mac_address::{MacAddress, ParseMacError};
use crate::reading::Reading;
use tracing::debug;

/// Known sensors and the latest reading of each.
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    known: Vec<MacAddress>,
    data: Vec<Reading>,
}

impl SensorRegistry {
    /// Create a registry with one invalid slot per address.
    pub fn new(known: Vec<MacAddress>) -> Self {
        let data = vec![Reading::default(); known.len()];
        Self { known, data }
    }

    /// Create a registry from address strings such as `"A4:C1:38:0B:5E:F1"`.
    ///
    /// # Example
    /// ```
    /// use mithermometer_listener::SensorRegistry;
    ///
    /// let registry = SensorRegistry::from_addresses(["A4:C1:38:0B:5E:F1"]).unwrap();
    /// assert_eq!(registry.len(), 1);
    /// assert!(!registry.data()[0].valid);
    /// ```
    pub fn from_addresses<I, S>(addresses: I) -> Result<Self, ParseMacError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known = addresses
            .into_iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<MacAddress>, _>>()?;
        Ok(Self::new(known))
    }

    /// Known sensor addresses, in slot order.
    pub fn known_sensors(&self) -> &[MacAddress] {
        &self.known
    }

    /// Reading slots, one per known sensor. Only slots with `valid` set are fresh.
    pub fn data(&self) -> &[Reading] {
        &self.data
    }

    /// Reading slot for the sensor at `index` in construction order.
    pub fn get(&self, index: usize) -> Option<&Reading> {
        self.data.get(index)
    }

    /// Number of known sensors.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Returns `true` if no sensors are known.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Sensors seen in the current cycle, in slot order.
    pub fn iter_valid(&self) -> impl Iterator<Item = (MacAddress, &Reading)> {
        self.known
            .iter()
            .copied()
            .zip(self.data.iter())
            .filter(|(_, reading)| reading.valid)
    }

    /// Mark every slot stale. All other fields keep their last value.
    pub fn reset(&mut self) {
        for reading in &mut self.data {
            reading.valid = false;
        }
    }

    /// Match discovered advertisements against the known sensors.
    ///
    /// A match always refreshes `valid`, `name` and `rssi`. The payload fields
    /// are only overwritten when the service data decodes; otherwise the slot
    /// keeps its previous values. Records from unknown addresses are ignored.
    ///
    /// Returns the number of records examined.
    pub fn process(&mut self, discovered: &[DiscoveryRecord]) -> usize {
        for (n, (known, reading)) in self.known.iter().zip(self.data.iter_mut()).enumerate() {
            for record in discovered.iter().filter(|r| r.address == *known) {
                debug!(index = n, address = %known, rssi = record.rssi, "matched known sensor");

                reading.valid = true;
                reading.name = record.name.clone().unwrap_or_default();
                reading.rssi = record.rssi;

                let Some(service_data) = record.service_data.as_deref() else {
                    debug!(address = %known, "no service data");
                    continue;
                };

                match decoder::decode(service_data) {
                    Ok(fields) => {
                        debug!(address = %known, format = %fields.format, "decoded service data");
                        reading.apply(&fields);
                    }
                    Err(e) => debug!(address = %known, "{e}"),
                }
            }
        }

        discovered.len()
    }
}
