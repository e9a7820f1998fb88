use crate::discovery::DiscoveryRecord;
use crate::mac_address::MacAddress;

/// A stable address for unit tests.
pub const TEST_MAC: MacAddress = MacAddress([0xA4, 0xC1, 0x38, 0x0B, 0x5E, 0xF1]);

/// A second known sensor.
pub const OTHER_MAC: MacAddress = MacAddress([0xA4, 0xC1, 0x38, 0x6D, 0x22, 0x09]);

/// Custom format: 46.60 °C, 100.00 %, 19232 mV, 90 %, count 7, flags 0x15.
pub fn custom_payload() -> Vec<u8> {
    vec![
        0xF1, 0x5E, 0x0B, 0x38, 0xC1, 0xA4, // MAC, reversed
        0x34, 0x12, // temperature
        0x10, 0x27, // humidity
        0x20, 0x4B, // battery mV
        0x5A, // battery %
        0x07, // count
        0x15, // flags
    ]
}

/// ATC1441 format: 1.0 °C, 50 %, 90 %, 8267 mV.
pub fn atc1441_payload() -> Vec<u8> {
    vec![
        0xA4, 0xC1, 0x38, 0x0B, 0x5E, 0xF1, // MAC
        0x00, 0x0A, // temperature
        0x32, // humidity
        0x5A, // battery %
        0x20, 0x4B, // battery mV
        0x03, // frame counter
    ]
}

/// Build a discovery record with the given payload.
pub fn record(
    address: MacAddress,
    name: Option<&str>,
    service_data: Option<Vec<u8>>,
    rssi: i16,
) -> DiscoveryRecord {
    DiscoveryRecord {
        address,
        name: name.map(str::to_string),
        service_data,
        rssi,
    }
}
