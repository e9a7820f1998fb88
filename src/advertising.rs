//! Parsing of raw BLE advertising data.
//!
//! Advertising data is a sequence of AD structures, each `[len, type, data...]`
//! where `len` counts the type byte plus the data. Only the pieces needed to
//! build a [`DiscoveryRecord`](crate::discovery::DiscoveryRecord) are kept: the
//! local name and the service data published under the Environmental Sensing
//! service.

/// Environmental Sensing service UUID that ATC_MiThermometer service data is published under.
pub const ENVIRONMENTAL_SENSING_UUID: u16 = 0x181A;

// AD types
const AD_TYPE_SHORTENED_LOCAL_NAME: u8 = 0x08;
const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
const AD_TYPE_SERVICE_DATA_16: u8 = 0x16;

/// Fields extracted from one advertising payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdvertisingData {
    /// Complete local name, or the shortened one if that is all there is
    pub name: Option<String>,
    /// Service data for [`ENVIRONMENTAL_SENSING_UUID`], without the UUID prefix
    pub service_data: Option<Vec<u8>>,
}

/// Iterator over the `(type, data)` pairs of an advertising payload.
///
/// Stops at the first zero-length or truncated structure.
pub fn ad_structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        let len = usize::from(*data.get(offset)?);
        if len == 0 || offset + 1 + len > data.len() {
            return None;
        }

        let ad_type = data[offset + 1];
        let value = &data[offset + 2..offset + 1 + len];
        offset += 1 + len;
        Some((ad_type, value))
    })
}

/// Extract the local name and Environmental Sensing service data.
///
/// Whatever was found before a malformed structure is still returned.
pub fn parse_advertising_data(data: &[u8]) -> AdvertisingData {
    let mut parsed = AdvertisingData::default();
    let mut shortened_name = None;

    for (ad_type, value) in ad_structures(data) {
        match ad_type {
            AD_TYPE_COMPLETE_LOCAL_NAME => {
                parsed.name = Some(String::from_utf8_lossy(value).into_owned());
            }
            AD_TYPE_SHORTENED_LOCAL_NAME => {
                shortened_name = Some(String::from_utf8_lossy(value).into_owned());
            }
            AD_TYPE_SERVICE_DATA_16 if value.len() >= 2 && parsed.service_data.is_none() => {
                let uuid = u16::from_le_bytes([value[0], value[1]]);
                if uuid == ENVIRONMENTAL_SENSING_UUID {
                    parsed.service_data = Some(value[2..].to_vec());
                }
            }
            _ => {}
        }
    }

    if parsed.name.is_none() {
        parsed.name = shortened_name;
    }
    parsed
}
