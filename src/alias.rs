//! Human-readable names for known sensors.
//!
//! An alias given on the command line always wins over the name the sensor
//! advertises itself, which in turn wins over the bare address.

use crate::mac_address::MacAddress;
use std::borrow::Cow;
use std::collections::HashMap;

/// A type alias for address-to-name mappings.
pub type AliasMap = HashMap<MacAddress, String>;

/// A parsed alias mapping an address to a human-readable name.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub address: MacAddress,
    pub name: String,
}

/// Parse an alias from a string in the format "MAC=NAME".
///
/// # Example
/// ```
/// use mithermometer_listener::alias::parse_alias;
///
/// let alias = parse_alias("A4:C1:38:0B:5E:F1=Bathroom").unwrap();
/// assert_eq!(alias.address.to_string(), "A4:C1:38:0B:5E:F1");
/// assert_eq!(alias.name, "Bathroom");
/// ```
pub fn parse_alias(src: &str) -> Result<Alias, String> {
    let (address, name) = src
        .split_once('=')
        .ok_or_else(|| "invalid alias: expected format MAC=NAME".to_string())?;

    if name.is_empty() {
        return Err("invalid alias: name is empty".to_string());
    }

    let address = address
        .parse()
        .map_err(|e| format!("invalid alias: {e}"))?;

    Ok(Alias {
        address,
        name: name.to_string(),
    })
}

/// Convert a slice of Alias values into an AliasMap. Later entries win.
pub fn to_map(aliases: &[Alias]) -> AliasMap {
    aliases
        .iter()
        .map(|a| (a.address, a.name.clone()))
        .collect()
}

/// Pick the display name for a sensor.
pub fn resolve_name<'a>(
    mac: &MacAddress,
    advertised: &'a str,
    aliases: &'a AliasMap,
) -> Cow<'a, str> {
    match aliases.get(mac) {
        Some(alias) => Cow::Borrowed(alias.as_str()),
        None if !advertised.is_empty() => Cow::Borrowed(advertised),
        None => Cow::Owned(mac.to_string()),
    }
}
