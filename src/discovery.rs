//! Discovered advertisements and the collaborator that supplies them.
//!
//! The registry never drives radio hardware. Whatever performs the scan
//! implements [`DiscoverySource`] and hands over one batch of
//! [`DiscoveryRecord`]s per scan cycle; the scan duration is its concern.
//!
//! [`LineSource`] is the bundled implementation. It reads advertisements
//! captured by an external scanner as text, one per line:
//!
//! ```text
//! A4:C1:38:0B:5E:F1 -67 0201061216 1a18f15e0b38c1a434121027204b5a0715
//! ```
//!
//! that is address, RSSI in dBm and the raw advertising data as hex (spaces
//! inside the hex are allowed). A blank line ends a scan cycle, `#` starts a
//! comment.

use crate::advertising::parse_advertising_data;
use crate::mac_address::{MacAddress, ParseMacError};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};

/// One advertisement seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub address: MacAddress,
    /// Advertised local name, if any
    pub name: Option<String>,
    /// Environmental Sensing service data, if any
    pub service_data: Option<Vec<u8>>,
    /// Received signal strength in dBm
    pub rssi: i16,
}

impl DiscoveryRecord {
    /// Build a record from raw advertising data.
    pub fn from_advertising_data(address: MacAddress, rssi: i16, data: &[u8]) -> Self {
        let parsed = parse_advertising_data(data);
        Self {
            address,
            name: parsed.name,
            service_data: parsed.service_data,
            rssi,
        }
    }
}

/// Error type for discovery sources.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors returned when parsing a captured advertisement line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseRecordError {
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Address(#[from] ParseMacError),
    #[error("invalid RSSI: '{0}'")]
    InvalidRssi(String),
    #[error("invalid advertising data: {0}")]
    InvalidHex(String),
}

/// Supplier of discovered advertisements, one batch per scan cycle.
pub trait DiscoverySource: Send {
    /// Collect the advertisements seen within `duration`.
    ///
    /// Returns `Ok(None)` once the source has nothing more to deliver.
    fn scan(
        &mut self,
        duration: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<DiscoveryRecord>>, ScanError>> + Send + '_>>;
}

/// Decode a hex string, ignoring embedded whitespace.
fn decode_hex(src: &str) -> Result<Vec<u8>, ParseRecordError> {
    let digits: Vec<u8> = src.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(ParseRecordError::InvalidHex("odd number of digits".into()));
    }

    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| {
                    ParseRecordError::InvalidHex(String::from_utf8_lossy(pair).into_owned())
                })
        })
        .collect()
}

/// Split off the first whitespace-delimited field, returning it and the rest.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_once(char::is_whitespace).unwrap_or((s, "")))
}

/// Parse one captured advertisement line.
///
/// # Example
/// ```
/// use mithermometer_listener::discovery::parse_record;
///
/// let record = parse_record("A4:C1:38:0B:5E:F1 -67 0b094154435f304235454631").unwrap();
/// assert_eq!(record.rssi, -67);
/// assert_eq!(record.name.as_deref(), Some("ATC_0B5EF1"));
/// assert_eq!(record.service_data, None);
/// ```
pub fn parse_record(line: &str) -> Result<DiscoveryRecord, ParseRecordError> {
    let (address_field, rest) =
        next_field(line).ok_or(ParseRecordError::MissingField("address"))?;
    let address: MacAddress = address_field.parse()?;

    let (rssi_field, rest) = next_field(rest).ok_or(ParseRecordError::MissingField("rssi"))?;
    let rssi: i16 = rssi_field
        .parse()
        .map_err(|_| ParseRecordError::InvalidRssi(rssi_field.to_string()))?;

    let data = decode_hex(rest)?;

    Ok(DiscoveryRecord::from_advertising_data(address, rssi, &data))
}

/// Reads captured advertisements from a line-oriented text stream.
pub struct LineSource<R> {
    lines: Lines<R>,
    exhausted: bool,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    /// Wrap a buffered reader; every call to `scan` consumes one cycle of lines.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            exhausted: false,
        }
    }

    // Reads until a blank line or end of input. Cancel-safe: a line is
    // either consumed and pushed, or left in the reader.
    async fn read_cycle(&mut self, records: &mut Vec<DiscoveryRecord>) -> io::Result<()> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                return Ok(());
            }
            if line.starts_with('#') {
                continue;
            }

            match parse_record(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping line '{line}': {e}"),
            }
        }

        self.exhausted = true;
        Ok(())
    }
}

impl LineSource<BufReader<Stdin>> {
    /// Read captured advertisements from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> DiscoverySource for LineSource<R> {
    fn scan(
        &mut self,
        duration: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<DiscoveryRecord>>, ScanError>> + Send + '_>>
    {
        Box::pin(async move {
            if self.exhausted {
                return Ok(None);
            }

            let mut records = Vec::new();
            match tokio::time::timeout(duration, self.read_cycle(&mut records)).await {
                Ok(result) => result?,
                Err(_) => debug!(?duration, "scan duration elapsed"),
            }

            if self.exhausted && records.is_empty() {
                return Ok(None);
            }
            Ok(Some(records))
        })
    }
}
