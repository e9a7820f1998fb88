//! Core application runner for `mithermometer-listener`.
//!
//! This module is decoupled from CLI parsing and process exit codes so it can
//! be tested deterministically with an injected discovery source.

use crate::alias::{Alias, AliasMap, resolve_name};
use crate::discovery::{DiscoverySource, ScanError};
use crate::mac_address::MacAddress;
use crate::output::OutputFormatter;
use crate::output::influxdb::InfluxDbFormatter;
use crate::registry::SensorRegistry;
use clap::Parser;
use std::io;
use std::io::Write;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration for the scan loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Address of a known sensor. Repeat for each sensor; output order follows
    /// the order given here.
    /// Format: --sensor A4:C1:38:0B:5E:F1
    #[arg(long = "sensor", value_name = "MAC", required = true)]
    pub sensors: Vec<MacAddress>,

    /// Specify human-readable alias for a sensor.
    /// Format: --alias A4:C1:38:0B:5E:F1=Bathroom
    #[arg(long = "alias", value_parser = crate::alias::parse_alias, value_name = "ALIAS")]
    pub aliases: Vec<Alias>,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "mithermometer")]
    pub influxdb_measurement: String,

    /// How long each scan cycle collects advertisements.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    #[arg(long, default_value = "10s", value_parser = crate::duration::parse_duration)]
    pub scan_duration: Duration,

    /// Stop after this many scan cycles (0 = until input ends).
    #[arg(long, default_value_t = 0)]
    pub cycles: u64,

    /// Verbose output, log matching and decode details
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// Errors returned by the scan loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn write_fresh_readings(
    registry: &SensorRegistry,
    formatter: &dyn OutputFormatter,
    aliases: &AliasMap,
    timestamp: SystemTime,
    out: &mut dyn Write,
) -> io::Result<()> {
    for (mac, reading) in registry.iter_valid() {
        let name = resolve_name(&mac, &reading.name, aliases);
        let line = formatter.format(&mac, reading, &name, timestamp);
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Run scan cycles, writing one line per freshly seen sensor to `out`.
///
/// Each cycle resets the registry, asks `source` for one batch of
/// advertisements and matches it. Stops when the source is exhausted or
/// after `options.cycles` cycles.
pub async fn run_with_io(
    options: Options,
    source: &mut dyn DiscoverySource,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    let aliases = crate::alias::to_map(&options.aliases);
    let formatter = InfluxDbFormatter::new(options.influxdb_measurement);
    let mut registry = SensorRegistry::new(options.sensors);

    info!(
        sensors = registry.len(),
        scan_duration = ?options.scan_duration,
        "listening for known sensors"
    );

    let mut cycle: u64 = 0;
    while options.cycles == 0 || cycle < options.cycles {
        registry.reset();

        let Some(records) = source.scan(options.scan_duration).await? else {
            debug!("discovery source exhausted");
            break;
        };
        cycle += 1;

        let examined = registry.process(&records);
        debug!(
            cycle,
            examined,
            fresh = registry.iter_valid().count(),
            "scan cycle complete"
        );

        for (mac, reading) in registry.known_sensors().iter().zip(registry.data()) {
            if !reading.valid {
                debug!(address = %mac, "sensor not seen this cycle");
            }
        }

        write_fresh_readings(&registry, &formatter, &aliases, SystemTime::now(), out)?;
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryRecord;
    use crate::test_utils::{OTHER_MAC, TEST_MAC, atc1441_payload, custom_payload, record};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;

    /// Hands out pre-built scan cycles, then reports exhaustion.
    #[derive(Debug, Default)]
    struct FakeSource {
        cycles: VecDeque<Vec<DiscoveryRecord>>,
        scans: usize,
    }

    impl FakeSource {
        fn new(cycles: Vec<Vec<DiscoveryRecord>>) -> Self {
            Self {
                cycles: cycles.into(),
                scans: 0,
            }
        }
    }

    impl DiscoverySource for FakeSource {
        fn scan(
            &mut self,
            _duration: Duration,
        ) -> Pin<
            Box<
                dyn Future<Output = Result<Option<Vec<DiscoveryRecord>>, ScanError>> + Send + '_,
            >,
        > {
            self.scans += 1;
            let next = self.cycles.pop_front();
            Box::pin(async move { Ok(next) })
        }
    }

    fn options() -> Options {
        Options {
            sensors: vec![TEST_MAC, OTHER_MAC],
            aliases: vec![],
            influxdb_measurement: "mithermometer".to_string(),
            scan_duration: Duration::from_secs(10),
            cycles: 0,
            verbose: false,
            quiet: false,
        }
    }

    async fn run(options: Options, source: &mut FakeSource) -> String {
        let mut out = Vec::<u8>::new();
        run_with_io(options, source, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn run_writes_fresh_readings_in_slot_order() {
        let mut source = FakeSource::new(vec![vec![
            record(OTHER_MAC, Some("ATC_6D2209"), Some(atc1441_payload()), -80),
            record(TEST_MAC, Some("ATC_0B5EF1"), Some(custom_payload()), -60),
        ]]);

        let out = run(options(), &mut source).await;
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("mac=A4:C1:38:0B:5E:F1"));
        assert!(lines[0].contains("name=ATC_0B5EF1"));
        assert!(lines[0].contains("temperature=46.6"));
        assert!(lines[1].contains("mac=A4:C1:38:6D:22:09"));
        assert!(lines[1].contains("format=atc1441"));
        assert!(out.ends_with('\n'));
    }

    #[tokio::test]
    async fn run_skips_sensors_not_seen_in_cycle() {
        let mut source = FakeSource::new(vec![
            vec![
                record(TEST_MAC, None, Some(custom_payload()), -60),
                record(OTHER_MAC, None, Some(atc1441_payload()), -80),
            ],
            vec![record(OTHER_MAC, None, Some(atc1441_payload()), -82)],
        ]);

        let out = run(options(), &mut source).await;
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("mac=A4:C1:38:6D:22:09"));
        assert!(lines[2].contains("rssi=-82"));
    }

    #[tokio::test]
    async fn run_ignores_unknown_sensors() {
        let stranger = MacAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        let mut source = FakeSource::new(vec![vec![record(
            stranger,
            Some("LYWSD03MMC"),
            Some(custom_payload()),
            -40,
        )]]);

        assert!(run(options(), &mut source).await.is_empty());
    }

    #[tokio::test]
    async fn run_uses_alias_over_advertised_name() {
        let mut source = FakeSource::new(vec![vec![record(
            TEST_MAC,
            Some("ATC_0B5EF1"),
            Some(custom_payload()),
            -60,
        )]]);
        let mut opts = options();
        opts.aliases = vec![crate::alias::parse_alias("A4:C1:38:0B:5E:F1=Sauna").unwrap()];

        let out = run(opts, &mut source).await;
        assert!(out.contains("name=Sauna"));
        assert!(!out.contains("ATC_0B5EF1"));
    }

    #[tokio::test]
    async fn run_keeps_stale_values_for_undecodable_payload() {
        let mut source = FakeSource::new(vec![
            vec![record(TEST_MAC, None, Some(custom_payload()), -60)],
            vec![record(TEST_MAC, None, Some(vec![0u8; 9]), -61)],
        ]);

        let out = run(options(), &mut source).await;
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("temperature=46.6"));
        assert!(lines[1].contains("rssi=-61"));
    }

    #[tokio::test]
    async fn run_stops_after_requested_cycles() {
        let mut source = FakeSource::new(vec![
            vec![record(TEST_MAC, None, Some(custom_payload()), -60)],
            vec![record(TEST_MAC, None, Some(custom_payload()), -61)],
            vec![record(TEST_MAC, None, Some(custom_payload()), -62)],
        ]);
        let mut opts = options();
        opts.cycles = 2;

        let out = run(opts, &mut source).await;

        assert_eq!(out.lines().count(), 2);
        assert_eq!(source.scans, 2);
    }

    #[test]
    fn options_parse_from_args() {
        let opts = Options::try_parse_from([
            "mithermometer-listener",
            "--sensor",
            "a4:c1:38:0b:5e:f1",
            "--sensor",
            "A4:C1:38:6D:22:09",
            "--alias",
            "A4:C1:38:0B:5E:F1=Kitchen",
            "--scan-duration",
            "30s",
        ])
        .unwrap();

        assert_eq!(opts.sensors, vec![TEST_MAC, OTHER_MAC]);
        assert_eq!(opts.aliases[0].name, "Kitchen");
        assert_eq!(opts.scan_duration, Duration::from_secs(30));
        assert_eq!(opts.cycles, 0);
        assert_eq!(opts.influxdb_measurement, "mithermometer");
    }

    #[test]
    fn options_require_a_sensor() {
        assert!(Options::try_parse_from(["mithermometer-listener"]).is_err());
        assert!(
            Options::try_parse_from(["mithermometer-listener", "--sensor", "not-a-mac"]).is_err()
        );
    }
}
