//! Outbound sinks for the local binary.
//!
//! - push: one JSON object per line on stdout
//! - log: CSV rows `date,time,water_level,foam_level,pump_state`
//! - messaging: report text into the tracing log

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use eyre::WrapErr;
use foamguard_core::{Emission, FoamState, Sink, StatusSnapshot};
use serde::Serialize;

type SinkResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Writes push snapshots as JSON lines.
pub struct JsonlPushSink<W> {
    out: W,
}

impl JsonlPushSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> JsonlPushSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> Sink for JsonlPushSink<W> {
    fn deliver(&mut self, emission: &Emission, _timeout: Duration) -> SinkResult {
        let Emission::Push(snapshot) = emission else {
            return Ok(());
        };
        let line = serde_json::to_string(snapshot)?;
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct LogRow {
    date: String,
    time: String,
    water_level: Option<u8>,
    foam_level: Option<u8>,
    pump_state: &'static str,
}

impl From<&StatusSnapshot> for LogRow {
    fn from(s: &StatusSnapshot) -> Self {
        let local = s.timestamp.with_timezone(&chrono::Local);
        Self {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
            water_level: s.level.map(|l| l.pct()),
            foam_level: s.foam.map(|f| match f {
                FoamState::Percent(p) => p,
                FoamState::Present(p) => u8::from(p),
            }),
            pump_state: if s.pump { "ON" } else { "OFF" },
        }
    }
}

/// Appends external log rows to a CSV file; the header is written once
/// when the file starts empty.
pub struct CsvLogSink {
    writer: csv::Writer<File>,
}

impl CsvLogSink {
    pub fn open(path: &Path) -> eyre::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .wrap_err_with(|| format!("open log csv {}", path.display()))?;
        let empty = file
            .metadata()
            .wrap_err("stat log csv")?
            .len()
            == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(empty)
            .from_writer(file);
        Ok(Self { writer })
    }
}

impl Sink for CsvLogSink {
    fn deliver(&mut self, emission: &Emission, _timeout: Duration) -> SinkResult {
        let Emission::Log(snapshot) = emission else {
            return Ok(());
        };
        self.writer.serialize(LogRow::from(snapshot))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Messaging stand-in: report text goes to the log under its own target.
pub struct TracingReportSink;

impl Sink for TracingReportSink {
    fn deliver(&mut self, emission: &Emission, _timeout: Duration) -> SinkResult {
        if let Emission::Report(report) = emission {
            tracing::info!(
                target: "foamguard::report",
                kind = ?report.kind,
                "{}",
                report.text()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foamguard_core::mocks::snapshot;

    #[test]
    fn push_sink_writes_one_line_per_snapshot() {
        let mut sink = JsonlPushSink::new(Vec::new());
        sink.deliver(&Emission::Push(snapshot(50)), Duration::ZERO)
            .expect("deliver");
        sink.deliver(&Emission::Log(snapshot(60)), Duration::ZERO)
            .expect("ignored");
        let text = String::from_utf8(sink.out).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let v: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(v["threshold"], 50);
        assert_eq!(v["level"], 25);
    }

    #[test]
    fn csv_sink_writes_header_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log.csv");
        for _ in 0..2 {
            let mut sink = CsvLogSink::open(&path).expect("open");
            sink.deliver(&Emission::Log(snapshot(50)), Duration::ZERO)
                .expect("deliver");
        }
        let text = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "date,time,water_level,foam_level,pump_state");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",25,10,OFF"));
    }
}
