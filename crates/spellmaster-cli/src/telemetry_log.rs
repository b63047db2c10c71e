//! Append-only JSONL telemetry
//!
//! One line per snapshot:
//! `{"recorded_at": "...", "kind": "escalation", "snapshot": {...}}`.
//! Write failures are logged and dropped; the harness keeps running.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spellmaster::{HarnessSnapshot, SnapshotCause, TelemetrySink};
use tracing::{debug, warn};

/// One logged snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub recorded_at: DateTime<Utc>,
    pub kind: SnapshotCause,
    pub snapshot: HarnessSnapshot,
}

impl TelemetryRecord {
    pub fn now(snapshot: &HarnessSnapshot) -> Self {
        Self {
            recorded_at: Utc::now(),
            kind: snapshot.cause,
            snapshot: *snapshot,
        }
    }
}

/// [`TelemetrySink`] appending records to a file
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    written: u64,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended by this sink
    pub fn written(&self) -> u64 {
        self.written
    }

    fn append(&mut self, record: &TelemetryRecord) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize telemetry: {e}");
                return;
            }
        };
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{json}") {
                    warn!("Failed to append telemetry: {e}");
                } else {
                    self.written += 1;
                    debug!(path = %self.path.display(), kind = ?record.kind, "Appended telemetry");
                }
            }
            Err(e) => warn!("Failed to open telemetry file: {e}"),
        }
    }
}

impl TelemetrySink for JsonlSink {
    fn render(&mut self, snapshot: &HarnessSnapshot) {
        self.append(&TelemetryRecord::now(snapshot));
    }
}

/// Read a log back. Blank lines are skipped; malformed lines are errors.
pub fn read_log(path: &Path) -> anyhow::Result<Vec<TelemetryRecord>> {
    let file = std::fs::File::open(path)?;
    let mut records = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("{}:{}: {e}", path.display(), n + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spellmaster::Outcome;

    fn snap(cause: SnapshotCause, level: u32) -> HarnessSnapshot {
        HarnessSnapshot {
            cause,
            level,
            bias: 50.2,
            total_ticks: u64::from(level - 1),
            streak: u64::from(level - 1),
            holding: true,
            last_outcome: Outcome::Loss,
        }
    }

    #[test]
    fn test_appends_one_line_per_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        let mut sink = JsonlSink::new(&path);

        sink.render(&snap(SnapshotCause::Escalation, 2));
        sink.render(&snap(SnapshotCause::Escalation, 3));
        sink.render(&snap(SnapshotCause::Reset, 1));
        assert_eq!(sink.written(), 3);

        let records = read_log(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind, SnapshotCause::Escalation);
        assert_eq!(records[1].snapshot.level, 3);
        assert_eq!(records[2].kind, SnapshotCause::Reset);
        assert!(records[0].recorded_at <= records[2].recorded_at);
    }

    #[test]
    fn test_line_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        JsonlSink::new(&path).render(&snap(SnapshotCause::Escalation, 2));

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(value["kind"], "escalation");
        assert_eq!(value["snapshot"]["level"], 2);
        assert!(value["recorded_at"].is_string());
    }

    #[test]
    fn test_unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlSink::new(dir.path().join("missing").join("t.jsonl"));
        sink.render(&snap(SnapshotCause::Escalation, 2));
        assert_eq!(sink.written(), 0);
    }

    #[test]
    fn test_read_log_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "\nnot json\n").unwrap();
        let err = read_log(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }
}
