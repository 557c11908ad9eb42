// Bake run report
// Append-only JSONL file with one entry per generated instrument

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::composition::{GenerationOutcome, InstrumentOutcome};

/// Errors that can occur while writing or reading a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// What happened to one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentStatus {
    Generated { records: usize },
    Failed { message: String },
}

impl From<&InstrumentOutcome> for InstrumentStatus {
    fn from(outcome: &InstrumentOutcome) -> Self {
        match &outcome.error {
            Some(error) => InstrumentStatus::Failed {
                message: error.to_string(),
            },
            None => InstrumentStatus::Generated {
                records: outcome.records,
            },
        }
    }
}

/// A single line of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Shared by every entry written for the same bake
    pub run_id: Uuid,

    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    /// SHA-256 of the MIDI file, when the source came from bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,

    pub frame_rate: f64,

    /// Instrument (object) name
    pub instrument: String,

    #[serde(flatten)]
    pub status: InstrumentStatus,
}

impl ReportEntry {
    pub fn new(
        run_id: Uuid,
        source_digest: Option<String>,
        frame_rate: f64,
        instrument: String,
        status: InstrumentStatus,
    ) -> Self {
        ReportEntry {
            run_id,
            timestamp: Utc::now().to_rfc3339(),
            source_digest,
            frame_rate,
            instrument,
            status,
        }
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// One entry per instrument outcome, all sharing `run_id`
pub fn report_entries(
    run_id: Uuid,
    source_digest: Option<&str>,
    frame_rate: f64,
    outcome: &GenerationOutcome,
) -> Vec<ReportEntry> {
    outcome
        .outcomes
        .iter()
        .map(|o| {
            ReportEntry::new(
                run_id,
                source_digest.map(str::to_string),
                frame_rate,
                o.name.clone(),
                InstrumentStatus::from(o),
            )
        })
        .collect()
}

/// Report writer
/// Manages an append-only JSONL report file
pub struct ReportWriter {
    file_path: PathBuf,
}

impl ReportWriter {
    pub fn new(file_path: PathBuf) -> Self {
        ReportWriter { file_path }
    }

    /// Append entries to the file
    /// Creates file if it doesn't exist
    pub fn write_batch(&self, entries: &[ReportEntry]) -> Result<(), ReportError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            file.write_all(entry.to_json_line()?.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }
}

/// Read report entries from a JSONL file
pub fn read_report_file(path: &Path) -> Result<Vec<ReportEntry>, ReportError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{HostError, MotionError};
    use tempfile::TempDir;

    fn outcome() -> GenerationOutcome {
        GenerationOutcome {
            records: Vec::new(),
            outcomes: vec![
                InstrumentOutcome {
                    name: "Key_60".to_string(),
                    records: 10,
                    error: None,
                },
                InstrumentOutcome {
                    name: "Key_61".to_string(),
                    records: 0,
                    error: Some(MotionError::Host(HostError::TargetNotFound(
                        "Key_61".to_string(),
                    ))),
                },
            ],
        }
    }

    #[test]
    fn test_entries_share_run_id() {
        let run_id = Uuid::new_v4();
        let entries = report_entries(run_id, Some("abc123"), 24.0, &outcome());

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.run_id == run_id));
        assert_eq!(entries[0].status, InstrumentStatus::Generated { records: 10 });
        assert_eq!(
            entries[1].status,
            InstrumentStatus::Failed {
                message: "Target not found: Key_61".to_string()
            }
        );
        assert_eq!(entries[1].source_digest.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_json_line_format() {
        let entry = ReportEntry::new(
            Uuid::new_v4(),
            None,
            30.0,
            "Snare_Stick".to_string(),
            InstrumentStatus::Generated { records: 5 },
        );
        let json_line = entry.to_json_line().unwrap();

        // Should end with newline
        assert!(json_line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(json_line.trim()).unwrap();
        assert_eq!(value["status"], "generated");
        assert_eq!(value["records"], 5);
        assert!(value.get("source_digest").is_none());
    }

    #[test]
    fn test_report_writer() {
        let temp_dir = TempDir::new().unwrap();
        let report_path = temp_dir.path().join("report.jsonl");

        let writer = ReportWriter::new(report_path.clone());
        let entries = report_entries(Uuid::new_v4(), None, 24.0, &outcome());

        writer.write_batch(&entries[..1]).unwrap();
        writer.write_batch(&entries[1..]).unwrap();

        // Read back and verify
        let read = read_report_file(&report_path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].instrument, "Key_60");
        assert_eq!(read[1].status, entries[1].status);
    }

    #[test]
    fn test_report_appends_across_runs() {
        let temp_dir = TempDir::new().unwrap();
        let report_path = temp_dir.path().join("report.jsonl");
        let writer = ReportWriter::new(report_path.clone());

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        writer.write_batch(&report_entries(first, None, 24.0, &outcome())).unwrap();
        writer.write_batch(&report_entries(second, None, 24.0, &outcome())).unwrap();

        let read = read_report_file(&report_path).unwrap();
        assert_eq!(read.len(), 4);
        assert_eq!(read[0].run_id, first);
        assert_eq!(read[3].run_id, second);
    }
}
