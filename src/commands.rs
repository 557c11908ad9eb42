// CLI Commands
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::config::BakeConfig;
use crate::midi::{self, ChannelRange, NoteEvent, NoteFilter};
use crate::pipeline::{self, CurveExport, ReportWriter};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Parser)]
#[command(name = "keyframer", version, about = "Turn MIDI performances into animation keyframes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate keyframes for every instrument in a bake config
    Bake {
        /// Bake configuration (JSON)
        config: PathBuf,

        /// Write the baked curves here instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append a per-instrument JSONL report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the lowest and highest note played on each channel
    Ranges {
        midi: PathBuf,
    },
    /// Print the note events extracted from a MIDI file
    Events {
        midi: PathBuf,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..128))]
        note: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..16))]
        channel: Option<u8>,
    },
}

// ==================== BAKE ====================

#[derive(Debug, Serialize)]
pub struct BakeSummary {
    pub run_id: Uuid,
    pub instruments: usize,
    pub failed: Vec<String>,
    pub keyframes: usize,
    pub curves: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

/// Run a full bake and return the baked curves with a summary
pub fn bake(config_path: &Path, report_path: Option<&Path>) -> CommandResult<(CurveExport, BakeSummary)> {
    let config = BakeConfig::load(config_path)?;
    let source = config.open_midi()?;
    let session = config.build_session(&source)?;
    let mut host = config.build_host()?;

    let run_id = Uuid::new_v4();
    log::info!(
        "Bake {}: {} instruments at {} fps",
        run_id,
        session.instrument_count(),
        config.frame_rate
    );

    let outcome = session.generate_all(&mut host);

    if let Some(path) = report_path {
        let entries = pipeline::report_entries(run_id, source.digest(), config.frame_rate, &outcome);
        ReportWriter::new(path.to_path_buf()).write_batch(&entries)?;
        log::info!("Appended {} report entries to {}", entries.len(), path.display());
    }

    let export = pipeline::export_curves(&host);
    let summary = BakeSummary {
        run_id,
        instruments: outcome.outcomes.len(),
        failed: outcome.failures().map(|o| o.name.clone()).collect(),
        keyframes: outcome.records.len(),
        curves: export.curves.len(),
        output: None,
        report: report_path.map(Path::to_path_buf),
    };

    Ok((export, summary))
}

// ==================== MIDI INSPECTION ====================

pub fn ranges(path: &Path) -> CommandResult<BTreeMap<u8, ChannelRange>> {
    if !path.exists() {
        return Err(CommandError {
            message: format!("MIDI file not found: {}", path.display()),
        });
    }
    Ok(midi::channel_ranges_from_path(path))
}

pub fn events(path: &Path, filter: NoteFilter) -> CommandResult<Vec<NoteEvent>> {
    let events = midi::extract_file(path, filter)?;
    log::info!("Extracted {} note events from {}", events.len(), path.display());
    Ok(events)
}

/// Run a parsed command and render its result as JSON
pub fn execute(command: Command) -> CommandResult<String> {
    let json = match command {
        Command::Bake {
            config,
            output,
            report,
        } => {
            let (export, mut summary) = bake(&config, report.as_deref())?;
            match output {
                Some(path) => {
                    pipeline::write_curves(&export, &path)?;
                    summary.output = Some(path);
                    serde_json::to_string_pretty(&summary)?
                }
                None => serde_json::to_string_pretty(&export)?,
            }
        }
        Command::Ranges { midi } => serde_json::to_string_pretty(&ranges(&midi)?)?,
        Command::Events {
            midi,
            note,
            channel,
        } => serde_json::to_string_pretty(&events(&midi, NoteFilter { note, channel })?)?,
    };

    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::fixtures::{note_off, note_on, smf_bytes};
    use crate::pipeline::{read_report_file, InstrumentStatus};
    use std::fs;
    use tempfile::TempDir;

    fn write_project(dir: &Path) -> PathBuf {
        let midi = smf_bytes(vec![vec![
            note_on(0, 0, 60, 100),
            note_off(480, 0, 60),
            note_on(0, 0, 62, 64),
            note_off(480, 0, 62),
        ]]);
        fs::write(dir.join("keys.mid"), midi).unwrap();

        let config = r#"{
            "midi": "keys.mid",
            "scene": {"Key_60": {}, "Key_62": {}, "Flap": {}},
            "instruments": [
                {"object": "Flap", "property": "rotation_euler.z", "note": 62,
                 "motion": {"kind": "movement", "initial_position": 0, "final_position": 1}}
            ],
            "compositions": [
                {"object_prefix": "Key", "property": "rotation_euler.y",
                 "note_range": {"start": 60, "end": 63},
                 "motion": {"kind": "hammer", "initial_position": 0, "pullback_position": 0.2}}
            ]
        }"#;
        let path = dir.join("bake.json");
        fs::write(&path, config).unwrap();
        path
    }

    #[test]
    fn test_bake_with_report() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_project(temp_dir.path());
        let report = temp_dir.path().join("report.jsonl");

        let (export, summary) = bake(&config, Some(&report)).unwrap();

        assert_eq!(summary.instruments, 4);
        // Key_61 has no scene object
        assert_eq!(summary.failed, vec!["Key_61".to_string()]);
        assert_eq!(summary.keyframes, 4 + 5 + 5);
        assert_eq!(export.curves.len(), 3);

        let entries = read_report_file(&report).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.run_id == summary.run_id));
        assert!(entries.iter().all(|e| e.source_digest.is_some()));
        assert_eq!(entries[0].instrument, "Flap");
        assert_eq!(entries[0].status, InstrumentStatus::Generated { records: 4 });
        assert!(matches!(entries[2].status, InstrumentStatus::Failed { .. }));
    }

    #[test]
    fn test_execute_bake_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_project(temp_dir.path());
        let output = temp_dir.path().join("curves.json");

        let json = execute(Command::Bake {
            config,
            output: Some(output.clone()),
            report: None,
        })
        .unwrap();

        let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(summary["curves"], 3);

        let curves: CurveExport = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(curves.frame_rate, 24.0);
        assert_eq!(curves.keyframe_count(), 14);
    }

    #[test]
    fn test_bake_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let err = bake(&temp_dir.path().join("missing.json"), None).unwrap_err();
        assert!(err.message().starts_with("IO error"));
    }

    #[test]
    fn test_events_command() {
        let temp_dir = TempDir::new().unwrap();
        write_project(temp_dir.path());
        let midi = temp_dir.path().join("keys.mid");

        let all = events(&midi, NoteFilter::all()).unwrap();
        assert_eq!(all.len(), 2);

        let json = execute(Command::Events {
            midi,
            note: Some(62),
            channel: None,
        })
        .unwrap();
        let parsed: Vec<NoteEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].note, 62);
        assert!((parsed[0].start - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ranges_command() {
        let temp_dir = TempDir::new().unwrap();
        write_project(temp_dir.path());

        let ranges = ranges(&temp_dir.path().join("keys.mid")).unwrap();
        assert_eq!(ranges[&0], ChannelRange { min_note: 60, max_note: 62 });

        assert!(super::ranges(&temp_dir.path().join("nope.mid")).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["keyframer", "bake", "bake.json", "-o", "out.json"]).unwrap();
        assert!(matches!(cli.command, Command::Bake { output: Some(_), report: None, .. }));

        let cli = Cli::try_parse_from(["keyframer", "events", "song.mid", "--note", "60", "--channel", "9"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Events {
                note: Some(60),
                channel: Some(9),
                ..
            }
        ));

        assert!(Cli::try_parse_from(["keyframer", "events", "song.mid", "--channel", "16"]).is_err());
    }
}
