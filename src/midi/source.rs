// MIDI Source - Loads a Standard MIDI File into one time-resolved message stream
// Merges all tracks by absolute tick and converts deltas to seconds using the tempo map

use std::path::Path;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default MIDI tempo in microseconds per quarter note (120 BPM)
pub const DEFAULT_TEMPO_US: u32 = 500_000;

/// Errors that can occur while loading a MIDI source
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse MIDI file: {0}")]
    Parse(#[from] midly::Error),

    #[error("Unsupported MIDI file: {0}")]
    UnsupportedFormat(String),
}

/// The subset of MIDI messages the extractor cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Any other channel, meta or sysex message. Kept so its delta time still counts.
    Other,
}

/// A message with its delta time from the previous message, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedMessage {
    pub delta: f64,
    pub kind: MessageKind,
}

impl TimedMessage {
    pub fn new(delta: f64, kind: MessageKind) -> Self {
        TimedMessage { delta, kind }
    }
}

/// Converts tick counts into seconds for a file's time division
#[derive(Debug, Clone, Copy)]
enum TickClock {
    /// Pulses per quarter note; the running tempo decides the length of a quarter
    Metrical { ticks_per_beat: f64 },
    /// SMPTE timecode; ticks have a fixed length regardless of tempo
    Timecode { ticks_per_second: f64 },
}

impl TickClock {
    fn from_timing(timing: Timing) -> Result<Self, MidiError> {
        let clock = match timing {
            Timing::Metrical(tpb) => TickClock::Metrical {
                ticks_per_beat: tpb.as_int() as f64,
            },
            Timing::Timecode(fps, ticks_per_frame) => TickClock::Timecode {
                ticks_per_second: fps.as_f32() as f64 * ticks_per_frame as f64,
            },
        };

        let resolution = match clock {
            TickClock::Metrical { ticks_per_beat } => ticks_per_beat,
            TickClock::Timecode { ticks_per_second } => ticks_per_second,
        };
        if resolution <= 0.0 {
            return Err(MidiError::UnsupportedFormat(
                "time division of zero ticks".to_string(),
            ));
        }

        Ok(clock)
    }

    fn seconds(&self, ticks: u64, tempo_us: u32) -> f64 {
        match *self {
            TickClock::Metrical { ticks_per_beat } => {
                ticks as f64 * tempo_us as f64 / (1_000_000.0 * ticks_per_beat)
            }
            TickClock::Timecode { ticks_per_second } => ticks as f64 / ticks_per_second,
        }
    }
}

/// A parsed MIDI performance: every message of every track in playback order
#[derive(Debug, Clone, Default)]
pub struct MidiSource {
    messages: Vec<TimedMessage>,
    digest: Option<String>,
}

impl MidiSource {
    /// Read and parse a MIDI file from disk
    pub fn open(path: &Path) -> Result<Self, MidiError> {
        let data = std::fs::read(path)?;
        let source = Self::from_bytes(&data)?;

        log::info!(
            "Loaded MIDI source {} ({} messages, {:.2}s)",
            path.display(),
            source.messages.len(),
            source.duration()
        );

        Ok(source)
    }

    /// Parse Standard MIDI File bytes (format 0 or 1)
    ///
    /// The whole file is parsed before any message is produced, so a malformed
    /// file never yields a partial stream.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MidiError> {
        let smf = Smf::parse(data)?;

        if smf.header.format == Format::Sequential {
            return Err(MidiError::UnsupportedFormat(
                "format 2 (sequential) files cannot be merged into one timeline".to_string(),
            ));
        }

        let clock = TickClock::from_timing(smf.header.timing)?;

        // Absolute tick of every event, tracks concatenated in file order
        let mut timeline: Vec<(u64, TrackEventKind)> = Vec::new();
        for track in &smf.tracks {
            let mut tick: u64 = 0;
            for event in track {
                tick += event.delta.as_int() as u64;
                timeline.push((tick, event.kind));
            }
        }

        // Stable: simultaneous events keep track order, then in-track order
        timeline.sort_by_key(|(tick, _)| *tick);

        let mut messages = Vec::with_capacity(timeline.len());
        let mut tempo_us = DEFAULT_TEMPO_US;
        let mut last_tick: u64 = 0;

        for (tick, kind) in timeline {
            // A tempo change only affects the deltas that follow it
            let delta = clock.seconds(tick - last_tick, tempo_us);
            last_tick = tick;

            let kind = match kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    tempo_us = tempo.as_int();
                    MessageKind::Other
                }
                TrackEventKind::Midi { channel, message } => match message {
                    MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                        channel: channel.as_int(),
                        note: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOff { key, vel } => MessageKind::NoteOff {
                        channel: channel.as_int(),
                        note: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    _ => MessageKind::Other,
                },
                _ => MessageKind::Other,
            };

            messages.push(TimedMessage { delta, kind });
        }

        Ok(MidiSource {
            messages,
            digest: Some(calculate_sha256(data)),
        })
    }

    /// Build a source from messages whose delta times are already in seconds
    pub fn from_messages(messages: Vec<TimedMessage>) -> Self {
        MidiSource {
            messages,
            digest: None,
        }
    }

    /// All messages in playback order
    pub fn messages(&self) -> &[TimedMessage] {
        &self.messages
    }

    /// Hex SHA-256 of the file bytes, when loaded from a file
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Time of the last message in seconds
    pub fn duration(&self) -> f64 {
        self.messages.iter().map(|m| m.delta).sum()
    }
}

/// Calculate SHA256 hash of data
fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
