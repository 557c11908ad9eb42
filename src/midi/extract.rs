// Note Event Extraction - Pairs note-on/note-off messages into timed note events
// Single linear pass over the merged message stream

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::source::{MessageKind, MidiError, MidiSource};

/// One played note: a matched note-on/note-off pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (0-127)
    pub note: u8,

    /// MIDI channel (0-15)
    pub channel: u8,

    /// Seconds from the start of the stream
    pub start: f64,

    /// Seconds between note-on and note-off, always > 0
    pub duration: f64,

    /// Note-on velocity normalized to [0, 1]
    pub velocity: f64,
}

impl NoteEvent {
    /// Time of the note-off in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether the note is sounding at `time` (start inclusive, end exclusive)
    pub fn covers(&self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }
}

/// Restricts extraction to one note and/or one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFilter {
    #[serde(default)]
    pub note: Option<u8>,
    #[serde(default)]
    pub channel: Option<u8>,
}

impl NoteFilter {
    /// Accept every note on every channel
    pub fn all() -> Self {
        NoteFilter::default()
    }

    /// Accept a single note on any channel
    pub fn note(note: u8) -> Self {
        NoteFilter {
            note: Some(note),
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn accepts(&self, note: u8, channel: u8) -> bool {
        self.note.map_or(true, |n| n == note) && self.channel.map_or(true, |c| c == channel)
    }
}

/// Extract note events from a parsed source
///
/// Rules:
/// - A repeated note-on for a (note, channel) that is still sounding replaces
///   the earlier one (last trigger wins).
/// - Note-off, or note-on with velocity 0, closes the open note for the same
///   (note, channel); a close with nothing open is ignored.
/// - Messages rejected by the filter are ignored entirely.
/// - Notes still open at the end of the stream are dropped.
///
/// Events are returned in the order their note-off was seen.
pub fn extract_events(source: &MidiSource, filter: NoteFilter) -> Vec<NoteEvent> {
    let mut current_time = 0.0;
    let mut active: HashMap<(u8, u8), (f64, f64)> = HashMap::new(); // start_time, velocity
    let mut events = Vec::new();

    for message in source.messages() {
        current_time += message.delta;

        match message.kind {
            MessageKind::NoteOn {
                channel,
                note,
                velocity,
            } if velocity > 0 => {
                if !filter.accepts(note, channel) {
                    continue;
                }

                active.insert((note, channel), (current_time, velocity as f64 / 127.0));
            }
            MessageKind::NoteOn { channel, note, .. } | MessageKind::NoteOff { channel, note, .. } => {
                if !filter.accepts(note, channel) {
                    continue;
                }

                if let Some((start, velocity)) = active.remove(&(note, channel)) {
                    let duration = current_time - start;

                    if duration > 0.0 {
                        events.push(NoteEvent {
                            note,
                            channel,
                            start,
                            duration,
                            velocity,
                        });
                    } else {
                        log::debug!(
                            "Dropping zero-length note {} on channel {} at {:.3}s",
                            note,
                            channel,
                            start
                        );
                    }
                }
            }
            MessageKind::Other => {}
        }
    }

    if !active.is_empty() {
        log::debug!("Discarding {} notes without a note-off", active.len());
    }

    events
}

/// Load a MIDI file and extract its note events
///
/// Fails as a whole if the file cannot be read or parsed.
pub fn extract_file(path: &Path, filter: NoteFilter) -> Result<Vec<NoteEvent>, MidiError> {
    let source = MidiSource::open(path)?;
    Ok(extract_events(&source, filter))
}
