// Composition Builder - One instrument per note across a note range
// Objects follow the `<prefix>_<note>` naming convention, e.g. piano keys `Key_60`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::outcome::GenerationOutcome;
use crate::midi::{MidiSource, NoteFilter};
use crate::motion::{AnimationHost, Archetype, Instrument, MotionError, PropertyPath, Target};

/// Highest exclusive end of a note range
pub const NOTE_COUNT: u8 = 128;

/// Highest MIDI channel number (0-based)
pub const MAX_CHANNEL: u8 = 15;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("Invalid note range {start}..{end}")]
    InvalidRange { start: u8, end: u8 },

    #[error("Invalid MIDI channel: {0} (expected 0-15)")]
    InvalidChannel(u8),

    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),
}

/// Half-open note range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    pub start: u8,
    pub end: u8,
}

impl Default for NoteRange {
    fn default() -> Self {
        NoteRange {
            start: 0,
            end: NOTE_COUNT,
        }
    }
}

impl NoteRange {
    pub fn new(start: u8, end: u8) -> Result<Self, CompositionError> {
        let range = NoteRange { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), CompositionError> {
        if self.end <= self.start || self.end > NOTE_COUNT {
            return Err(CompositionError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn notes(&self) -> impl Iterator<Item = u8> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How to replicate one archetype across notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSpec {
    /// Instrument objects are named `<object_prefix>_<note>`
    pub object_prefix: String,

    /// Property animated on every instrument object
    pub property: PropertyPath,

    /// Shared parameters; a hammer's affected object name is used as a prefix too
    pub motion: Archetype,

    #[serde(default)]
    pub note_range: NoteRange,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

impl CompositionSpec {
    pub fn new(object_prefix: impl Into<String>, property: PropertyPath, motion: Archetype) -> Self {
        CompositionSpec {
            object_prefix: object_prefix.into(),
            property,
            motion,
            note_range: NoteRange::default(),
            channel: None,
        }
    }

    pub fn with_range(mut self, note_range: NoteRange) -> Self {
        self.note_range = note_range;
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }
}

/// Object name for one note of a composition
pub fn instrument_name(prefix: &str, note: u8) -> String {
    format!("{}_{}", prefix, note)
}

/// Parameters for one note, with any affected object renamed per note
fn note_motion(motion: &Archetype, note: u8) -> Archetype {
    let mut motion = motion.clone();
    if let Archetype::Hammer(params) = &mut motion {
        if let Some(affected) = &mut params.affected {
            affected.target.object = instrument_name(&affected.target.object, note);
        }
    }
    motion
}

/// A note-indexed set of instruments sharing one property and archetype
#[derive(Debug, Clone)]
pub struct Composition {
    spec: CompositionSpec,
    instruments: Vec<Instrument>,
}

impl Composition {
    /// Build one instrument per note, ascending
    pub fn build(source: &MidiSource, spec: &CompositionSpec) -> Result<Self, CompositionError> {
        spec.note_range.validate()?;
        if let Some(channel) = spec.channel {
            if channel > MAX_CHANNEL {
                return Err(CompositionError::InvalidChannel(channel));
            }
        }

        let mut instruments = Vec::with_capacity(spec.note_range.len());
        for note in spec.note_range.notes() {
            let target = Target::new(
                instrument_name(&spec.object_prefix, note),
                spec.property.clone(),
            );
            let filter = NoteFilter {
                note: Some(note),
                channel: spec.channel,
            };

            instruments.push(Instrument::new(
                source,
                target,
                note_motion(&spec.motion, note),
                filter,
            )?);
        }

        log::info!(
            "Built composition '{}' with {} instruments ({} with notes)",
            spec.object_prefix,
            instruments.len(),
            instruments.iter().filter(|i| !i.events().is_empty()).count()
        );

        Ok(Composition {
            spec: spec.clone(),
            instruments,
        })
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Instrument for a given note, if the note is in range
    pub fn instrument(&self, note: u8) -> Option<&Instrument> {
        let index = note.checked_sub(self.spec.note_range.start)? as usize;
        self.instruments.get(index)
    }

    /// Generate every instrument in ascending note order
    pub fn generate_all<H: AnimationHost + ?Sized>(&self, host: &mut H) -> GenerationOutcome {
        let mut outcome = GenerationOutcome::new();
        for instrument in &self.instruments {
            outcome.run(instrument, host);
        }
        outcome
    }
}
