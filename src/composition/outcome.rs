// Generation Outcome - Keyframes produced by a batch run plus per-instrument results
// One failing instrument never aborts the rest of the batch

use serde::Serialize;

use crate::motion::{AnimationHost, Instrument, KeyframeRecord, MotionError};

/// Result of generating a single instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentOutcome {
    pub name: String,

    /// Keyframes inserted for this instrument (0 on failure)
    pub records: usize,

    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "error_message")]
    pub error: Option<MotionError>,
}

fn error_message<S: serde::Serializer>(error: &Option<MotionError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_str(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

impl InstrumentOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a batch generation produced, in generation order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub records: Vec<KeyframeRecord>,
    pub outcomes: Vec<InstrumentOutcome>,
}

impl GenerationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate one instrument, recording a failure instead of returning it
    pub fn run<H: AnimationHost + ?Sized>(&mut self, instrument: &Instrument, host: &mut H) {
        match instrument.generate(host) {
            Ok(records) => {
                self.outcomes.push(InstrumentOutcome {
                    name: instrument.name().to_string(),
                    records: records.len(),
                    error: None,
                });
                self.records.extend(records);
            }
            Err(e) => {
                log::warn!("Skipping instrument {}: {}", instrument.name(), e);
                self.outcomes.push(InstrumentOutcome {
                    name: instrument.name().to_string(),
                    records: 0,
                    error: Some(e),
                });
            }
        }
    }

    pub fn extend(&mut self, other: GenerationOutcome) {
        self.records.extend(other.records);
        self.outcomes.extend(other.outcomes);
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstrumentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(InstrumentOutcome::is_ok)
    }
}
