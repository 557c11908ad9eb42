// Bake Configuration - JSON description of a keyframe bake
// Names the MIDI file, the scene objects and every instrument/composition to generate

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composition::builder::{MAX_CHANNEL, NOTE_COUNT};
use crate::composition::{Composition, CompositionError, CompositionSpec, Session};
use crate::midi::{MidiError, MidiSource, NoteFilter};
use crate::motion::{Archetype, Instrument, MotionError, PropertyPath, SceneHost, Target, TargetError};

/// Default timeline frame rate
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MIDI error: {0}")]
    Midi(#[from] MidiError),

    #[error("Invalid scene property on '{object}': {source}")]
    SceneProperty { object: String, source: TargetError },

    #[error("Instrument '{object}': {source}")]
    Instrument { object: String, source: MotionError },

    #[error("Composition '{prefix}': {source}")]
    Composition { prefix: String, source: CompositionError },

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Instrument '{object}': invalid MIDI channel {channel} (expected 0-15)")]
    InvalidChannel { object: String, channel: u8 },

    #[error("Instrument '{object}': invalid note {note} (expected 0-127)")]
    InvalidNote { object: String, note: u8 },
}

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

/// A single standalone instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub object: String,
    pub property: PropertyPath,
    pub motion: Archetype,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

impl InstrumentConfig {
    pub fn target(&self) -> Target {
        Target::new(self.object.clone(), self.property.clone())
    }

    pub fn filter(&self) -> NoteFilter {
        NoteFilter {
            note: self.note,
            channel: self.channel,
        }
    }
}

/// Top-level bake configuration
///
/// ```json
/// {
///   "midi": "drums.mid",
///   "frame_rate": 30,
///   "degrees": true,
///   "instruments": [
///     {"object": "Snare_Stick", "property": "rotation_euler.x", "note": 38,
///      "motion": {"kind": "hammer", "initial_position": 0, "pullback_position": 25}}
///   ],
///   "compositions": [
///     {"object_prefix": "Key", "property": "rotation_euler.y",
///      "motion": {"kind": "hammer", "initial_position": 0, "pullback_position": 10, "overshoot_amount": 3}}
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeConfig {
    /// MIDI file; relative paths resolve against the config file's directory
    pub midi: PathBuf,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    /// Rotation parameters are given in degrees
    #[serde(default)]
    pub degrees: bool,

    /// Object -> property path -> rest value. Without a scene every object is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<BTreeMap<String, BTreeMap<String, f64>>>,

    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,

    #[serde(default)]
    pub compositions: Vec<CompositionSpec>,
}

impl BakeConfig {
    /// Load a config file, resolving the MIDI path next to it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = BakeConfig::from_json(&contents)?;

        if config.midi.is_relative() {
            if let Some(dir) = path.parent() {
                config.midi = dir.join(&config.midi);
            }
        }

        log::info!("Loaded bake config {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BakeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }

        for instrument in &self.instruments {
            if let Some(channel) = instrument.channel.filter(|c| *c > MAX_CHANNEL) {
                return Err(ConfigError::InvalidChannel {
                    object: instrument.object.clone(),
                    channel,
                });
            }
            if let Some(note) = instrument.note.filter(|n| *n >= NOTE_COUNT) {
                return Err(ConfigError::InvalidNote {
                    object: instrument.object.clone(),
                    note,
                });
            }
        }
        Ok(())
    }

    /// Motion parameters in scene units, converting rotations when `degrees` is set
    fn motion_for(&self, motion: &Archetype, property: &PropertyPath) -> Archetype {
        if self.degrees {
            motion.degrees_to_radians(property)
        } else {
            motion.clone()
        }
    }

    pub fn open_midi(&self) -> Result<MidiSource, ConfigError> {
        Ok(MidiSource::open(&self.midi)?)
    }

    /// Host for this bake: strict when a scene is given, permissive otherwise
    pub fn build_host(&self) -> Result<SceneHost, ConfigError> {
        let scene = match &self.scene {
            Some(scene) => scene,
            None => return Ok(SceneHost::permissive(self.frame_rate)),
        };

        let mut host = SceneHost::new(self.frame_rate);
        for (object, properties) in scene {
            host.add_object(object.as_str());
            for (path, value) in properties {
                let target = Target::parse(object.as_str(), path).map_err(|source| {
                    ConfigError::SceneProperty {
                        object: object.clone(),
                        source,
                    }
                })?;
                host.set_property(&target, *value);
            }
        }

        Ok(host)
    }

    /// Build every configured instrument and composition against `source`
    pub fn build_session(&self, source: &MidiSource) -> Result<Session, ConfigError> {
        let mut session = Session::new();

        for instrument in &self.instruments {
            let built = Instrument::new(
                source,
                instrument.target(),
                self.motion_for(&instrument.motion, &instrument.property),
                instrument.filter(),
            )
            .map_err(|source| ConfigError::Instrument {
                object: instrument.object.clone(),
                source,
            })?;
            session.add_instrument(built);
        }

        for spec in &self.compositions {
            let spec = CompositionSpec {
                motion: self.motion_for(&spec.motion, &spec.property),
                ..spec.clone()
            };
            let composition = Composition::build(source, &spec).map_err(|source| {
                ConfigError::Composition {
                    prefix: spec.object_prefix.clone(),
                    source,
                }
            })?;
            session.add_composition(composition);
        }

        Ok(session)
    }
}
