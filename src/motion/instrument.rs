// Instrument - One animation target driven by one archetype from a fixed event list
// Events are extracted once at construction; generation never mutates them

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hammer::{hammer_keyframes, HammerParams};
use super::host::{AnimationHost, HostError};
use super::keyframe::KeyframeRecord;
use super::movement::{movement_keyframes, MovementParams};
use super::robotic::{robotic_keyframes, RoboticParams};
use super::spring::{spring_keyframes, SpringParams};
use super::target::{PropertyPath, Target};
use crate::midi::{extract_events, MidiSource, NoteEvent, NoteFilter};

/// Errors raised while generating motion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Rest pose has {rest} axes but reach pose has {reach}")]
    DimensionMismatch { rest: usize, reach: usize },

    #[error("Spring stepped backwards in time: {current} after {previous}")]
    NonMonotonicTime { previous: f64, current: f64 },

    #[error("Invalid time: {0}")]
    InvalidTime(f64),

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Bake of {frames} frames exceeds the limit of {limit}")]
    BakeTooLong { frames: f64, limit: u64 },
}

/// The motion archetypes, tagged by `kind` in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Archetype {
    Hammer(HammerParams),
    Movement(MovementParams),
    Spring(SpringParams),
    Robotic(RoboticParams),
}

impl Archetype {
    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Hammer(_) => "hammer",
            Archetype::Movement(_) => "movement",
            Archetype::Spring(_) => "spring",
            Archetype::Robotic(_) => "robotic",
        }
    }

    /// Convert positional parameters from degrees to radians
    ///
    /// Only parameters that drive an angle are converted: the primary ones
    /// when `property` is a rotation, and a hammer's affected amount when
    /// the affected target is a rotation. Everything else is left as given.
    pub fn degrees_to_radians(&self, property: &PropertyPath) -> Archetype {
        let factor = |path: &PropertyPath| if path.is_angle() { PI / 180.0 } else { 1.0 };
        let primary = factor(property);

        match self {
            Archetype::Hammer(p) => Archetype::Hammer(HammerParams {
                initial_position: p.initial_position * primary,
                pullback_position: p.pullback_position * primary,
                overshoot_amount: p.overshoot_amount * primary,
                affected: p.affected.clone().map(|mut affected| {
                    affected.amount *= factor(&affected.target.property);
                    affected
                }),
            }),
            Archetype::Movement(p) => Archetype::Movement(MovementParams {
                initial_position: p.initial_position * primary,
                final_position: p.final_position * primary,
            }),
            Archetype::Spring(p) => Archetype::Spring(SpringParams {
                rest_position: p.rest_position * primary,
                reach_position: p.reach_position * primary,
                ..p.clone()
            }),
            Archetype::Robotic(p) => Archetype::Robotic(RoboticParams {
                rest_position: p.rest_position.iter().map(|v| v * primary).collect(),
                reach_position: p.reach_position.iter().map(|v| v * primary).collect(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), MotionError> {
        match self {
            Archetype::Robotic(p) => p.validate(),
            Archetype::Spring(p) => p.validate(),
            _ => Ok(()),
        }
    }
}

fn check_frame_rate(frame_rate: f64) -> Result<f64, MotionError> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(frame_rate)
    } else {
        Err(MotionError::InvalidFrameRate(frame_rate))
    }
}

/// A target animated by one archetype
#[derive(Debug, Clone)]
pub struct Instrument {
    target: Target,
    archetype: Archetype,
    events: Vec<NoteEvent>,
}

impl Instrument {
    /// Extract the filtered events from `source` and bind them to a target
    pub fn new(
        source: &MidiSource,
        target: Target,
        archetype: Archetype,
        filter: NoteFilter,
    ) -> Result<Self, MotionError> {
        let events = extract_events(source, filter);
        Instrument::from_events(target, archetype, events)
    }

    /// Bind an already extracted event list to a target
    pub fn from_events(
        target: Target,
        archetype: Archetype,
        events: Vec<NoteEvent>,
    ) -> Result<Self, MotionError> {
        archetype.validate()?;
        Ok(Instrument {
            target,
            archetype,
            events,
        })
    }

    /// Instruments are named after the object they animate
    pub fn name(&self) -> &str {
        &self.target.object
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn affected_target(&self) -> Option<&Target> {
        match &self.archetype {
            Archetype::Hammer(HammerParams {
                affected: Some(affected),
                ..
            }) => Some(&affected.target),
            _ => None,
        }
    }

    /// The channel cleared before generating: one axis, or every axis for robotic poses
    pub fn cleared_target(&self) -> Target {
        match &self.archetype {
            Archetype::Robotic(_) => self.target.whole(),
            _ => self.target.clone(),
        }
    }

    /// Compute the keyframes without touching the host's curves
    pub fn keyframes<H: AnimationHost + ?Sized>(&self, host: &H) -> Result<Vec<KeyframeRecord>, MotionError> {
        let frame_rate = check_frame_rate(host.frame_rate())?;

        let records = match &self.archetype {
            Archetype::Hammer(params) => {
                hammer_keyframes(&self.events, params, &self.target, frame_rate, host)?
            }
            Archetype::Movement(params) => {
                movement_keyframes(&self.events, params, &self.target, frame_rate)
            }
            Archetype::Spring(params) => {
                spring_keyframes(&self.events, params, &self.target, frame_rate)?
            }
            Archetype::Robotic(params) => {
                robotic_keyframes(&self.events, params, &self.target, frame_rate)?
            }
        };

        Ok(records)
    }

    /// Replace the target's animation with freshly generated keyframes
    ///
    /// Clears the primary (and affected) channel first, so running twice
    /// leaves the host exactly as running once. Sibling axes driven by other
    /// instruments are left alone.
    pub fn generate<H: AnimationHost + ?Sized>(&self, host: &mut H) -> Result<Vec<KeyframeRecord>, MotionError> {
        let records = self.keyframes(host)?;

        host.clear_keyframes(&self.cleared_target())?;
        if let Some(affected) = self.affected_target() {
            host.clear_keyframes(affected)?;
        }

        for record in &records {
            host.insert_keyframe(record)?;
        }

        log::debug!(
            "{}: {} events -> {} keyframes ({})",
            self.name(),
            self.events.len(),
            records.len(),
            self.archetype.name()
        );

        Ok(records)
    }
}
