// Spring Motion - Damped spring chasing note-driven targets
// SpringRig is stepped by an external clock; spring_keyframes bakes it frame by frame

use serde::{Deserialize, Serialize};

use super::instrument::MotionError;
use super::keyframe::KeyframeRecord;
use super::target::Target;
use crate::midi::NoteEvent;

/// Longest interval integrated in a single spring step (seconds)
pub const MAX_SPRING_DT: f64 = 1.0 / 30.0;

/// Most frames a single spring bake may produce (about 11 hours at 24 fps)
pub const MAX_BAKED_FRAMES: u64 = 1_000_000;

fn default_stiffness() -> f64 {
    80.0
}

fn default_damping() -> f64 {
    0.75
}

fn default_settle_seconds() -> f64 {
    1.0
}

/// Spring motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub rest_position: f64,
    pub reach_position: f64,

    #[serde(default = "default_stiffness")]
    pub stiffness: f64,

    /// Velocity multiplier applied every step (0..1)
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// How long to keep baking after the last note ends
    #[serde(default = "default_settle_seconds")]
    pub settle_seconds: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        SpringParams {
            rest_position: 0.0,
            reach_position: 1.0,
            stiffness: default_stiffness(),
            damping: default_damping(),
            settle_seconds: default_settle_seconds(),
        }
    }
}

impl SpringParams {
    pub fn new(rest_position: f64, reach_position: f64) -> Self {
        SpringParams {
            rest_position,
            reach_position,
            ..Default::default()
        }
    }

    /// Stiffness must be positive, damping within [0, 1], settle time non-negative
    pub fn validate(&self) -> Result<(), MotionError> {
        let invalid = |name: &'static str, value: f64| -> Result<(), MotionError> {
            Err(MotionError::InvalidParameter { name, value })
        };

        if !(self.stiffness.is_finite() && self.stiffness > 0.0) {
            return invalid("stiffness", self.stiffness);
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return invalid("damping", self.damping);
        }
        if !(self.settle_seconds.is_finite() && self.settle_seconds >= 0.0) {
            return invalid("settle_seconds", self.settle_seconds);
        }
        Ok(())
    }
}

/// A stateful spring driven by note events
///
/// Starts at rest. Each `step(time)` advances the simulation from the last
/// time it was stepped to `time` and returns the new position.
#[derive(Debug, Clone)]
pub struct SpringRig {
    params: SpringParams,
    events: Vec<NoteEvent>,
    position: f64,
    velocity: f64,
    last_time: Option<f64>,
}

impl SpringRig {
    pub fn new(params: SpringParams, events: Vec<NoteEvent>) -> Self {
        let position = params.rest_position;
        SpringRig {
            params,
            events,
            position,
            velocity: 0.0,
            last_time: None,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Where the spring is pulled at `time`
    pub fn target_at(&self, time: f64) -> f64 {
        match self.events.iter().find(|e| e.covers(time)) {
            Some(event) => (self.params.rest_position + self.params.reach_position) * event.velocity,
            None => self.params.rest_position,
        }
    }

    /// Advance the spring to `time` and return its position
    pub fn step(&mut self, time: f64) -> Result<f64, MotionError> {
        if !time.is_finite() {
            return Err(MotionError::InvalidTime(time));
        }

        let previous = match self.last_time {
            Some(previous) => previous,
            None => {
                // First call only anchors the clock
                self.last_time = Some(time);
                return Ok(self.position);
            }
        };

        if time < previous {
            return Err(MotionError::NonMonotonicTime {
                previous,
                current: time,
            });
        }

        let elapsed = time - previous;
        if elapsed > 0.0 {
            let target = self.target_at(time);
            let substeps = (elapsed / MAX_SPRING_DT).ceil().max(1.0) as usize;
            let dt = elapsed / substeps as f64;

            for _ in 0..substeps {
                self.integrate(target, dt);
            }
        }

        self.last_time = Some(time);
        Ok(self.position)
    }

    /// Return to rest with a fresh clock
    pub fn reset(&mut self) {
        self.position = self.params.rest_position;
        self.velocity = 0.0;
        self.last_time = None;
    }

    fn integrate(&mut self, target: f64, dt: f64) {
        let force = (target - self.position) * self.params.stiffness;
        self.velocity = (self.velocity + force * dt) * self.params.damping;
        self.position += self.velocity * dt;
    }
}

/// Bake a spring into one keyframe per whole frame
///
/// A fresh rig is driven from frame 0 through the settle period after the
/// last note, so repeated bakes give identical curves.
pub fn spring_keyframes(
    events: &[NoteEvent],
    params: &SpringParams,
    target: &Target,
    frame_rate: f64,
) -> Result<Vec<KeyframeRecord>, MotionError> {
    params.validate()?;
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let last_end = events.iter().map(NoteEvent::end).fold(0.0, f64::max);
    let frames = ((last_end + params.settle_seconds) * frame_rate).ceil();
    if !(frames.is_finite() && frames < MAX_BAKED_FRAMES as f64) {
        return Err(MotionError::BakeTooLong {
            frames,
            limit: MAX_BAKED_FRAMES,
        });
    }
    let last_frame = frames as u64;

    let mut rig = SpringRig::new(params.clone(), events.to_vec());
    let mut records = Vec::with_capacity(last_frame as usize + 1);

    for frame in 0..=last_frame {
        let frame = frame as f64;
        let position = rig.step(frame / frame_rate)?;
        records.push(KeyframeRecord::new(target, frame, position));
    }

    Ok(records)
}
