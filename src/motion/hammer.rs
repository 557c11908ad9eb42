// Hammer Motion - Rest, pull back, strike, recoil and settle for every note
// Models mallets, drum sticks and piano keys; optionally bumps an affected object on each strike

use serde::{Deserialize, Serialize};

use super::host::{AnimationHost, HostError};
use super::keyframe::{to_frame, KeyframeRecord};
use super::target::Target;
use crate::midi::NoteEvent;

/// Length of the strike window in seconds, independent of note duration
pub const STRIKE_SECONDS: f64 = 0.08;

/// How much further ahead a soft hit starts its pullback
pub const PULLBACK_VELOCITY_SPREAD: f64 = 1.5;

/// Pullback scale for a full-velocity hit, where the formula gives exactly 1 and
/// the first two stages would land on the same frame. Sits halfway between 1 and
/// the scale of velocity 126, so softer hits still wind up earlier.
pub const FULL_VELOCITY_PULLBACK_SCALE: f64 = 1.0 + PULLBACK_VELOCITY_SPREAD / 254.0;

/// Recoil past rest, as a fraction of the overshoot
pub const RECOIL_RATIO: f64 = 0.75;

/// A secondary object that reacts to every strike (e.g. the drum under a stick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedObject {
    #[serde(flatten)]
    pub target: Target,

    /// Offset added to the object's current value at the moment of the strike
    pub amount: f64,
}

/// Hammer motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HammerParams {
    /// Where the hammer rests between notes
    pub initial_position: f64,

    /// Where the hammer is drawn back to before striking
    pub pullback_position: f64,

    /// How far past rest the hammer travels on impact
    #[serde(default)]
    pub overshoot_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected: Option<AffectedObject>,
}

impl HammerParams {
    pub fn new(initial_position: f64, pullback_position: f64) -> Self {
        HammerParams {
            initial_position,
            pullback_position,
            overshoot_amount: 0.0,
            affected: None,
        }
    }

    pub fn with_overshoot(mut self, overshoot_amount: f64) -> Self {
        self.overshoot_amount = overshoot_amount;
        self
    }

    pub fn with_affected(mut self, target: Target, amount: f64) -> Self {
        self.affected = Some(AffectedObject { target, amount });
        self
    }
}

/// Pullback lead time multiplier: softer notes wind up earlier
pub fn pullback_scale(velocity: f64) -> f64 {
    let scale = 1.0 + (1.0 - velocity) * PULLBACK_VELOCITY_SPREAD;
    if scale > 1.0 {
        scale
    } else {
        FULL_VELOCITY_PULLBACK_SCALE
    }
}

/// Generate hammer keyframes
///
/// Per event, on the primary target:
/// 1. rest at `start - strike * scale`
/// 2. pullback at `start - strike`
/// 3. `rest + overshoot` at `start` (the strike)
/// 4. `rest - overshoot * 0.75` at `start + strike` (recoil)
/// 5. rest at `start + strike * scale` (settle)
///
/// With an affected object, three keyframes follow the strike: its current
/// value at `start - 1`, `current + amount` at `start`, and the current value
/// again at `start + strike`. The current value is read from the host once per event.
pub fn hammer_keyframes<H: AnimationHost + ?Sized>(
    events: &[NoteEvent],
    params: &HammerParams,
    target: &Target,
    frame_rate: f64,
    host: &H,
) -> Result<Vec<KeyframeRecord>, HostError> {
    let strike_frames = STRIKE_SECONDS * frame_rate;
    let per_event = if params.affected.is_some() { 8 } else { 5 };
    let mut records = Vec::with_capacity(events.len() * per_event);

    for event in events {
        let start_frame = to_frame(event.start, frame_rate);
        let scale = pullback_scale(event.velocity);
        let rest = params.initial_position;

        records.push(KeyframeRecord::new(target, start_frame - strike_frames * scale, rest));
        records.push(KeyframeRecord::new(
            target,
            start_frame - strike_frames,
            params.pullback_position,
        ));
        records.push(KeyframeRecord::new(
            target,
            start_frame,
            rest + params.overshoot_amount,
        ));

        if let Some(affected) = &params.affected {
            let baseline = host.read_property(&affected.target)?;

            records.push(KeyframeRecord::new(&affected.target, start_frame - 1.0, baseline));
            records.push(KeyframeRecord::new(
                &affected.target,
                start_frame,
                baseline + affected.amount,
            ));
            records.push(KeyframeRecord::new(
                &affected.target,
                start_frame + strike_frames,
                baseline,
            ));
        }

        records.push(KeyframeRecord::new(
            target,
            start_frame + strike_frames,
            rest - params.overshoot_amount * RECOIL_RATIO,
        ));
        records.push(KeyframeRecord::new(target, start_frame + strike_frames * scale, rest));
    }

    Ok(records)
}
