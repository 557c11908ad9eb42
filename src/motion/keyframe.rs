// Keyframe Records - One (target, frame, value) sample for the host to insert

use serde::{Deserialize, Serialize};

use super::target::Target;

/// A keyframe the host inserts into the target's animation curve
///
/// Frames are real-valued and may be negative; the host decides how to round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeRecord {
    pub target: Target,
    pub frame: f64,
    pub value: f64,
}

impl KeyframeRecord {
    pub fn new(target: &Target, frame: f64, value: f64) -> Self {
        KeyframeRecord {
            target: target.clone(),
            frame,
            value,
        }
    }
}

/// Convert a time in seconds to a (fractional) frame position
pub fn to_frame(seconds: f64, frame_rate: f64) -> f64 {
    seconds * frame_rate
}
