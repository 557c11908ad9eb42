// Robotic Motion - Vector reach from a rest pose and back, timed like a hammer strike
// Drives every axis of a vector property (e.g. a drum arm bone's rotation)

use serde::{Deserialize, Serialize};

use super::hammer::{pullback_scale, STRIKE_SECONDS};
use super::instrument::MotionError;
use super::keyframe::{to_frame, KeyframeRecord};
use super::target::Target;
use crate::midi::NoteEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoboticParams {
    pub rest_position: Vec<f64>,
    pub reach_position: Vec<f64>,
}

impl RoboticParams {
    pub fn new(rest_position: Vec<f64>, reach_position: Vec<f64>) -> Result<Self, MotionError> {
        let params = RoboticParams {
            rest_position,
            reach_position,
        };
        params.validate()?;
        Ok(params)
    }

    /// Rest and reach must address the same number of axes
    pub fn validate(&self) -> Result<(), MotionError> {
        if self.rest_position.len() != self.reach_position.len() {
            return Err(MotionError::DimensionMismatch {
                rest: self.rest_position.len(),
                reach: self.reach_position.len(),
            });
        }
        Ok(())
    }

    pub fn axes(&self) -> usize {
        self.rest_position.len()
    }
}

fn push_pose(records: &mut Vec<KeyframeRecord>, target: &Target, frame: f64, pose: &[f64]) {
    for (axis, value) in pose.iter().enumerate() {
        records.push(KeyframeRecord::new(&target.with_axis(axis), frame, *value));
    }
}

/// Generate robotic keyframes
///
/// Per event: rest at `start - strike * scale`, reach at `start`, rest at
/// `start + strike * scale`. Each stage writes every axis before moving on.
pub fn robotic_keyframes(
    events: &[NoteEvent],
    params: &RoboticParams,
    target: &Target,
    frame_rate: f64,
) -> Result<Vec<KeyframeRecord>, MotionError> {
    params.validate()?;

    let strike_frames = STRIKE_SECONDS * frame_rate;
    let mut records = Vec::with_capacity(events.len() * 3 * params.axes());

    for event in events {
        let start_frame = to_frame(event.start, frame_rate);
        let lead = strike_frames * pullback_scale(event.velocity);

        push_pose(&mut records, target, start_frame - lead, &params.rest_position);
        push_pose(&mut records, target, start_frame, &params.reach_position);
        push_pose(&mut records, target, start_frame + lead, &params.rest_position);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::target::PropertyPath;

    fn arm() -> Target {
        Target::parse("Drummer", "pose.bones[\"Arm\"].rotation_euler").unwrap()
    }

    fn hit(start: f64, velocity: f64) -> NoteEvent {
        NoteEvent {
            note: 42,
            channel: 9,
            start,
            duration: 0.1,
            velocity,
        }
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = RoboticParams::new(vec![0.0, 0.0], vec![1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err.to_string(), "Rest pose has 2 axes but reach pose has 3");
    }

    #[test]
    fn test_three_stages_per_axis() {
        let params = RoboticParams::new(vec![0.0, 0.1], vec![0.8, -0.4]).unwrap();
        let records = robotic_keyframes(&[hit(1.0, 0.5)], &params, &arm(), 24.0).unwrap();
        assert_eq!(records.len(), 6);

        let lead = STRIKE_SECONDS * 24.0 * 1.75;
        let frames: Vec<f64> = records.iter().map(|r| r.frame).collect();
        for (frame, expected) in frames.iter().zip([24.0 - lead, 24.0 - lead, 24.0, 24.0, 24.0 + lead, 24.0 + lead]) {
            assert!((frame - expected).abs() < 1e-9);
        }

        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![0.0, 0.1, 0.8, -0.4, 0.0, 0.1]);

        assert_eq!(
            records[1].target.property,
            PropertyPath::BonePose {
                bone: "Arm".to_string(),
                field: "rotation_euler".to_string(),
                axis: Some(1),
            }
        );
    }

    #[test]
    fn test_frames_strictly_increase_per_axis() {
        let params = RoboticParams::new(vec![0.0], vec![1.0]).unwrap();
        let records = robotic_keyframes(&[hit(2.0, 1.0)], &params, &arm(), 30.0).unwrap();

        for pair in records.windows(2) {
            assert!(pair[0].frame < pair[1].frame);
        }
    }
}
