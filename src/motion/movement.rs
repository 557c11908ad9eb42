// Movement Motion - Binary displacement held for the length of each note
// Flaps, valves and switches: jump to the final position, hold, jump back

use serde::{Deserialize, Serialize};

use super::keyframe::{to_frame, KeyframeRecord};
use super::target::Target;
use crate::midi::NoteEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementParams {
    /// Position outside of notes
    pub initial_position: f64,

    /// Position while a note is held
    pub final_position: f64,
}

/// Generate movement keyframes
///
/// Per event: initial at `start - 1`, final at `start`, final at `end`,
/// initial at `end + 1`.
pub fn movement_keyframes(
    events: &[NoteEvent],
    params: &MovementParams,
    target: &Target,
    frame_rate: f64,
) -> Vec<KeyframeRecord> {
    let mut records = Vec::with_capacity(events.len() * 4);

    for event in events {
        let start_frame = to_frame(event.start, frame_rate);
        let end_frame = to_frame(event.end(), frame_rate);

        records.push(KeyframeRecord::new(target, start_frame - 1.0, params.initial_position));
        records.push(KeyframeRecord::new(target, start_frame, params.final_position));
        records.push(KeyframeRecord::new(target, end_frame, params.final_position));
        records.push(KeyframeRecord::new(target, end_frame + 1.0, params.initial_position));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flap() -> Target {
        Target::parse("Flap", "rotation_euler.z").unwrap()
    }

    #[test]
    fn test_movement_frames() {
        let events = [NoteEvent {
            note: 60,
            channel: 0,
            start: 2.0,
            duration: 0.5,
            velocity: 0.8,
        }];
        let params = MovementParams {
            initial_position: 0.0,
            final_position: 1.2,
        };

        let records = movement_keyframes(&events, &params, &flap(), 24.0);

        let frames: Vec<f64> = records.iter().map(|r| r.frame).collect();
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        assert_eq!(frames, vec![47.0, 48.0, 60.0, 61.0]);
        assert_eq!(values, vec![0.0, 1.2, 1.2, 0.0]);
    }

    #[test]
    fn test_velocity_does_not_change_movement() {
        let params = MovementParams {
            initial_position: 0.0,
            final_position: 1.0,
        };
        let soft = NoteEvent {
            note: 60,
            channel: 0,
            start: 1.0,
            duration: 1.0,
            velocity: 0.1,
        };
        let loud = NoteEvent { velocity: 1.0, ..soft };

        assert_eq!(
            movement_keyframes(&[soft], &params, &flap(), 30.0),
            movement_keyframes(&[loud], &params, &flap(), 30.0)
        );
    }
}
