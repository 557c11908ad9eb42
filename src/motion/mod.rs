// Motion Engines - Keyframe generation for the four motion archetypes
// Hammer strikes, movement toggles, spring followers and robotic reaches

pub mod hammer;
pub mod host;
pub mod instrument;
pub mod keyframe;
pub mod movement;
pub mod robotic;
pub mod spring;
pub mod target;

pub use hammer::{hammer_keyframes, pullback_scale, AffectedObject, HammerParams};
pub use host::{AnimationHost, Curve, HostError, SceneHost};
pub use instrument::{Archetype, Instrument, MotionError};
pub use keyframe::{to_frame, KeyframeRecord};
pub use movement::{movement_keyframes, MovementParams};
pub use robotic::{robotic_keyframes, RoboticParams};
pub use spring::{spring_keyframes, SpringParams, SpringRig};
pub use target::{PropertyPath, Target, TargetError};
