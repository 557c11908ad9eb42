// Animation Host - The scene/curve collaborator keyframes are written into
// The engine only talks to the host through this trait; SceneHost is an in-memory implementation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keyframe::KeyframeRecord;
use super::target::{PropertyPath, Target};

/// Frames closer than this are treated as the same keyframe slot
pub const FRAME_EPSILON: f64 = 1e-6;

/// Errors reported by an animation host
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Property '{property}' not found on '{object}'")]
    PropertyNotFound { object: String, property: String },
}

/// Operations the keyframe engine needs from the host application
pub trait AnimationHost {
    /// Timeline frames per second
    fn frame_rate(&self) -> f64;

    /// Remove the keyframes on the target's channel. A target without an axis
    /// clears every axis of its property. Idempotent.
    fn clear_keyframes(&mut self, target: &Target) -> Result<(), HostError>;

    /// Current (un-animated) value of the target property
    fn read_property(&self, target: &Target) -> Result<f64, HostError>;

    /// Insert one keyframe; a later insert at the same frame replaces the earlier one
    fn insert_keyframe(&mut self, record: &KeyframeRecord) -> Result<(), HostError>;
}

/// One animated channel: keyframes sorted by frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub object: String,
    pub property: PropertyPath,
    pub keyframes: Vec<(f64, f64)>,
}

impl Curve {
    /// Value of the keyframe at `frame`, if one exists
    pub fn value_at(&self, frame: f64) -> Option<f64> {
        self.keyframes
            .iter()
            .find(|(f, _)| (f - frame).abs() < FRAME_EPSILON)
            .map(|(_, v)| *v)
    }

    fn insert(&mut self, frame: f64, value: f64) {
        if let Some(slot) = self
            .keyframes
            .iter_mut()
            .find(|(f, _)| (*f - frame).abs() < FRAME_EPSILON)
        {
            slot.1 = value;
            return;
        }

        let index = self.keyframes.partition_point(|(f, _)| *f < frame);
        self.keyframes.insert(index, (frame, value));
    }
}

/// In-memory scene: objects with property values and their animation curves
///
/// Strict scenes only know the objects they were given; permissive scenes
/// create objects on first use and read missing properties as 0.
#[derive(Debug, Clone)]
pub struct SceneHost {
    frame_rate: f64,
    permissive: bool,
    objects: BTreeMap<String, BTreeMap<String, f64>>,
    curves: BTreeMap<(String, String), Curve>,
    cleared: Vec<Target>,
}

impl SceneHost {
    /// Strict scene: unknown objects are reported as missing targets
    pub fn new(frame_rate: f64) -> Self {
        SceneHost {
            frame_rate,
            permissive: false,
            objects: BTreeMap::new(),
            curves: BTreeMap::new(),
            cleared: Vec::new(),
        }
    }

    /// Permissive scene: any object name is accepted
    pub fn permissive(frame_rate: f64) -> Self {
        SceneHost {
            permissive: true,
            ..SceneHost::new(frame_rate)
        }
    }

    pub fn add_object(&mut self, name: impl Into<String>) {
        self.objects.entry(name.into()).or_default();
    }

    /// Set a property's rest value, creating the object if needed
    pub fn set_property(&mut self, target: &Target, value: f64) {
        self.objects
            .entry(target.object.clone())
            .or_default()
            .insert(target.property.to_string(), value);
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// The curve animating exactly this target channel
    pub fn curve(&self, target: &Target) -> Option<&Curve> {
        self.curves
            .get(&(target.object.clone(), target.property.to_string()))
    }

    /// All curves ordered by object then data path
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    /// Every clear request received, in order
    pub fn cleared(&self) -> &[Target] {
        &self.cleared
    }

    fn ensure_object(&mut self, object: &str) -> Result<(), HostError> {
        if self.objects.contains_key(object) {
            return Ok(());
        }
        if self.permissive {
            self.objects.insert(object.to_string(), BTreeMap::new());
            return Ok(());
        }
        Err(HostError::TargetNotFound(object.to_string()))
    }
}

impl AnimationHost for SceneHost {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn clear_keyframes(&mut self, target: &Target) -> Result<(), HostError> {
        self.ensure_object(&target.object)?;

        let wanted = &target.property;
        self.curves.retain(|(object, _), curve| {
            let hit = match wanted.axis() {
                Some(_) => &curve.property == wanted,
                None => curve.property.same_property(wanted),
            };
            !(object == &target.object && hit)
        });
        self.cleared.push(target.clone());

        Ok(())
    }

    fn read_property(&self, target: &Target) -> Result<f64, HostError> {
        let properties = match self.objects.get(&target.object) {
            Some(properties) => properties,
            None if self.permissive => return Ok(0.0),
            None => return Err(HostError::TargetNotFound(target.object.clone())),
        };

        let key = target.property.to_string();
        match properties.get(&key) {
            Some(value) => Ok(*value),
            None if self.permissive => Ok(0.0),
            None => Err(HostError::PropertyNotFound {
                object: target.object.clone(),
                property: key,
            }),
        }
    }

    fn insert_keyframe(&mut self, record: &KeyframeRecord) -> Result<(), HostError> {
        self.ensure_object(&record.target.object)?;

        let key = (
            record.target.object.clone(),
            record.target.property.to_string(),
        );
        self.curves
            .entry(key)
            .or_insert_with(|| Curve {
                object: record.target.object.clone(),
                property: record.target.property.clone(),
                keyframes: Vec::new(),
            })
            .insert(record.frame, record.value);

        Ok(())
    }
}
