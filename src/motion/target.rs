// Animation Targets - Which object and which property channel a keyframe drives
// Property paths are parsed once into a typed descriptor instead of being re-interpreted per keyframe

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("Invalid property path '{path}': {reason}")]
    InvalidProperty { path: String, reason: String },
}

fn invalid(path: &str, reason: &str) -> TargetError {
    TargetError::InvalidProperty {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// A property on a scene object
///
/// Accepted text forms:
/// - `influence` - scalar field
/// - `rotation_euler.x`, `location.2`, `scale[1]` - one axis of a vector field
/// - `pose.bones["Arm"].rotation_euler.x`, `pose.bones.Arm.location` - bone pose field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PropertyPath {
    /// Single numeric field
    Scalar { field: String },

    /// Vector field; `axis: None` addresses the whole vector
    Vector { field: String, axis: Option<usize> },

    /// Field of a pose bone, optionally one axis of it
    BonePose {
        bone: String,
        field: String,
        axis: Option<usize>,
    },
}

impl PropertyPath {
    pub fn scalar(field: impl Into<String>) -> Self {
        PropertyPath::Scalar {
            field: field.into(),
        }
    }

    pub fn vector(field: impl Into<String>, axis: usize) -> Self {
        PropertyPath::Vector {
            field: field.into(),
            axis: Some(axis),
        }
    }

    /// Field name without bone or axis
    pub fn field(&self) -> &str {
        match self {
            PropertyPath::Scalar { field }
            | PropertyPath::Vector { field, .. }
            | PropertyPath::BonePose { field, .. } => field,
        }
    }

    pub fn axis(&self) -> Option<usize> {
        match self {
            PropertyPath::Scalar { .. } => None,
            PropertyPath::Vector { axis, .. } | PropertyPath::BonePose { axis, .. } => *axis,
        }
    }

    /// The channel for one axis of this property
    pub fn with_axis(&self, axis: usize) -> Self {
        match self {
            PropertyPath::Scalar { field } | PropertyPath::Vector { field, .. } => {
                PropertyPath::Vector {
                    field: field.clone(),
                    axis: Some(axis),
                }
            }
            PropertyPath::BonePose { bone, field, .. } => PropertyPath::BonePose {
                bone: bone.clone(),
                field: field.clone(),
                axis: Some(axis),
            },
        }
    }

    /// The whole vector this property belongs to
    pub fn whole(&self) -> Self {
        match self {
            PropertyPath::Scalar { field } | PropertyPath::Vector { field, .. } => {
                PropertyPath::Vector {
                    field: field.clone(),
                    axis: None,
                }
            }
            PropertyPath::BonePose { bone, field, .. } => PropertyPath::BonePose {
                bone: bone.clone(),
                field: field.clone(),
                axis: None,
            },
        }
    }

    /// Euler rotation channels, the only fields given in degrees by configs
    pub fn is_angle(&self) -> bool {
        matches!(self.field(), "rotation_euler" | "delta_rotation_euler")
    }

    /// True when both paths name the same field (and bone), ignoring axes
    pub fn same_property(&self, other: &PropertyPath) -> bool {
        let bone = |p: &PropertyPath| match p {
            PropertyPath::BonePose { bone, .. } => Some(bone.clone()),
            _ => None,
        };
        self.field() == other.field() && bone(self) == bone(other)
    }
}

fn parse_axis(token: &str) -> Option<usize> {
    match token {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        _ => token.parse().ok(),
    }
}

fn check_field<'a>(field: &'a str, path: &str) -> Result<&'a str, TargetError> {
    if field.is_empty() {
        return Err(invalid(path, "empty field name"));
    }
    if !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(path, "field names may only contain letters, digits and '_'"));
    }
    Ok(field)
}

/// Split `field`, `field.axis` or `field[index]`
fn split_field_axis(text: &str, path: &str) -> Result<(String, Option<usize>), TargetError> {
    if let Some(open) = text.find('[') {
        let index = text[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| invalid(path, "unterminated index"))?;
        let axis = index
            .parse()
            .map_err(|_| invalid(path, "index must be a number"))?;
        let field = check_field(&text[..open], path)?;
        return Ok((field.to_string(), Some(axis)));
    }

    match text.split_once('.') {
        Some((field, token)) => {
            let axis = parse_axis(token).ok_or_else(|| invalid(path, "unknown axis"))?;
            let field = check_field(field, path)?;
            Ok((field.to_string(), Some(axis)))
        }
        None => Ok((check_field(text, path)?.to_string(), None)),
    }
}

/// Split the bone name off `["Name"].rest` or `.Name.rest`
fn split_bone<'a>(rest: &'a str, path: &str) -> Result<(String, &'a str), TargetError> {
    let (bone, remainder) = if let Some(quoted) = rest.strip_prefix("[\"").or_else(|| rest.strip_prefix("['")) {
        let close = quoted
            .find(|c: char| c == '"' || c == '\'')
            .ok_or_else(|| invalid(path, "unterminated bone name"))?;
        let after = quoted[close + 1..]
            .strip_prefix(']')
            .ok_or_else(|| invalid(path, "expected ']' after bone name"))?;
        let remainder = after
            .strip_prefix('.')
            .ok_or_else(|| invalid(path, "missing bone field"))?;
        (&quoted[..close], remainder)
    } else if let Some(dotted) = rest.strip_prefix('.') {
        dotted
            .split_once('.')
            .ok_or_else(|| invalid(path, "missing bone field"))?
    } else {
        return Err(invalid(path, "expected bone name after 'pose.bones'"));
    };

    if bone.is_empty() {
        return Err(invalid(path, "empty bone name"));
    }

    Ok((bone.to_string(), remainder))
}

impl FromStr for PropertyPath {
    type Err = TargetError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(invalid(path, "empty path"));
        }

        if let Some(rest) = trimmed.strip_prefix("pose.bones") {
            let (bone, remainder) = split_bone(rest, path)?;
            let (field, axis) = split_field_axis(remainder, path)?;
            return Ok(PropertyPath::BonePose { bone, field, axis });
        }

        let (field, axis) = split_field_axis(trimmed, path)?;
        Ok(match axis {
            Some(_) => PropertyPath::Vector { field, axis },
            None => PropertyPath::Scalar { field },
        })
    }
}

impl TryFrom<String> for PropertyPath {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PropertyPath> for String {
    fn from(path: PropertyPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPath::Scalar { field } | PropertyPath::Vector { field, axis: None } => {
                write!(f, "{}", field)
            }
            PropertyPath::Vector {
                field,
                axis: Some(axis),
            } => write!(f, "{}[{}]", field, axis),
            PropertyPath::BonePose { bone, field, axis } => {
                write!(f, "pose.bones[\"{}\"].{}", bone, field)?;
                if let Some(axis) = axis {
                    write!(f, "[{}]", axis)?;
                }
                Ok(())
            }
        }
    }
}

/// An animation target: a named scene object plus one of its properties
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub object: String,
    pub property: PropertyPath,
}

impl Target {
    pub fn new(object: impl Into<String>, property: PropertyPath) -> Self {
        Target {
            object: object.into(),
            property,
        }
    }

    /// Build a target from an object name and a property path string
    pub fn parse(object: impl Into<String>, property: &str) -> Result<Self, TargetError> {
        Ok(Target::new(object, property.parse()?))
    }

    /// The same object, one axis of the property
    pub fn with_axis(&self, axis: usize) -> Self {
        Target::new(self.object.clone(), self.property.with_axis(axis))
    }

    /// The same object, every axis of the property
    pub fn whole(&self) -> Self {
        Target::new(self.object.clone(), self.property.whole())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar() {
        let path: PropertyPath = "influence".parse().unwrap();
        assert_eq!(path, PropertyPath::scalar("influence"));
        assert_eq!(path.axis(), None);
    }

    #[test]
    fn test_parse_vector_axis_forms() {
        assert_eq!(
            "rotation_euler.x".parse::<PropertyPath>().unwrap(),
            PropertyPath::vector("rotation_euler", 0)
        );
        assert_eq!(
            "location.2".parse::<PropertyPath>().unwrap(),
            PropertyPath::vector("location", 2)
        );
        assert_eq!(
            "scale[1]".parse::<PropertyPath>().unwrap(),
            PropertyPath::vector("scale", 1)
        );
    }

    #[test]
    fn test_parse_bone_pose() {
        let quoted: PropertyPath = "pose.bones[\"Arm\"].rotation_euler.x".parse().unwrap();
        assert_eq!(
            quoted,
            PropertyPath::BonePose {
                bone: "Arm".to_string(),
                field: "rotation_euler".to_string(),
                axis: Some(0),
            }
        );

        let dotted: PropertyPath = "pose.bones.Arm.location".parse().unwrap();
        assert_eq!(
            dotted,
            PropertyPath::BonePose {
                bone: "Arm".to_string(),
                field: "location".to_string(),
                axis: None,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<PropertyPath>().is_err());
        assert!("location.q".parse::<PropertyPath>().is_err());
        assert!("location[".parse::<PropertyPath>().is_err());
        assert!("location[a]".parse::<PropertyPath>().is_err());
        assert!(".x".parse::<PropertyPath>().is_err());
        assert!("pose.bones".parse::<PropertyPath>().is_err());
        assert!("pose.bones[\"\"].location".parse::<PropertyPath>().is_err());
        assert!("a.b.c".parse::<PropertyPath>().is_err());
    }

    #[test]
    fn test_display_canonical_form() {
        let path: PropertyPath = "rotation_euler.y".parse().unwrap();
        assert_eq!(path.to_string(), "rotation_euler[1]");

        let bone: PropertyPath = "pose.bones.Arm.location.z".parse().unwrap();
        assert_eq!(bone.to_string(), "pose.bones[\"Arm\"].location[2]");

        // Canonical form parses back to the same path
        assert_eq!(bone.to_string().parse::<PropertyPath>().unwrap(), bone);
    }

    #[test]
    fn test_axis_and_whole() {
        let path = PropertyPath::scalar("location");
        let axis = path.with_axis(1);
        assert_eq!(axis, PropertyPath::vector("location", 1));
        assert_eq!(axis.whole().axis(), None);
        assert!(axis.same_property(&path));
        assert!(!axis.same_property(&PropertyPath::scalar("scale")));

        let bone: PropertyPath = "pose.bones.Arm.location".parse().unwrap();
        assert!(!bone.same_property(&path));
    }

    #[test]
    fn test_angle_fields() {
        assert!("rotation_euler.x".parse::<PropertyPath>().unwrap().is_angle());
        assert!("delta_rotation_euler[2]".parse::<PropertyPath>().unwrap().is_angle());
        assert!("pose.bones.Arm.rotation_euler".parse::<PropertyPath>().unwrap().is_angle());
        assert!(!"location.z".parse::<PropertyPath>().unwrap().is_angle());
        assert!(!"rotation_quaternion.w".parse::<PropertyPath>().unwrap().is_angle());
        assert!(!"influence".parse::<PropertyPath>().unwrap().is_angle());
    }

    #[test]
    fn test_target_serde() {
        let target = Target::parse("Snare", "location.z").unwrap();
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"object":"Snare","property":"location[2]"}"#);

        let parsed: Target = serde_json::from_str(r#"{"object":"Snare","property":"location.z"}"#).unwrap();
        assert_eq!(parsed, target);

        let bad = serde_json::from_str::<Target>(r#"{"object":"Snare","property":"location.q"}"#);
        assert!(bad.is_err());
    }
}
