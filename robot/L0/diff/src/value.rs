//! Value snapshots of model entities.
//!
//! The diff engine does not know the model types. Each comparable type
//! describes itself as a [`Value`] tree through [`Diffable`], listing only the
//! fields that take part in comparison; provenance is never listed.

use std::fmt;

use nalgebra::{Vector3, Vector4};
use robot_types::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Material, Mesh, Pose, Sphere, Visual,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A comparable value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// An optional value that is not set.
    Absent,
    /// A length, reported when two sequences differ in size.
    Count(usize),
    /// A scalar.
    Float(f64),
    /// A name, path or enumeration.
    Text(String),
    /// A fixed-size vector, compared and reported as a whole.
    Tuple(Vec<f64>),
    /// An ordered sequence, compared element by element.
    List(Vec<Value>),
    /// A composite with named fields.
    Record(Record),
}

/// A composite value: its type name and comparable fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Type name, `Box`, `Pose`, `Limit`, …
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: String,
    /// Field names and values.
    pub fields: Vec<(String, Value)>,
}

impl Record {
    /// Start a record.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, name: &str, value: &impl Diffable) -> Self {
        self.fields.push((name.to_string(), value.to_value()));
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl Value {
    /// True for [`Value::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Elements of a tuple.
    pub fn as_tuple(&self) -> Option<&[f64]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

/// Float text with at least one decimal digit: `1.0`, `0.25`, `1e-7`.
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("None"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Text(s) => f.write_str(s),
            Self::Tuple(items) => {
                let parts: Vec<_> = items.iter().map(|x| format_float(*x)).collect();
                write!(f, "({})", parts.join(", "))
            }
            Self::List(items) => {
                let parts: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(", "))
            }
            Self::Record(record) => f.write_str(&record.type_name),
        }
    }
}

/// Types the diff engine can compare.
pub trait Diffable {
    /// Snapshot of the comparable fields.
    fn to_value(&self) -> Value;
}

impl Diffable for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Diffable for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl Diffable for JointType {
    fn to_value(&self) -> Value {
        Value::Text(self.as_str().to_string())
    }
}

impl Diffable for Vector3<f64> {
    fn to_value(&self) -> Value {
        Value::Tuple(self.iter().copied().collect())
    }
}

impl Diffable for Vector4<f64> {
    fn to_value(&self) -> Value {
        Value::Tuple(self.iter().copied().collect())
    }
}

impl<T: Diffable> Diffable for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Absent, Diffable::to_value)
    }
}

impl<T: Diffable> Diffable for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Diffable::to_value).collect())
    }
}

impl Diffable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Diffable for Pose {
    fn to_value(&self) -> Value {
        Value::Record(Record::new("Pose").field("xyz", &self.xyz).field("quat", &self.quat))
    }
}

impl Diffable for Inertia {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Inertia")
                .field("ixx", &self.ixx)
                .field("ixy", &self.ixy)
                .field("ixz", &self.ixz)
                .field("iyy", &self.iyy)
                .field("iyz", &self.iyz)
                .field("izz", &self.izz),
        )
    }
}

impl Diffable for Inertial {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Inertial")
                .field("origin", &self.origin)
                .field("mass", &self.mass)
                .field("inertia", &self.inertia),
        )
    }
}

impl Diffable for BoxGeometry {
    fn to_value(&self) -> Value {
        Value::Record(Record::new("Box").field("size", &self.size))
    }
}

impl Diffable for Cylinder {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Cylinder")
                .field("radius", &self.radius)
                .field("length", &self.length),
        )
    }
}

impl Diffable for Sphere {
    fn to_value(&self) -> Value {
        Value::Record(Record::new("Sphere").field("radius", &self.radius))
    }
}

impl Diffable for Mesh {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Mesh")
                .field("filename", &self.filename)
                .field("scale", &self.scale),
        )
    }
}

impl Diffable for Geometry {
    fn to_value(&self) -> Value {
        match self {
            Self::Box(g) => g.to_value(),
            Self::Cylinder(g) => g.to_value(),
            Self::Sphere(g) => g.to_value(),
            Self::Mesh(g) => g.to_value(),
        }
    }
}

impl Diffable for Collision {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Collision")
                .field("name", &self.name)
                .field("origin", &self.origin)
                .field("geometry", &self.geometry),
        )
    }
}

impl Diffable for Material {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Material")
                .field("name", &self.name)
                .field("rgba", &self.rgba)
                .field("texture_filename", &self.texture_filename),
        )
    }
}

impl Diffable for Visual {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Visual")
                .field("origin", &self.origin)
                .field("geometry", &self.geometry)
                .field("material", &self.material),
        )
    }
}

impl Diffable for Limit {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Limit")
                .field("lower", &self.lower)
                .field("upper", &self.upper)
                .field("effort", &self.effort)
                .field("velocity", &self.velocity),
        )
    }
}

impl Diffable for Link {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Link")
                .field("name", &self.name)
                .field("inertial", &self.inertial)
                .field("collisions", &self.collisions)
                .field("visuals", &self.visuals),
        )
    }
}

impl Diffable for Joint {
    fn to_value(&self) -> Value {
        Value::Record(
            Record::new("Joint")
                .field("name", &self.name)
                .field("type", &self.joint_type)
                .field("parent", &self.parent)
                .field("child", &self.child)
                .field("origin", &self.origin)
                .field("axis", &self.axis)
                .field("limit", &self.limit),
        )
    }
}
