//! Canonical robot model.
//!
//! Every format normalizer produces these types. They are plain values: built
//! once while a document is read, then only read by the diff engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use nalgebra::{Vector3, Vector4};

use crate::error::{NormalizeError, Result};
use crate::provenance::Provenance;
use crate::rotation::identity_quat;

/// Position and orientation of a frame relative to its parent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// Translation in meters.
    pub xyz: Vector3<f64>,
    /// Canonical unit quaternion, `(w, x, y, z)`.
    pub quat: Vector4<f64>,
    /// Origin in the source document.
    pub source: Provenance,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The identity pose.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            xyz: Vector3::zeros(),
            quat: identity_quat(),
            source: Provenance::default(),
        }
    }

    /// Create a pose from a translation and an already canonical quaternion.
    #[must_use]
    pub fn new(xyz: Vector3<f64>, quat: Vector4<f64>) -> Self {
        Self {
            xyz,
            quat,
            source: Provenance::default(),
        }
    }

    /// Attach provenance.
    #[must_use]
    pub fn with_source(mut self, source: Provenance) -> Self {
        self.source = source;
        self
    }

    /// True if translation is zero and rotation is the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.xyz == Vector3::zeros() && self.quat == identity_quat()
    }
}

/// Symmetric inertia tensor, kg·m².
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub struct Inertia {
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
    pub source: Provenance,
}

impl Inertia {
    /// Diagonal tensor.
    #[must_use]
    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Self {
        Self {
            ixx,
            iyy,
            izz,
            ..Self::default()
        }
    }
}

/// Mass properties of a link.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inertial {
    /// Center of mass frame relative to the link frame.
    pub origin: Pose,
    /// Mass in kilograms.
    pub mass: f64,
    /// Inertia tensor about the center of mass frame.
    pub inertia: Inertia,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Box with full edge lengths.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxGeometry {
    /// Full extents in meters.
    pub size: Vector3<f64>,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Cylinder aligned with its local z axis.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cylinder {
    /// Radius in meters.
    pub radius: f64,
    /// Full length in meters.
    pub length: f64,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Sphere.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    /// Radius in meters.
    pub radius: f64,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Mesh referenced by identifier. The mesh payload is never loaded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mesh {
    /// File name or URI identifying the mesh.
    pub filename: String,
    /// Per-axis scale factors.
    pub scale: Vector3<f64>,
    /// Origin in the source document.
    pub source: Provenance,
}

impl BoxGeometry {
    /// Create a box from full extents.
    #[must_use]
    pub fn new(size: Vector3<f64>) -> Self {
        Self {
            size,
            source: Provenance::default(),
        }
    }
}

impl Mesh {
    /// Create a mesh reference.
    #[must_use]
    pub fn new(filename: impl Into<String>, scale: Vector3<f64>) -> Self {
        Self {
            filename: filename.into(),
            scale,
            source: Provenance::default(),
        }
    }
}

/// Shape of a visual or collision element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Geometry {
    /// Box.
    Box(BoxGeometry),
    /// Cylinder.
    Cylinder(Cylinder),
    /// Sphere.
    Sphere(Sphere),
    /// Mesh reference.
    Mesh(Mesh),
}

impl Geometry {
    /// Name of the shape variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box(_) => "Box",
            Self::Cylinder(_) => "Cylinder",
            Self::Sphere(_) => "Sphere",
            Self::Mesh(_) => "Mesh",
        }
    }

    /// Provenance of the shape element.
    #[must_use]
    pub fn source(&self) -> &Provenance {
        match self {
            Self::Box(g) => &g.source,
            Self::Cylinder(g) => &g.source,
            Self::Sphere(g) => &g.source,
            Self::Mesh(g) => &g.source,
        }
    }

    /// Attach provenance to the shape.
    #[must_use]
    pub fn with_source(mut self, source: Provenance) -> Self {
        match &mut self {
            Self::Box(g) => g.source = source,
            Self::Cylinder(g) => g.source = source,
            Self::Sphere(g) => g.source = source,
            Self::Mesh(g) => g.source = source,
        }
        self
    }
}

/// Collision element of a link.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Collision {
    /// Optional element name.
    pub name: Option<String>,
    /// Pose relative to the link frame.
    pub origin: Pose,
    /// Shape, if one the model can represent was given.
    pub geometry: Option<Geometry>,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Surface appearance of a visual element.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Material name.
    pub name: Option<String>,
    /// Color, each channel in `[0, 1]`.
    pub rgba: Option<Vector4<f64>>,
    /// Texture file.
    pub texture_filename: Option<String>,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Visual element of a link.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Visual {
    /// Pose relative to the link frame.
    pub origin: Pose,
    /// Shape, if one the model can represent was given.
    pub geometry: Option<Geometry>,
    /// Appearance, `None` when the document gives none.
    pub material: Option<Material>,
    /// Origin in the source document.
    pub source: Provenance,
}

/// Joint range and actuation limits.
///
/// Units depend on the joint type: radians, N·m and rad/s for rotational
/// joints; meters, N and m/s for prismatic joints.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub struct Limit {
    pub lower: f64,
    pub upper: f64,
    pub effort: f64,
    pub velocity: f64,
    pub source: Provenance,
}

impl Limit {
    /// Range-only limit.
    #[must_use]
    pub fn range(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            ..Self::default()
        }
    }
}

/// Kinematic joint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JointType {
    /// Rotation about an axis, bounded.
    Revolute,
    /// Rotation about an axis, unbounded.
    Continuous,
    /// Translation along an axis.
    Prismatic,
    /// No relative motion.
    Fixed,
    /// Six degrees of freedom.
    Floating,
    /// Motion in a plane.
    Planar,
}

impl JointType {
    /// Every joint type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Revolute,
        Self::Continuous,
        Self::Prismatic,
        Self::Fixed,
        Self::Floating,
        Self::Planar,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Fixed => "fixed",
            Self::Floating => "floating",
            Self::Planar => "planar",
        }
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointType {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| NormalizeError::format(format!("unknown joint type: {s}")))
    }
}

/// Joint connecting a parent link to a child link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    /// Unique joint name.
    pub name: String,
    /// Joint type.
    pub joint_type: JointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Child frame relative to the parent frame.
    pub origin: Pose,
    /// Axis of motion in the joint frame.
    pub axis: Vector3<f64>,
    /// Limits, when the document specifies them.
    pub limit: Option<Limit>,
    /// Origin in the source document.
    pub source: Provenance,
}

impl Joint {
    /// Create a joint with identity origin, x axis and no limit.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: JointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: Pose::identity(),
            axis: Vector3::x(),
            limit: None,
            source: Provenance::default(),
        }
    }
}

/// Rigid body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    /// Unique link name.
    pub name: String,
    /// Mass properties, when the document gives them.
    pub inertial: Option<Inertial>,
    /// Collision elements in document order.
    pub collisions: Vec<Collision>,
    /// Visual elements in document order.
    pub visuals: Vec<Visual>,
    /// Origin in the source document.
    pub source: Provenance,
}

impl Link {
    /// Create an empty link.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertial: None,
            collisions: Vec::new(),
            visuals: Vec::new(),
            source: Provenance::default(),
        }
    }
}

/// A whole robot: named links and joints.
///
/// Maps are ordered by name so iteration is deterministic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Robot {
    /// Robot name.
    pub name: String,
    /// Links by name.
    pub links: BTreeMap<String, Link>,
    /// Joints by name.
    pub joints: BTreeMap<String, Joint>,
    /// Origin in the source document.
    pub source: Provenance,
}

impl Robot {
    /// Create an empty robot.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: BTreeMap::new(),
            joints: BTreeMap::new(),
            source: Provenance::default(),
        }
    }

    /// Add a link, rejecting a name that is already taken.
    pub fn add_link(&mut self, link: Link) -> Result<()> {
        if self.links.contains_key(&link.name) {
            return Err(NormalizeError::duplicate("link", &link.name));
        }
        self.links.insert(link.name.clone(), link);
        Ok(())
    }

    /// Add a joint, rejecting a name that is already taken.
    pub fn add_joint(&mut self, joint: Joint) -> Result<()> {
        if self.joints.contains_key(&joint.name) {
            return Err(NormalizeError::duplicate("joint", &joint.name));
        }
        self.joints.insert(joint.name.clone(), joint);
        Ok(())
    }

    /// Check that every joint names declared links.
    ///
    /// `extra_parents` lists frame names accepted as a parent without a link
    /// declaration (SDF allows `world`).
    pub fn check_joint_links(&self, extra_parents: &[&str]) -> Result<()> {
        for joint in self.joints.values() {
            if !self.links.contains_key(&joint.parent) && !extra_parents.contains(&joint.parent.as_str())
            {
                return Err(NormalizeError::undefined_link(&joint.parent, &joint.name));
            }
            if !self.links.contains_key(&joint.child) {
                return Err(NormalizeError::undefined_link(&joint.child, &joint.name));
            }
        }
        Ok(())
    }

    /// Get a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&Link> {
        self.links.get(name)
    }

    /// Get a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.get(name)
    }
}
