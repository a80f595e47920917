//! Isaac-style USD robot to canonical model conversion.
//!
//! The robot is the default prim. It lists its links and joints through the
//! `isaac:physics:robotLinks` and `isaac:physics:robotJoints` relationships;
//! prims not listed there are not part of the robot.

use std::path::Path;

use nalgebra::Vector3;
use robot_types::rotation::{canonical_quat, identity_quat};
use robot_types::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Mesh, NormalizeError, Normalizer, Pose, Provenance, Result, Robot, SourceFormat, Sphere, Visual,
};

use crate::crate_file::MAGIC;
use crate::stage::{Prim, Stage};
use crate::xform::local_pose;

const ROBOT_LINKS: &str = "isaac:physics:robotLinks";
const ROBOT_JOINTS: &str = "isaac:physics:robotJoints";

/// Geometric prim types. Only some of them map to a canonical shape.
const GPRIM_TYPES: &[&str] = &[
    "Cube",
    "Sphere",
    "Cylinder",
    "Capsule",
    "Cone",
    "Mesh",
    "Plane",
    "Points",
    "BasisCurves",
    "NurbsCurves",
    "NurbsPatch",
];

/// Normalizer for `.usda` and `.usdc` layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsdNormalizer;

impl Normalizer for UsdNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::Usd
    }

    fn normalize_str(&self, source: &str, file: Option<&Path>) -> Result<Robot> {
        normalize_usda_str(source, file)
    }

    fn normalize_bytes(&self, bytes: &[u8], file: Option<&Path>) -> Result<Robot> {
        if bytes.starts_with(MAGIC) {
            return normalize_usdc_bytes(bytes, file);
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| NormalizeError::format(format!("USD document is not valid UTF-8: {e}")))?;
        normalize_usda_str(text, file)
    }
}

/// Normalize a USD ASCII layer held in memory.
///
/// # Errors
///
/// - Format error for text that is not valid USDA, or attributes of the
///   wrong type
/// - Semantic error for a missing default prim, relationship targets that do
///   not exist, joints without bodies, duplicate names, and joints that
///   reference links the robot does not list
pub fn normalize_usda_str(source: &str, file: Option<&Path>) -> Result<Robot> {
    normalize_stage(&Stage::parse(source)?, file)
}

/// Normalize a binary crate (`.usdc`) layer held in memory.
///
/// # Errors
///
/// Format error for a malformed crate file, otherwise as
/// [`normalize_usda_str`].
pub fn normalize_usdc_bytes(bytes: &[u8], file: Option<&Path>) -> Result<Robot> {
    normalize_stage(&Stage::read_crate(bytes)?, file)
}

fn normalize_stage(stage: &Stage, file: Option<&Path>) -> Result<Robot> {
    let robot_prim = stage.default_prim()?;
    let ctx = Context { file, stage };

    let mut robot = Robot::new(&robot_prim.name);
    robot.source = ctx.provenance(robot_prim);

    for target in robot_prim.targets(ROBOT_LINKS) {
        let prim = ctx.resolve(target, "link")?;
        robot.add_link(ctx.link(prim)?)?;
    }
    for target in robot_prim.targets(ROBOT_JOINTS) {
        let prim = ctx.resolve(target, "joint")?;
        if let Some(joint) = ctx.joint(prim)? {
            robot.add_joint(joint)?;
        }
    }

    tracing::trace!(
        robot = %robot.name,
        prims = robot_prim.descendants().count(),
        "read USD stage"
    );
    robot.check_joint_links(&[])?;
    Ok(robot)
}

struct Context<'a> {
    file: Option<&'a Path>,
    stage: &'a Stage,
}

impl<'a> Context<'a> {
    fn provenance(&self, prim: &Prim) -> Provenance {
        Provenance::new(self.file, prim.path.clone(), prim.line)
    }

    fn resolve(&self, path: &str, what: &str) -> Result<&'a Prim> {
        self.stage
            .prim(path)
            .ok_or_else(|| NormalizeError::semantic(format!("{what} target {path} does not exist")))
    }

    fn link(&self, prim: &Prim) -> Result<Link> {
        let mut link = Link::new(&prim.name);
        link.source = self.provenance(prim);
        link.inertial = self.inertial(prim)?;

        if let Some(group) = prim.child("collisions") {
            for (parent, geom) in with_parents(prim, group) {
                if !geom.has_api("PhysicsCollisionAPI") {
                    continue;
                }
                link.collisions.push(Collision {
                    name: Some(parent.name.clone()),
                    origin: self.origin(parent)?,
                    geometry: self.geometry(parent, geom)?,
                    source: self.provenance(geom),
                });
            }
        }

        if let Some(group) = prim.child("visuals") {
            for (parent, geom) in with_parents(prim, group) {
                if !is_gprim(geom) {
                    continue;
                }
                if let Some(geometry) = self.geometry(parent, geom)? {
                    link.visuals.push(Visual {
                        origin: self.origin(parent)?,
                        geometry: Some(geometry),
                        material: None,
                        source: self.provenance(geom),
                    });
                }
            }
        }

        tracing::trace!(
            link = %link.name,
            collisions = link.collisions.len(),
            visuals = link.visuals.len(),
            "read link"
        );
        Ok(link)
    }

    fn inertial(&self, prim: &Prim) -> Result<Option<Inertial>> {
        if !prim.has_api("PhysicsMassAPI") {
            return Ok(None);
        }
        let source = self.provenance(prim);
        let center = prim.attr_vec3("physics:centerOfMass")?.unwrap_or_else(Vector3::zeros);
        let axes = match prim.attr_quat("physics:principalAxes")? {
            Some(q) => canonical_quat(q)?,
            None => identity_quat(),
        };
        let diag = prim
            .attr_vec3("physics:diagonalInertia")?
            .unwrap_or_else(Vector3::zeros);

        Ok(Some(Inertial {
            origin: Pose::new(center, axes).with_source(source.clone()),
            mass: prim.attr_f64("physics:mass")?.unwrap_or(0.0),
            inertia: Inertia {
                source: source.clone(),
                ..Inertia::diagonal(diag.x, diag.y, diag.z)
            },
            source,
        }))
    }

    fn origin(&self, parent: &Prim) -> Result<Pose> {
        Ok(local_pose(parent)?.with_source(self.provenance(parent)))
    }

    /// Shape of a geometric prim, scaled by its parent Xform.
    fn geometry(&self, parent: &Prim, prim: &Prim) -> Result<Option<Geometry>> {
        let scale = parent
            .attr_vec3("xformOp:scale")?
            .unwrap_or_else(|| Vector3::repeat(1.0));

        let geometry = match prim.type_name.as_deref() {
            Some("Cube") => {
                let size = prim.attr_f64("size")?.unwrap_or(2.0);
                Geometry::Box(BoxGeometry::new(scale * size))
            }
            Some("Sphere") => {
                let radius = prim.attr_f64("radius")?.unwrap_or(1.0);
                Geometry::Sphere(Sphere {
                    radius: radius * scale.max(),
                    ..Sphere::default()
                })
            }
            Some("Cylinder") => {
                let radius = prim.attr_f64("radius")?.unwrap_or(1.0);
                let height = prim.attr_f64("height")?.unwrap_or(2.0);
                let (radial, axial) = match prim.attr_token("axis")?.unwrap_or("Z") {
                    "X" => (scale.y.max(scale.z), scale.x),
                    "Y" => (scale.x.max(scale.z), scale.y),
                    _ => (scale.x.max(scale.y), scale.z),
                };
                Geometry::Cylinder(Cylinder {
                    radius: radius * radial,
                    length: height * axial,
                    ..Cylinder::default()
                })
            }
            Some("Mesh") => Geometry::Mesh(Mesh::new(format!("usd:{}/{}", parent.name, prim.name), scale)),
            other => {
                tracing::warn!(
                    prim = %prim.path,
                    kind = other.unwrap_or("<untyped>"),
                    "unsupported geometry, skipped"
                );
                return Ok(None);
            }
        };
        Ok(Some(geometry.with_source(self.provenance(prim))))
    }

    fn joint(&self, prim: &Prim) -> Result<Option<Joint>> {
        let kind = prim.type_name.as_deref().unwrap_or("");
        if !matches!(
            kind,
            "PhysicsRevoluteJoint" | "PhysicsPrismaticJoint" | "PhysicsFixedJoint"
        ) {
            tracing::warn!(joint = %prim.path, kind, "unsupported joint type, skipped");
            return Ok(None);
        }

        let parent = self.body(prim, "physics:body0")?;
        let child = self.body(prim, "physics:body1")?;
        let source = self.provenance(prim);

        let limits = match (
            prim.attr_f64("physics:lowerLimit")?,
            prim.attr_f64("physics:upperLimit")?,
        ) {
            (Some(lower), Some(upper)) => Some((lower, upper)),
            _ => None,
        };
        let velocity = prim.attr_f64("physxJoint:maxJointVelocity")?.unwrap_or(0.0);

        let (joint_type, limit) = match kind {
            "PhysicsRevoluteJoint" => match limits {
                // Isaac writes angular limits in degrees
                Some((lower, upper)) => (
                    JointType::Revolute,
                    Some(Limit {
                        lower: lower.to_radians(),
                        upper: upper.to_radians(),
                        effort: prim.attr_f64("drive:angular:physics:maxForce")?.unwrap_or(0.0),
                        velocity: velocity.to_radians(),
                        source: source.clone(),
                    }),
                ),
                None => (JointType::Continuous, None),
            },
            "PhysicsPrismaticJoint" => {
                let limit = match limits {
                    Some((lower, upper)) => Some(Limit {
                        lower,
                        upper,
                        effort: prim.attr_f64("drive:linear:physics:maxForce")?.unwrap_or(0.0),
                        velocity,
                        source: source.clone(),
                    }),
                    None => None,
                };
                (JointType::Prismatic, limit)
            }
            _ => (JointType::Fixed, None),
        };

        let axis = match prim.attr_token("physics:axis")? {
            None | Some("X") => Vector3::x(),
            Some("Y") => Vector3::y(),
            Some("Z") => Vector3::z(),
            Some(other) => {
                return Err(NormalizeError::semantic(format!(
                    "joint {} has invalid axis '{other}'",
                    prim.path
                )));
            }
        };
        let xyz = prim.attr_vec3("physics:localPos0")?.unwrap_or_else(Vector3::zeros);
        let quat = match prim.attr_quat("physics:localRot0")? {
            Some(q) => canonical_quat(q)?,
            None => identity_quat(),
        };

        let mut joint = Joint::new(&prim.name, joint_type, parent, child);
        joint.origin = Pose::new(xyz, quat).with_source(source.clone());
        joint.axis = axis;
        joint.limit = limit;
        joint.source = source;
        Ok(Some(joint))
    }

    /// Name of the first target of a body relationship.
    fn body(&self, joint: &Prim, rel: &str) -> Result<&'a str> {
        let target = joint.targets(rel).first().ok_or_else(|| {
            NormalizeError::semantic(format!("joint {} has no {rel} target", joint.path))
        })?;
        Ok(&self.resolve(target, "body")?.name)
    }
}

fn is_gprim(prim: &Prim) -> bool {
    prim.type_name
        .as_deref()
        .is_some_and(|t| GPRIM_TYPES.contains(&t))
}

/// `root` and everything below it, each paired with its parent, depth first.
fn with_parents<'p>(parent: &'p Prim, root: &'p Prim) -> Vec<(&'p Prim, &'p Prim)> {
    let mut out = vec![(parent, root)];
    let mut i = 0;
    while i < out.len() {
        let (_, prim) = out[i];
        let children: Vec<_> = prim.children.iter().map(|c| (prim, c)).collect();
        out.splice(i + 1..i + 1, children);
        i += 1;
    }
    out
}
