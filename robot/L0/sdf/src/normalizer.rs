//! SDF to canonical model conversion.
//!
//! SDF poses name the frame they are expressed in with `relative_to`. The
//! canonical model only has link-local and joint-local frames, so the
//! normalizer accepts exactly the layout that maps onto them:
//!
//! - every joint pose is `relative_to` its parent link;
//! - every link that is a joint's child has a pose `relative_to` that joint;
//! - every link pose is the identity in that frame.
//!
//! Anything else fails with a semantic error instead of being silently
//! re-expressed.

use std::path::Path;

use nalgebra::{Vector3, Vector4};
use robot_types::rotation::{canonical_quat, rpy_to_quat};
use robot_types::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Material, Mesh, NormalizeError, Normalizer, Pose, Result, Robot, SourceFormat, Sphere, Visual,
};
use robot_xml::{Element, required_attr, required_child};

use crate::grammar::SDF_GRAMMAR;

/// Normalizer for `.sdf` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdfNormalizer;

impl Normalizer for SdfNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::Sdf
    }

    fn normalize_str(&self, source: &str, file: Option<&Path>) -> Result<Robot> {
        normalize_sdf_str(source, file)
    }
}

/// Normalize an SDF document held in memory.
///
/// The document must contain exactly one `<model>`, which becomes the robot.
///
/// # Errors
///
/// - Format error for malformed XML or unparsable numbers
/// - Validation error when the document does not match the SDF grammar
/// - Semantic error for duplicate names, `relative_to` frames that do not
///   match the kinematic structure, non-identity link poses, and joints that
///   reference undeclared links
pub fn normalize_sdf_str(source: &str, file: Option<&Path>) -> Result<Robot> {
    let doc = robot_xml::load(source, &SDF_GRAMMAR)?;
    let model = required_child(&doc.root, "model")?;
    let ctx = Context { file };

    let mut robot = Robot::new(required_attr(model, "name")?);
    robot.source = model.provenance(file);

    // joints first: link pose checks need to know which joint owns each link
    let mut joint_order = Vec::new();
    for elem in model.children_named("joint") {
        let joint = ctx.joint(elem)?;
        joint_order.push((joint.name.clone(), joint.child.clone()));
        robot.add_joint(joint)?;
    }

    for elem in model.children_named("link") {
        let name = required_attr(elem, "name")?;
        let parent_joint = joint_order
            .iter()
            .find(|(_, child)| child == name)
            .map(|(joint, _)| joint.as_str());
        robot.add_link(ctx.link(elem, parent_joint)?)?;
    }

    robot.check_joint_links(&["world"])?;
    Ok(robot)
}

struct Context<'a> {
    file: Option<&'a Path>,
}

impl Context<'_> {
    fn joint(&self, elem: &Element) -> Result<Joint> {
        let name = required_attr(elem, "name")?;
        let joint_type = match required_attr(elem, "type")? {
            "ball" => JointType::Continuous,
            other => other.parse()?,
        };
        let parent = required_text(required_child(elem, "parent")?)?;
        let child = required_text(required_child(elem, "child")?)?;

        let pose_elem = elem.child("pose");
        if pose_elem.and_then(|p| p.attr("relative_to")) != Some(parent) {
            return Err(NormalizeError::semantic(format!(
                "joint '{name}' pose must have relative_to='{parent}'"
            )));
        }

        let mut joint = Joint::new(name, joint_type, parent, child);
        joint.source = elem.provenance(self.file);
        joint.origin = self.pose(elem)?;

        if let Some(axis) = elem.child("axis") {
            joint.axis = axis.child_vec3("xyz", Vector3::x())?;
            joint.limit = axis
                .child("limit")
                .map(|l| -> Result<Limit> {
                    Ok(Limit {
                        lower: l.child_f64("lower", 0.0)?,
                        upper: l.child_f64("upper", 0.0)?,
                        effort: l.child_f64("effort", 0.0)?,
                        velocity: l.child_f64("velocity", 0.0)?,
                        source: l.provenance(self.file),
                    })
                })
                .transpose()?;
        }
        Ok(joint)
    }

    fn link(&self, elem: &Element, parent_joint: Option<&str>) -> Result<Link> {
        let name = required_attr(elem, "name")?;

        if let Some(joint) = parent_joint {
            let relative_to = elem.child("pose").and_then(|p| p.attr("relative_to"));
            if relative_to != Some(joint) {
                return Err(NormalizeError::semantic(format!(
                    "link '{name}' pose must have relative_to='{joint}'"
                )));
            }
        }
        if !self.pose(elem)?.is_identity() {
            return Err(NormalizeError::semantic(format!(
                "link '{name}' pose must be the identity"
            )));
        }

        let mut link = Link::new(name);
        link.source = elem.provenance(self.file);
        link.inertial = elem.child("inertial").map(|e| self.inertial(e)).transpose()?;

        for collision in elem.children_named("collision") {
            link.collisions.push(Collision {
                name: collision.attr("name").map(str::to_string),
                origin: self.pose(collision)?,
                geometry: self.geometry(collision)?,
                source: collision.provenance(self.file),
            });
        }
        for visual in elem.children_named("visual") {
            link.visuals.push(Visual {
                origin: self.pose(visual)?,
                geometry: self.geometry(visual)?,
                material: visual.child("material").map(|m| self.material(m)).transpose()?,
                source: visual.provenance(self.file),
            });
        }
        Ok(link)
    }

    fn inertial(&self, elem: &Element) -> Result<Inertial> {
        let inertia = match elem.child("inertia") {
            Some(i) => Inertia {
                ixx: i.child_f64("ixx", 0.0)?,
                ixy: i.child_f64("ixy", 0.0)?,
                ixz: i.child_f64("ixz", 0.0)?,
                iyy: i.child_f64("iyy", 0.0)?,
                iyz: i.child_f64("iyz", 0.0)?,
                izz: i.child_f64("izz", 0.0)?,
                source: i.provenance(self.file),
            },
            None => Inertia::default(),
        };
        Ok(Inertial {
            origin: self.pose(elem)?,
            mass: elem.child_f64("mass", 0.0)?,
            inertia,
            source: elem.provenance(self.file),
        })
    }

    /// `<pose>` child of `parent`. Absent or empty poses are the identity.
    fn pose(&self, parent: &Element) -> Result<Pose> {
        let Some(pose) = parent.child("pose") else {
            return Ok(Pose::identity());
        };
        let quat_xyzw = pose.attr("rotation_format") == Some("quat_xyzw");
        let Some(v) = pose.text_floats(if quat_xyzw { 7 } else { 6 })? else {
            return Ok(Pose::identity());
        };

        let quat = if quat_xyzw {
            canonical_quat(Vector4::new(v[6], v[3], v[4], v[5])).map_err(|_| {
                NormalizeError::format_at(
                    format!("zero-length quaternion in <pose> ({})", pose.locator),
                    pose.line,
                )
            })?
        } else {
            let mut rpy = Vector3::new(v[3], v[4], v[5]);
            if matches!(pose.attr("degrees"), Some("true" | "1")) {
                rpy = rpy.map(f64::to_radians);
            }
            rpy_to_quat(rpy)
        };
        let xyz = Vector3::new(v[0], v[1], v[2]);
        Ok(Pose::new(xyz, quat).with_source(pose.provenance(self.file)))
    }

    fn geometry(&self, parent: &Element) -> Result<Option<Geometry>> {
        let geometry = required_child(parent, "geometry")?;
        let Some(shape) = geometry.children.first() else {
            return Ok(None);
        };
        let geometry = match shape.name.as_str() {
            "box" => Geometry::Box(BoxGeometry::new(shape.child_vec3("size", Vector3::zeros())?)),
            "cylinder" => Geometry::Cylinder(Cylinder {
                radius: shape.child_f64("radius", 0.0)?,
                length: shape.child_f64("length", 0.0)?,
                ..Cylinder::default()
            }),
            "sphere" => Geometry::Sphere(Sphere {
                radius: shape.child_f64("radius", 0.0)?,
                ..Sphere::default()
            }),
            "mesh" => Geometry::Mesh(Mesh::new(
                required_text(required_child(shape, "uri")?)?,
                shape.child_vec3("scale", Vector3::new(1.0, 1.0, 1.0))?,
            )),
            other => {
                tracing::warn!(
                    shape = other,
                    locator = %shape.locator,
                    line = shape.line,
                    "SDF geometry has no canonical equivalent, recording none"
                );
                return Ok(None);
            }
        };
        Ok(Some(geometry.with_source(shape.provenance(self.file))))
    }

    fn material(&self, elem: &Element) -> Result<Material> {
        let script = elem.child("script");
        Ok(Material {
            name: script.and_then(|s| s.child_text("name")).map(str::to_string),
            rgba: elem.child_vec4("diffuse")?,
            texture_filename: script.and_then(|s| s.child_text("uri")).map(str::to_string),
            source: elem.provenance(self.file),
        })
    }
}

fn required_text(elem: &Element) -> Result<&str> {
    elem.text().ok_or_else(|| NormalizeError::Validation {
        messages: vec![format!(
            "line {}: {}: element must not be empty",
            elem.line, elem.locator
        )],
    })
}
