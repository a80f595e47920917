//! URDF to canonical model conversion.

use std::collections::BTreeMap;
use std::path::Path;

use nalgebra::Vector3;
use robot_types::rotation::rpy_to_quat;
use robot_types::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Material, Mesh, NormalizeError, Normalizer, Pose, Result, Robot, SourceFormat, Sphere, Visual,
};
use robot_xml::{Element, required_attr, required_child};

use crate::grammar::URDF_GRAMMAR;

/// Normalizer for `.urdf` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrdfNormalizer;

impl Normalizer for UrdfNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::Urdf
    }

    fn normalize_str(&self, source: &str, file: Option<&Path>) -> Result<Robot> {
        normalize_urdf_str(source, file)
    }
}

/// Normalize a URDF document held in memory.
///
/// # Errors
///
/// - Format error for malformed XML or unparsable numbers
/// - Validation error when the document does not match the URDF grammar
/// - Semantic error for duplicate link, joint or material names, and for
///   joints that reference undeclared links
pub fn normalize_urdf_str(source: &str, file: Option<&Path>) -> Result<Robot> {
    let doc = robot_xml::load(source, &URDF_GRAMMAR)?;
    let root = &doc.root;

    let mut ctx = Context {
        file,
        materials: BTreeMap::new(),
    };
    ctx.collect_materials(root)?;

    let mut robot = Robot::new(required_attr(root, "name")?);
    robot.source = root.provenance(file);

    for link_elem in root.children_named("link") {
        robot.add_link(ctx.link(link_elem)?)?;
    }
    for joint_elem in root.children_named("joint") {
        robot.add_joint(ctx.joint(joint_elem)?)?;
    }
    robot.check_joint_links(&[])?;

    Ok(robot)
}

struct Context<'a> {
    file: Option<&'a Path>,
    materials: BTreeMap<String, Material>,
}

impl Context<'_> {
    /// Top-level `<material>` declarations, referenced by name from visuals.
    fn collect_materials(&mut self, root: &Element) -> Result<()> {
        for elem in root.children_named("material") {
            let name = required_attr(elem, "name")?;
            if self.materials.contains_key(name) {
                return Err(NormalizeError::duplicate("material", name));
            }
            let material = Material {
                name: Some(name.to_string()),
                rgba: color(elem)?,
                texture_filename: texture(elem),
                source: elem.provenance(self.file),
            };
            self.materials.insert(name.to_string(), material);
        }
        Ok(())
    }

    fn link(&self, elem: &Element) -> Result<Link> {
        let mut link = Link::new(required_attr(elem, "name")?);
        link.source = elem.provenance(self.file);
        link.inertial = elem.child("inertial").map(|e| self.inertial(e)).transpose()?;

        for collision in elem.children_named("collision") {
            link.collisions.push(Collision {
                name: collision.attr("name").map(str::to_string),
                origin: self.origin(collision)?,
                geometry: self.geometry(collision)?,
                source: collision.provenance(self.file),
            });
        }
        for visual in elem.children_named("visual") {
            link.visuals.push(Visual {
                origin: self.origin(visual)?,
                geometry: self.geometry(visual)?,
                material: visual.child("material").map(|m| self.material(m)).transpose()?,
                source: visual.provenance(self.file),
            });
        }
        Ok(link)
    }

    fn inertial(&self, elem: &Element) -> Result<Inertial> {
        let mass = match elem.child("mass") {
            Some(m) => m.attr_f64("value", 0.0)?,
            None => 0.0,
        };
        let inertia = match elem.child("inertia") {
            Some(i) => Inertia {
                ixx: i.attr_f64("ixx", 0.0)?,
                ixy: i.attr_f64("ixy", 0.0)?,
                ixz: i.attr_f64("ixz", 0.0)?,
                iyy: i.attr_f64("iyy", 0.0)?,
                iyz: i.attr_f64("iyz", 0.0)?,
                izz: i.attr_f64("izz", 0.0)?,
                source: i.provenance(self.file),
            },
            None => Inertia::default(),
        };
        Ok(Inertial {
            origin: self.origin(elem)?,
            mass,
            inertia,
            source: elem.provenance(self.file),
        })
    }

    /// `<origin>` child of `parent`, identity when absent.
    fn origin(&self, parent: &Element) -> Result<Pose> {
        let Some(origin) = parent.child("origin") else {
            return Ok(Pose::identity());
        };
        let xyz = origin.attr_vec3("xyz", Vector3::zeros())?;
        let rpy = origin.attr_vec3("rpy", Vector3::zeros())?;
        Ok(Pose::new(xyz, rpy_to_quat(rpy)).with_source(origin.provenance(self.file)))
    }

    fn geometry(&self, parent: &Element) -> Result<Option<Geometry>> {
        let geometry = required_child(parent, "geometry")?;
        let Some(shape) = geometry.children.first() else {
            return Ok(None);
        };
        let source = shape.provenance(self.file);
        let geometry = match shape.name.as_str() {
            "box" => Geometry::Box(BoxGeometry::new(shape.attr_vec3("size", Vector3::zeros())?)),
            "cylinder" => Geometry::Cylinder(Cylinder {
                radius: shape.attr_f64("radius", 0.0)?,
                length: shape.attr_f64("length", 0.0)?,
                ..Cylinder::default()
            }),
            "sphere" => Geometry::Sphere(Sphere {
                radius: shape.attr_f64("radius", 0.0)?,
                ..Sphere::default()
            }),
            "mesh" => Geometry::Mesh(Mesh::new(
                required_attr(shape, "filename")?,
                shape.attr_vec3("scale", Vector3::new(1.0, 1.0, 1.0))?,
            )),
            other => {
                tracing::warn!(
                    shape = other,
                    line = shape.line,
                    "URDF geometry has no canonical equivalent, recording none"
                );
                return Ok(None);
            }
        };
        Ok(Some(geometry.with_source(source)))
    }

    /// Visual material: the referenced global material, overridden per attribute
    /// by a local `<color>` or `<texture>`.
    fn material(&self, elem: &Element) -> Result<Material> {
        let name = elem.attr("name");
        let global = name.and_then(|n| self.materials.get(n));

        let rgba = match color(elem)? {
            Some(rgba) => Some(rgba),
            None => global.and_then(|g| g.rgba),
        };
        let texture_filename = texture(elem).or_else(|| global.and_then(|g| g.texture_filename.clone()));

        Ok(Material {
            name: name.map(str::to_string),
            rgba,
            texture_filename,
            source: elem.provenance(self.file),
        })
    }

    fn joint(&self, elem: &Element) -> Result<Joint> {
        let name = required_attr(elem, "name")?;
        let joint_type: JointType = required_attr(elem, "type")?.parse()?;
        let parent = required_attr(required_child(elem, "parent")?, "link")?;
        let child = required_attr(required_child(elem, "child")?, "link")?;

        let mut joint = Joint::new(name, joint_type, parent, child);
        joint.source = elem.provenance(self.file);
        joint.origin = self.origin(elem)?;
        if let Some(axis) = elem.child("axis") {
            joint.axis = axis.attr_vec3("xyz", Vector3::x())?;
        }
        joint.limit = elem
            .child("limit")
            .map(|l| -> Result<Limit> {
                Ok(Limit {
                    lower: l.attr_f64("lower", 0.0)?,
                    upper: l.attr_f64("upper", 0.0)?,
                    effort: l.attr_f64("effort", 0.0)?,
                    velocity: l.attr_f64("velocity", 0.0)?,
                    source: l.provenance(self.file),
                })
            })
            .transpose()?;
        Ok(joint)
    }
}

fn color(material: &Element) -> Result<Option<nalgebra::Vector4<f64>>> {
    match material.child("color") {
        Some(c) => c.attr_vec4("rgba"),
        None => Ok(None),
    }
}

fn texture(material: &Element) -> Option<String> {
    material
        .child("texture")
        .and_then(|t| t.attr("filename"))
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;
    use std::f64::consts::FRAC_PI_2;

    fn parse(xml: &str) -> Result<Robot> {
        normalize_urdf_str(xml, None)
    }

    const TWO_LINK: &str = r#"<?xml version="1.0"?>
<robot name="two_link_arm">
  <material name="blue">
    <color rgba="0 0 1 1"/>
    <texture filename="blue.png"/>
  </material>
  <link name="base_link">
    <inertial>
      <origin xyz="0 0 0.1" rpy="1.5707963267948966 0 0"/>
      <mass value="5.0"/>
      <inertia ixx="0.5" ixy="0.01" iyy="0.5" izz="0.25"/>
    </inertial>
    <visual>
      <geometry><box size="0.2 0.3 0.4"/></geometry>
      <material name="blue"/>
    </visual>
    <collision name="base_col">
      <origin xyz="0 0 0.05"/>
      <geometry><cylinder radius="0.05" length="0.5"/></geometry>
    </collision>
  </link>
  <link name="link1">
    <visual>
      <geometry><mesh filename="package://arm/meshes/link1.stl"/></geometry>
      <material name="blue"><color rgba="1 0 0 1"/></material>
    </visual>
    <collision>
      <geometry><sphere radius="0.08"/></geometry>
    </collision>
  </link>
  <joint name="shoulder" type="revolute">
    <parent link="base_link"/>
    <child link="link1"/>
    <origin xyz="0 0 0.5" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-1.57" upper="1.57" effort="100" velocity="2"/>
    <dynamics damping="0.1"/>
  </joint>
</robot>
"#;

    #[test]
    fn test_two_link_arm() {
        let robot = parse(TWO_LINK).unwrap();
        assert_eq!(robot.name, "two_link_arm");
        assert_eq!(robot.links.len(), 2);
        assert_eq!(robot.joints.len(), 1);

        let joint = &robot.joints["shoulder"];
        assert_eq!(joint.joint_type, JointType::Revolute);
        assert_eq!(joint.parent, "base_link");
        assert_eq!(joint.child, "link1");
        assert_relative_eq!(joint.origin.xyz, Vector3::new(0.0, 0.0, 0.5));
        assert_eq!(joint.origin.quat, Vector4::new(1.0, 0.0, 0.0, 0.0));
        assert_relative_eq!(joint.axis, Vector3::y());
        let limit = joint.limit.as_ref().unwrap();
        assert_relative_eq!(limit.lower, -1.57);
        assert_relative_eq!(limit.upper, 1.57);
        assert_relative_eq!(limit.effort, 100.0);
        assert_relative_eq!(limit.velocity, 2.0);
    }

    #[test]
    fn test_inertial() {
        let robot = parse(TWO_LINK).unwrap();
        let inertial = robot.links["base_link"].inertial.as_ref().unwrap();
        assert_relative_eq!(inertial.mass, 5.0);
        assert_relative_eq!(inertial.inertia.ixx, 0.5);
        assert_relative_eq!(inertial.inertia.ixy, 0.01);
        assert_relative_eq!(inertial.inertia.ixz, 0.0);
        assert_relative_eq!(inertial.inertia.izz, 0.25);
        assert_relative_eq!(inertial.origin.quat, Vector4::new(0.707_107, 0.707_107, 0.0, 0.0));

        assert!(robot.links["link1"].inertial.is_none());
    }

    #[test]
    fn test_geometry() {
        let robot = parse(TWO_LINK).unwrap();
        let base = &robot.links["base_link"];
        match base.visuals[0].geometry.as_ref().unwrap() {
            Geometry::Box(b) => assert_relative_eq!(b.size, Vector3::new(0.2, 0.3, 0.4)),
            other => panic!("expected box, got {other:?}"),
        }
        assert_eq!(base.collisions[0].name.as_deref(), Some("base_col"));
        match base.collisions[0].geometry.as_ref().unwrap() {
            Geometry::Cylinder(c) => {
                assert_relative_eq!(c.radius, 0.05);
                assert_relative_eq!(c.length, 0.5);
            }
            other => panic!("expected cylinder, got {other:?}"),
        }

        let link1 = &robot.links["link1"];
        match link1.visuals[0].geometry.as_ref().unwrap() {
            Geometry::Mesh(m) => {
                assert_eq!(m.filename, "package://arm/meshes/link1.stl");
                assert_relative_eq!(m.scale, Vector3::new(1.0, 1.0, 1.0));
            }
            other => panic!("expected mesh, got {other:?}"),
        }
        assert!(link1.collisions[0].name.is_none());
        assert!(matches!(link1.collisions[0].geometry, Some(Geometry::Sphere(_))));
    }

    #[test]
    fn test_material_resolution() {
        let robot = parse(TWO_LINK).unwrap();

        let global = robot.links["base_link"].visuals[0].material.as_ref().unwrap();
        assert_eq!(global.name.as_deref(), Some("blue"));
        assert_eq!(global.rgba, Some(Vector4::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(global.texture_filename.as_deref(), Some("blue.png"));

        // local color wins, texture still comes from the global material
        let local = robot.links["link1"].visuals[0].material.as_ref().unwrap();
        assert_eq!(local.rgba, Some(Vector4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(local.texture_filename.as_deref(), Some("blue.png"));
    }

    #[test]
    fn test_unknown_material_reference() {
        let robot = parse(
            r#"<robot name="r"><link name="a"><visual>
                 <geometry><sphere radius="1"/></geometry>
                 <material name="nowhere"/>
               </visual></link></robot>"#,
        )
        .unwrap();
        let material = robot.links["a"].visuals[0].material.as_ref().unwrap();
        assert_eq!(material.name.as_deref(), Some("nowhere"));
        assert!(material.rgba.is_none());
        assert!(material.texture_filename.is_none());
    }

    #[test]
    fn test_defaults() {
        let robot = parse(
            r#"<robot name="r">
                 <link name="a"><inertial/></link>
                 <link name="b"/>
                 <joint name="j" type="continuous">
                   <parent link="a"/><child link="b"/>
                   <axis/>
                 </joint>
               </robot>"#,
        )
        .unwrap();
        let joint = &robot.joints["j"];
        assert!(joint.origin.is_identity());
        assert_relative_eq!(joint.axis, Vector3::x());
        assert!(joint.limit.is_none());

        let inertial = robot.links["a"].inertial.as_ref().unwrap();
        assert_relative_eq!(inertial.mass, 0.0);
        assert_eq!(inertial.inertia, Inertia::default());
        assert!(robot.links["b"].visuals.is_empty());
    }

    #[test]
    fn test_origin_rpy() {
        let robot = parse(&format!(
            r#"<robot name="r"><link name="a"/><link name="b"/>
                 <joint name="j" type="fixed"><parent link="a"/><child link="b"/>
                   <origin rpy="0 0 {FRAC_PI_2}"/></joint></robot>"#
        ))
        .unwrap();
        assert_relative_eq!(
            robot.joints["j"].origin.quat,
            Vector4::new(0.707_107, 0.0, 0.0, 0.707_107)
        );
    }

    #[test]
    fn test_duplicate_names() {
        let link = parse(r#"<robot name="r"><link name="a"/><link name="a"/></robot>"#).unwrap_err();
        assert!(link.to_string().contains("duplicate link name: 'a'"));

        let material = parse(
            r#"<robot name="r"><material name="m"/><material name="m"/><link name="a"/></robot>"#,
        )
        .unwrap_err();
        assert!(matches!(material, NormalizeError::Semantic(_)));
        assert!(material.to_string().contains("material"));

        let joint = parse(
            r#"<robot name="r"><link name="a"/><link name="b"/>
                 <joint name="j" type="fixed"><parent link="a"/><child link="b"/></joint>
                 <joint name="j" type="fixed"><parent link="b"/><child link="a"/></joint>
               </robot>"#,
        )
        .unwrap_err();
        assert!(joint.to_string().contains("duplicate joint name: 'j'"));
    }

    #[test]
    fn test_undefined_link() {
        let err = parse(
            r#"<robot name="r"><link name="a"/>
                 <joint name="j" type="fixed"><parent link="a"/><child link="ghost"/></joint>
               </robot>"#,
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::Semantic(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_validation_errors() {
        let err = parse(
            r#"<robot name="r">
                 <link name="a"><visual><geometry/></visual></link>
                 <joint name="j" type="hinge"><parent link="a"/></joint>
               </robot>"#,
        )
        .unwrap_err();
        let NormalizeError::Validation { messages } = err else {
            panic!("expected validation error, got {err}");
        };
        assert!(messages.iter().any(|m| m.contains("expected exactly one of")));
        assert!(messages.iter().any(|m| m.contains("'hinge' is not one of")));
        assert!(messages.iter().any(|m| m.contains("missing required child <child>")));
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse("<robot name=\"r\"><link name=\"a\"></robot>").unwrap_err();
        assert!(matches!(err, NormalizeError::Format { .. }));
    }

    #[test]
    fn test_provenance() {
        let robot = normalize_urdf_str(TWO_LINK, Some(Path::new("arm.urdf"))).unwrap();
        let link = &robot.links["link1"];
        assert_eq!(link.source.line, Some(22));
        assert_eq!(link.source.locator.as_deref(), Some("/robot/link[2]"));
        assert_eq!(link.source.file.as_deref(), Some(Path::new("arm.urdf")));

        let joint = &robot.joints["shoulder"];
        assert_eq!(joint.source.locator.as_deref(), Some("/robot/joint"));
        assert_eq!(joint.origin.source.locator.as_deref(), Some("/robot/joint/origin"));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm.urdf");
        std::fs::write(&path, TWO_LINK).unwrap();

        let robot = UrdfNormalizer.parse(&path).unwrap();
        assert_eq!(robot.name, "two_link_arm");
        assert_eq!(robot.links["base_link"].source.file.as_deref(), Some(path.as_path()));

        let missing = UrdfNormalizer.parse(&dir.path().join("missing.urdf")).unwrap_err();
        assert!(matches!(missing, NormalizeError::FileNotFound { .. }));
    }
}
