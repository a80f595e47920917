//! MJCF to canonical model conversion.

use std::collections::BTreeMap;
use std::path::Path;

use nalgebra::{Vector3, Vector4};
use robot_types::rotation::{canonical_quat, identity_quat, rpy_to_quat};
use robot_types::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Material, Mesh, NormalizeError, Normalizer, Pose, Result, Robot, SourceFormat, Sphere, Visual,
};
use robot_xml::{Element, parse_exact, parse_floats, required_attr};

use crate::defaults::{ClassForest, ClassId, Kind, Resolved};
use crate::grammar::MJCF_GRAMMAR;

/// Normalizer for MuJoCo `.xml` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MjcfNormalizer;

impl Normalizer for MjcfNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::Mjcf
    }

    fn normalize_str(&self, source: &str, file: Option<&Path>) -> Result<Robot> {
        normalize_mjcf_str(source, file)
    }
}

/// Normalize an MJCF document held in memory.
///
/// # Errors
///
/// - Format error for malformed XML or unparsable numbers
/// - Validation error when the document does not match the MJCF grammar
/// - Semantic error for duplicate body, joint, material, mesh or class
///   names, and for references to undeclared classes, meshes or materials
pub fn normalize_mjcf_str(source: &str, file: Option<&Path>) -> Result<Robot> {
    let doc = robot_xml::load(source, &MJCF_GRAMMAR)?;
    let root = &doc.root;

    let compiler = root.child("compiler");
    let mut ctx = Context {
        file,
        forest: ClassForest::from_root(root)?,
        materials: BTreeMap::new(),
        meshes: BTreeMap::new(),
        degrees: compiler.and_then(|c| c.attr("angle")) == Some("degree"),
    };
    ctx.collect_assets(root, compiler.and_then(|c| c.attr("meshdir")))?;

    let mut robot = Robot::new(root.attr("model").unwrap_or("robot"));
    robot.source = root.provenance(file);

    for worldbody in root.children_named("worldbody") {
        ctx.bodies(worldbody, None, None, &mut robot)?;
    }
    robot.check_joint_links(&[])?;

    Ok(robot)
}

struct Context<'a> {
    file: Option<&'a Path>,
    forest: ClassForest,
    materials: BTreeMap<String, Material>,
    meshes: BTreeMap<String, Mesh>,
    degrees: bool,
}

impl Context<'_> {
    fn collect_assets(&mut self, root: &Element, meshdir: Option<&str>) -> Result<()> {
        let assets: Vec<&Element> = root.children_named("asset").collect();

        let textures: BTreeMap<&str, &str> = assets
            .iter()
            .flat_map(|a| a.children_named("texture"))
            .filter_map(|t| Some((t.attr("name")?, t.attr("file")?)))
            .collect();

        for elem in assets.iter().flat_map(|a| a.children_named("material")) {
            let name = required_attr(elem, "name")?;
            if self.materials.contains_key(name) {
                return Err(NormalizeError::duplicate("material", name));
            }
            let material = Material {
                name: Some(name.to_string()),
                rgba: elem.attr_vec4("rgba")?,
                texture_filename: elem
                    .attr("texture")
                    .and_then(|t| textures.get(t))
                    .map(|f| (*f).to_string()),
                source: elem.provenance(self.file),
            };
            self.materials.insert(name.to_string(), material);
        }

        for elem in assets.iter().flat_map(|a| a.children_named("mesh")) {
            // meshes without a file are procedural and have no canonical form
            let Some(file) = elem.attr("file") else {
                continue;
            };
            let name = elem
                .attr("name")
                .or_else(|| Path::new(file).file_stem().and_then(|s| s.to_str()))
                .unwrap_or(file);
            if self.meshes.contains_key(name) {
                return Err(NormalizeError::duplicate("mesh", name));
            }
            let filename = match meshdir {
                Some(dir) if !dir.is_empty() => Path::new(dir).join(file).to_string_lossy().into_owned(),
                _ => file.to_string(),
            };
            let mesh = Mesh {
                filename,
                scale: elem.attr_vec3("scale", Vector3::new(1.0, 1.0, 1.0))?,
                source: elem.provenance(self.file),
            };
            self.meshes.insert(name.to_string(), mesh);
        }
        Ok(())
    }

    /// Bodies directly under `parent_elem`, then their subtrees.
    fn bodies(
        &self,
        parent_elem: &Element,
        parent: Option<&str>,
        childclass: Option<ClassId>,
        robot: &mut Robot,
    ) -> Result<()> {
        for body in parent_elem.children_named("body") {
            let Some(name) = body.attr("name") else {
                tracing::warn!(
                    line = body.line,
                    locator = %body.locator,
                    "skipping unnamed MJCF body and its subtree"
                );
                continue;
            };
            let childclass = match body.attr("childclass") {
                Some(class) => Some(self.forest.lookup(class)?),
                None => childclass,
            };

            robot.add_link(self.link(body, name, childclass)?)?;
            match parent {
                Some(parent) => robot.add_joint(self.joint(body, parent, name, childclass)?)?,
                None if body.child("joint").is_some() || body.child("freejoint").is_some() => {
                    tracing::debug!(body = name, "joint on a world-attached body is not recorded");
                }
                None => {}
            }
            self.bodies(body, Some(name), childclass, robot)?;
        }
        Ok(())
    }

    fn link(&self, body: &Element, name: &str, childclass: Option<ClassId>) -> Result<Link> {
        let mut link = Link::new(name);
        link.source = body.provenance(self.file);
        link.inertial = body.child("inertial").map(|e| self.inertial(e)).transpose()?;

        for elem in body.children_named("geom") {
            let geom = Resolved::new(elem, Kind::Geom, &self.forest, childclass)?;
            let Some(class) = geom.class() else {
                continue;
            };
            if self.forest.descends_from(class, "visual") {
                link.visuals.push(Visual {
                    origin: self.pose(elem, |n| geom.attr(n))?,
                    geometry: self.geometry(&geom)?,
                    material: self.material(&geom)?,
                    source: elem.provenance(self.file),
                });
            } else if self.forest.descends_from(class, "collision") {
                link.collisions.push(Collision {
                    name: elem.attr("name").map(str::to_string),
                    origin: self.pose(elem, |n| geom.attr(n))?,
                    geometry: self.geometry(&geom)?,
                    source: elem.provenance(self.file),
                });
            }
        }
        Ok(link)
    }

    fn joint(
        &self,
        body: &Element,
        parent: &str,
        child: &str,
        childclass: Option<ClassId>,
    ) -> Result<Joint> {
        let origin = self.pose(body, |n| body.attr(n))?;

        if let Some(free) = body.child("freejoint") {
            let name = free
                .attr("name")
                .map_or_else(|| format!("{child}_freejoint"), str::to_string);
            let mut joint = Joint::new(name, JointType::Floating, parent, child);
            joint.origin = origin;
            joint.source = free.provenance(self.file);
            return Ok(joint);
        }

        let mut declared = body.children_named("joint");
        let Some(elem) = declared.next() else {
            let mut joint = Joint::new(format!("{child}_fixed"), JointType::Fixed, parent, child);
            joint.origin = origin;
            joint.source = body.provenance(self.file);
            return Ok(joint);
        };
        if declared.next().is_some() {
            tracing::warn!(body = child, "MJCF body has several joints, keeping the first");
        }

        let resolved = Resolved::new(elem, Kind::Joint, &self.forest, childclass)?;
        let joint_type = match resolved.attr("type").unwrap_or("hinge") {
            "hinge" => JointType::Revolute,
            "slide" => JointType::Prismatic,
            "ball" => JointType::Continuous,
            "free" => JointType::Floating,
            other => {
                return Err(NormalizeError::format_at(
                    format!("unknown MJCF joint type '{other}' ({})", elem.locator),
                    elem.line,
                ));
            }
        };
        let name = elem
            .attr("name")
            .map_or_else(|| format!("{child}_joint"), str::to_string);

        let mut joint = Joint::new(name, joint_type, parent, child);
        joint.origin = origin;
        joint.source = elem.provenance(self.file);
        joint.axis = match resolved.attr("axis") {
            Some(axis) => Vector3::from_column_slice(&floats(elem, "axis", axis, 3)?),
            None => Vector3::z(),
        };
        if joint_type != JointType::Floating {
            let range = match resolved.attr("range") {
                Some(range) => floats(elem, "range", range, 2)?,
                None => vec![0.0, 0.0],
            };
            let angular = matches!(joint_type, JointType::Revolute | JointType::Continuous);
            let (lower, upper) = if self.degrees && angular {
                (range[0].to_radians(), range[1].to_radians())
            } else {
                (range[0], range[1])
            };
            joint.limit = Some(Limit {
                source: elem.provenance(self.file),
                ..Limit::range(lower, upper)
            });
        }
        Ok(joint)
    }

    fn inertial(&self, elem: &Element) -> Result<Inertial> {
        let inertia = if let Some(diag) = elem.attr_floats("diaginertia", 3)? {
            Inertia::diagonal(diag[0], diag[1], diag[2])
        } else if let Some(full) = elem.attr_floats("fullinertia", 6)? {
            // M(1,1) M(2,2) M(3,3) M(1,2) M(1,3) M(2,3)
            Inertia {
                ixx: full[0],
                iyy: full[1],
                izz: full[2],
                ixy: full[3],
                ixz: full[4],
                iyz: full[5],
                source: elem.provenance(self.file),
            }
        } else {
            Inertia::default()
        };
        Ok(Inertial {
            origin: self.pose(elem, |n| elem.attr(n))?,
            mass: elem.attr_f64("mass", 0.0)?,
            inertia: Inertia {
                source: elem.provenance(self.file),
                ..inertia
            },
            source: elem.provenance(self.file),
        })
    }

    /// Pose from `pos` and `quat` or `euler`, with `quat` taking precedence.
    fn pose<'e>(&self, elem: &Element, get: impl Fn(&str) -> Option<&'e str>) -> Result<Pose> {
        let xyz = match get("pos") {
            Some(pos) => Vector3::from_column_slice(&floats(elem, "pos", pos, 3)?),
            None => Vector3::zeros(),
        };
        let quat = if let Some(quat) = get("quat") {
            let q = floats(elem, "quat", quat, 4)?;
            canonical_quat(Vector4::new(q[0], q[1], q[2], q[3])).map_err(|_| {
                NormalizeError::format_at(
                    format!("zero-length quaternion on <{}> ({})", elem.name, elem.locator),
                    elem.line,
                )
            })?
        } else if let Some(euler) = get("euler") {
            let mut rpy = Vector3::from_column_slice(&floats(elem, "euler", euler, 3)?);
            if self.degrees {
                rpy = rpy.map(f64::to_radians);
            }
            rpy_to_quat(rpy)
        } else {
            identity_quat()
        };
        Ok(Pose::new(xyz, quat).with_source(elem.provenance(self.file)))
    }

    fn geometry(&self, geom: &Resolved<'_>) -> Result<Option<Geometry>> {
        let elem = geom.elem;
        if let Some(mesh) = geom.attr("mesh") {
            let mesh = self.meshes.get(mesh).ok_or_else(|| {
                NormalizeError::semantic(format!(
                    "geom at line {} references undefined mesh '{mesh}'",
                    elem.line
                ))
            })?;
            return Ok(Some(Geometry::Mesh(mesh.clone())));
        }

        let size = |n: usize| -> Result<Option<Vec<f64>>> {
            geom.attr("size")
                .map(|s| at_least(elem, "size", s, n))
                .transpose()
        };
        let geometry = match geom.attr("type").unwrap_or("sphere") {
            "box" => Geometry::Box(BoxGeometry::new(
                size(3)?.map_or_else(Vector3::zeros, |s| Vector3::new(s[0], s[1], s[2]) * 2.0),
            )),
            "cylinder" => {
                let (radius, length) = size(2)?.map_or((0.0, 0.0), |s| (s[0], 2.0 * s[1]));
                Geometry::Cylinder(Cylinder {
                    radius,
                    length,
                    ..Cylinder::default()
                })
            }
            "sphere" => Geometry::Sphere(Sphere {
                radius: size(1)?.map_or(0.0, |s| s[0]),
                ..Sphere::default()
            }),
            "mesh" => {
                return Err(NormalizeError::semantic(format!(
                    "mesh geom at line {} does not name a mesh",
                    elem.line
                )));
            }
            other => {
                tracing::warn!(
                    shape = other,
                    locator = %elem.locator,
                    line = elem.line,
                    "MJCF geometry has no canonical equivalent, recording none"
                );
                return Ok(None);
            }
        };
        Ok(Some(geometry.with_source(elem.provenance(self.file))))
    }

    /// Material of a visual geom. The geom's own `rgba` overrides the
    /// referenced material's color.
    fn material(&self, geom: &Resolved<'_>) -> Result<Option<Material>> {
        let Some(name) = geom.attr("material") else {
            return Ok(None);
        };
        let elem = geom.elem;
        let base = self.materials.get(name).ok_or_else(|| {
            NormalizeError::semantic(format!(
                "geom at line {} references undefined material '{name}'",
                elem.line
            ))
        })?;
        let rgba = match elem.attr_vec4("rgba")? {
            Some(rgba) => Some(rgba),
            None => base.rgba,
        };
        Ok(Some(Material {
            rgba,
            source: elem.provenance(self.file),
            ..base.clone()
        }))
    }
}

fn floats(elem: &Element, attr: &str, value: &str, n: usize) -> Result<Vec<f64>> {
    parse_exact(value, n).map_err(|m| attr_error(elem, attr, &m))
}

/// At least `n` numbers. MuJoCo ignores trailing size values a shape does not use.
fn at_least(elem: &Element, attr: &str, value: &str, n: usize) -> Result<Vec<f64>> {
    let values = parse_floats(value).map_err(|m| attr_error(elem, attr, &m))?;
    if values.len() < n {
        return Err(attr_error(
            elem,
            attr,
            &format!("expected at least {n} values, got {}: '{value}'", values.len()),
        ));
    }
    Ok(values)
}

fn attr_error(elem: &Element, attr: &str, message: &str) -> NormalizeError {
    NormalizeError::format_at(
        format!("invalid attribute '{attr}' on <{}> ({}): {message}", elem.name, elem.locator),
        elem.line,
    )
}
