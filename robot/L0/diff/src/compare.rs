//! Recursive, type-directed comparison.

use std::collections::{BTreeMap, BTreeSet};

use robot_types::Robot;

use crate::config::DiffConfig;
use crate::filter::filter_categories;
use crate::result::{Change, DiffResult, ItemDiff};
use crate::value::{Diffable, Value};

/// Relative float equality: `|a - b| <= tolerance * max(|a|, |b|)`.
///
/// Equal values (including equal infinities) always match. `NaN` never does.
pub fn floats_close(a: f64, b: f64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}

/// Compare two values and collect changes keyed by path. The root has the
/// empty path.
pub fn compare_values(old: &Value, new: &Value, tolerance: f64) -> BTreeMap<String, Change> {
    let mut changes = BTreeMap::new();
    diff_into(old, new, "", tolerance, &mut changes);
    changes
}

fn record(changes: &mut BTreeMap<String, Change>, path: &str, old: &Value, new: &Value) {
    changes.insert(path.to_string(), Change::new(old.clone(), new.clone()));
}

fn diff_into(
    old: &Value,
    new: &Value,
    path: &str,
    tolerance: f64,
    changes: &mut BTreeMap<String, Change>,
) {
    match (old, new) {
        (Value::Absent, Value::Absent) => {}
        (Value::Absent, _) | (_, Value::Absent) => record(changes, path, old, new),
        (Value::Float(a), Value::Float(b)) => {
            if !floats_close(*a, *b, tolerance) {
                record(changes, path, old, new);
            }
        }
        _ if old == new => {}
        (Value::Record(a), Value::Record(b)) => {
            // a different shape is replaced as a whole, never walked
            if a.type_name != b.type_name || a.fields.len() != b.fields.len() {
                record(changes, path, old, new);
                return;
            }
            for ((name, a), (_, b)) in a.fields.iter().zip(&b.fields) {
                let field_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                diff_into(a, b, &field_path, tolerance, changes);
            }
        }
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                changes.insert(
                    path.to_string(),
                    Change::new(Value::Count(a.len()), Value::Count(b.len())),
                );
            }
            for (i, (a, b)) in a.iter().zip(b).enumerate() {
                diff_into(a, b, &format!("{path}[{i}]"), tolerance, changes);
            }
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let differs = a.len() != b.len()
                || a.iter().zip(b).any(|(x, y)| !floats_close(*x, *y, tolerance));
            if differs {
                record(changes, path, old, new);
            }
        }
        _ => record(changes, path, old, new),
    }
}

fn compare_items<T: Diffable>(
    old: &BTreeMap<String, T>,
    new: &BTreeMap<String, T>,
    tolerance: f64,
) -> BTreeMap<String, ItemDiff> {
    let mut diffs = BTreeMap::new();
    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for name in names {
        let item = match (old.get(name), new.get(name)) {
            (None, Some(_)) => ItemDiff::added(name),
            (Some(_), None) => ItemDiff::removed(name),
            (Some(a), Some(b)) => {
                let changes = compare_values(&a.to_value(), &b.to_value(), tolerance);
                if changes.is_empty() {
                    continue;
                }
                ItemDiff::modified(name, changes)
            }
            (None, None) => continue,
        };
        diffs.insert(name.clone(), item);
    }
    diffs
}

/// Compare two robots without any category filtering.
pub fn compare_robots(old: &Robot, new: &Robot, tolerance: f64) -> DiffResult {
    let mut diff = DiffResult::new(&old.name, &new.name);
    diff.link_diffs = compare_items(&old.links, &new.links, tolerance);
    diff.joint_diffs = compare_items(&old.joints, &new.joints, tolerance);
    diff
}

/// Compare two robots and drop the excluded categories.
///
/// The configuration is not validated here; see [`DiffConfig::validate`].
pub fn compare(old: &Robot, new: &Robot, config: &DiffConfig) -> DiffResult {
    let diff = compare_robots(old, new, config.float_tolerance);
    tracing::debug!(
        old = %old.name,
        new = %new.name,
        links = diff.link_diffs.len(),
        joints = diff.joint_diffs.len(),
        "compared robots"
    );
    if config.excluded.is_empty() {
        diff
    } else {
        filter_categories(&diff, &config.excluded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Category;
    use crate::result::Status;
    use nalgebra::{Vector3, Vector4};
    use robot_types::{
        BoxGeometry, Collision, Cylinder, Geometry, Inertial, Joint, JointType, Limit, Link,
        Provenance, Sphere,
    };
    use std::path::Path;

    const TOL: f64 = 1e-6;

    fn link_with_box(name: &str, size: Vector3<f64>) -> Link {
        let mut link = Link::new(name);
        link.collisions.push(Collision {
            geometry: Some(Geometry::Box(BoxGeometry::new(size))),
            ..Collision::default()
        });
        link
    }

    fn robot(links: Vec<Link>, joints: Vec<Joint>) -> Robot {
        let mut robot = Robot::new("r");
        for link in links {
            robot.add_link(link).unwrap();
        }
        for joint in joints {
            robot.add_joint(joint).unwrap();
        }
        robot
    }

    #[test]
    fn test_floats_close() {
        assert!(floats_close(1.0, 1.0 + 1e-7, TOL));
        assert!(!floats_close(1.0, 1.0 + 1e-5, TOL));
        // relative, not absolute
        assert!(!floats_close(0.0, 1e-9, TOL));
        assert!(floats_close(1e9, 1e9 + 100.0, TOL));
        assert!(floats_close(f64::INFINITY, f64::INFINITY, TOL));
        assert!(!floats_close(f64::INFINITY, 1.0, TOL));
        assert!(!floats_close(f64::NAN, f64::NAN, TOL));
    }

    #[test]
    fn test_identical_robots() {
        let r = robot(
            vec![link_with_box("base", Vector3::repeat(1.0)), Link::new("arm")],
            vec![Joint::new("j", JointType::Revolute, "base", "arm")],
        );
        let diff = compare_robots(&r, &r.clone(), TOL);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_provenance_ignored() {
        let a = robot(vec![Link::new("base")], vec![]);
        let mut b = a.clone();
        b.links.get_mut("base").unwrap().source =
            Provenance::new(Some(Path::new("b.sdf")), "/sdf/model/link", Some(9));
        assert!(compare_robots(&a, &b, TOL).is_empty());
    }

    #[test]
    fn test_collision_added_to_link() {
        let a = robot(vec![Link::new("base")], vec![]);
        let b = robot(vec![link_with_box("base", Vector3::repeat(1.0))], vec![]);
        let diff = compare_robots(&a, &b, TOL);

        let item = &diff.link_diffs["base"];
        assert_eq!(item.status, Status::Modified);
        assert_eq!(item.changes.len(), 1);
        assert_eq!(
            item.changes["collisions"],
            Change::new(Value::Count(0), Value::Count(1))
        );
    }

    #[test]
    fn test_added_and_removed_items() {
        let a = robot(vec![Link::new("base")], vec![]);
        let b = robot(vec![Link::new("base"), Link::new("arm")], vec![]);

        let diff = compare_robots(&a, &b, TOL);
        assert_eq!(diff.link_diffs["arm"].status, Status::Added);
        assert!(diff.link_diffs["arm"].changes.is_empty());
        assert!(!diff.link_diffs.contains_key("base"));

        let diff = compare_robots(&b, &a, TOL);
        assert_eq!(diff.link_diffs["arm"].status, Status::Removed);
    }

    #[test]
    fn test_list_length_and_prefix() {
        let a = link_with_box("base", Vector3::repeat(1.0));
        let mut b = link_with_box("base", Vector3::repeat(2.0));
        b.collisions.push(Collision::default());

        let changes = compare_values(&a.to_value(), &b.to_value(), TOL);
        assert_eq!(changes["collisions"], Change::new(Value::Count(1), Value::Count(2)));
        assert_eq!(
            changes["collisions[0].geometry.size"],
            Change::new(
                Value::Tuple(vec![1.0, 1.0, 1.0]),
                Value::Tuple(vec![2.0, 2.0, 2.0])
            )
        );
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_tuple_reported_whole() {
        let mut a = Joint::new("j", JointType::Revolute, "p", "c");
        let mut b = a.clone();
        a.origin.xyz = Vector3::new(1.0, 2.0, 3.0);
        b.origin.xyz = Vector3::new(1.0, 2.5, 3.0);

        let changes = compare_values(&a.to_value(), &b.to_value(), TOL);
        assert_eq!(changes.len(), 1);
        let change = &changes["origin.xyz"];
        assert_eq!(change.old_value, Value::Tuple(vec![1.0, 2.0, 3.0]));
        assert_eq!(change.new_value, Value::Tuple(vec![1.0, 2.5, 3.0]));

        // within tolerance, element by element
        b.origin.xyz = Vector3::new(1.0, 2.000_000_1, 3.0);
        assert!(compare_values(&a.to_value(), &b.to_value(), TOL).is_empty());
    }

    #[test]
    fn test_geometry_variant_mismatch() {
        let a = link_with_box("base", Vector3::repeat(1.0));
        let mut b = a.clone();
        b.collisions[0].geometry = Some(Geometry::Cylinder(Cylinder {
            radius: 1.0,
            length: 1.0,
            ..Cylinder::default()
        }));

        let changes = compare_values(&a.to_value(), &b.to_value(), TOL);
        assert_eq!(changes.len(), 1);
        let change = &changes["collisions[0].geometry"];
        assert_eq!(change.old_value.to_string(), "Box");
        assert_eq!(change.new_value.to_string(), "Cylinder");
    }

    #[test]
    fn test_optional_presence() {
        let a = Link::new("base");
        let mut b = a.clone();
        b.inertial = Some(Inertial {
            mass: 1.0,
            ..Inertial::default()
        });

        let changes = compare_values(&a.to_value(), &b.to_value(), TOL);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["inertial"].status(), Status::Added);

        let changes = compare_values(&b.to_value(), &a.to_value(), TOL);
        assert_eq!(changes["inertial"].status(), Status::Removed);
    }

    #[test]
    fn test_joint_fields() {
        let a = Joint::new("j", JointType::Revolute, "p", "c");
        let mut b = a.clone();
        b.joint_type = JointType::Continuous;
        b.limit = Some(Limit::range(-1.0, 1.0));
        b.axis = Vector3::z();

        let changes = compare_values(&a.to_value(), &b.to_value(), TOL);
        let paths: Vec<_> = changes.keys().map(String::as_str).collect();
        assert_eq!(paths, ["axis", "limit", "type"]);
        assert_eq!(changes["type"].new_value, Value::Text("continuous".into()));
    }

    #[test]
    fn test_rotation_tuple() {
        let mut a = Link::new("l");
        a.collisions.push(Collision {
            geometry: Some(Geometry::Sphere(Sphere {
                radius: 0.1,
                ..Sphere::default()
            })),
            ..Collision::default()
        });
        let mut b = a.clone();
        b.collisions[0].origin.quat = Vector4::new(0.707_107, 0.707_107, 0.0, 0.0);

        let changes = compare_values(&a.to_value(), &b.to_value(), TOL);
        assert!(changes.contains_key("collisions[0].origin.quat"));
    }

    #[test]
    fn test_compare_applies_filter() {
        let a = robot(vec![Link::new("base")], vec![]);
        let b = robot(
            vec![link_with_box("base", Vector3::repeat(1.0)), Link::new("arm")],
            vec![Joint::new("j", JointType::Fixed, "base", "arm")],
        );

        let all = compare(&a, &b, &DiffConfig::default());
        assert_eq!(all.link_diffs.len(), 2);
        assert_eq!(all.joint_diffs.len(), 1);

        let config = DiffConfig::default().exclude(Category::Kinematic);
        let filtered = compare(&a, &b, &config);
        assert!(filtered.joint_diffs.is_empty());
        assert_eq!(filtered.link_diffs.keys().collect::<Vec<_>>(), ["base"]);
    }
}
