//! Property-based tests for the structural diff.
//!
//! These tests use proptest to generate random robots and verify invariants
//! of comparison and category filtering.
//!
//! Run with: cargo test -p robot-diff -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use robot_diff::{
    Category, DiffConfig, Status, Value, compare, compare_robots, compare_values,
    filter_categories, floats_close,
};
use robot_types::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Pose, Robot, Sphere, Vector3, Vector4,
};

// =============================================================================
// Strategies for generating random robots
// =============================================================================

/// Generate a finite coordinate in a bounded range.
fn arb_coord() -> impl Strategy<Value = f64> {
    -100.0..100.0f64
}

fn arb_vector() -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(arb_coord()).prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

fn arb_pose() -> impl Strategy<Value = Pose> {
    (arb_vector(), prop::array::uniform4(-1.0..1.0f64))
        .prop_map(|(xyz, [w, x, y, z])| Pose::new(xyz, Vector4::new(w, x, y, z)))
}

/// Generate one of the primitive shapes with positive dimensions.
fn arb_geometry() -> impl Strategy<Value = Geometry> {
    prop_oneof![
        prop::array::uniform3(0.01..10.0f64)
            .prop_map(|[x, y, z]| Geometry::Box(BoxGeometry::new(Vector3::new(x, y, z)))),
        (0.01..10.0f64, 0.01..10.0f64).prop_map(|(radius, length)| {
            Geometry::Cylinder(Cylinder {
                radius,
                length,
                ..Cylinder::default()
            })
        }),
        (0.01..10.0f64).prop_map(|radius| Geometry::Sphere(Sphere {
            radius,
            ..Sphere::default()
        })),
    ]
}

fn arb_inertial() -> impl Strategy<Value = Inertial> {
    (arb_pose(), 0.0..50.0f64, prop::array::uniform3(0.0..5.0f64)).prop_map(
        |(origin, mass, [ixx, iyy, izz])| Inertial {
            origin,
            mass,
            inertia: Inertia::diagonal(ixx, iyy, izz),
            ..Inertial::default()
        },
    )
}

fn arb_link(name: String) -> impl Strategy<Value = Link> {
    (
        prop::option::of(arb_inertial()),
        prop::collection::vec((arb_pose(), arb_geometry()), 0..3),
    )
        .prop_map(move |(inertial, collisions)| {
            let mut link = Link::new(name.clone());
            link.inertial = inertial;
            link.collisions = collisions
                .into_iter()
                .map(|(origin, geometry)| Collision {
                    origin,
                    geometry: Some(geometry),
                    ..Collision::default()
                })
                .collect();
            link
        })
}

/// Generate a serial chain with `n` links and `n - 1` joints.
fn arb_robot(max_links: usize) -> impl Strategy<Value = Robot> {
    (1..=max_links).prop_flat_map(|n| {
        let links: Vec<_> = (0..n).map(|i| arb_link(format!("link{i}"))).collect();
        let limits = prop::collection::vec(prop::option::of((-3.0..0.0f64, 0.0..3.0f64)), n - 1);
        (links, limits).prop_map(|(links, limits)| {
            let mut robot = Robot::new("chain");
            for link in links {
                robot.add_link(link).unwrap();
            }
            for (i, limit) in limits.into_iter().enumerate() {
                let mut joint = Joint::new(
                    format!("joint{i}"),
                    JointType::Revolute,
                    format!("link{i}"),
                    format!("link{}", i + 1),
                );
                joint.limit = limit.map(|(lower, upper)| Limit::range(lower, upper));
                robot.add_joint(joint).unwrap();
            }
            robot
        })
    })
}

fn arb_excluded() -> impl Strategy<Value = BTreeSet<Category>> {
    prop::array::uniform4(any::<bool>()).prop_map(|picks| {
        Category::ALL
            .into_iter()
            .zip(picks)
            .filter_map(|(category, picked)| picked.then_some(category))
            .collect()
    })
}

// =============================================================================
// Comparison properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_compare_with_self_is_empty(robot in arb_robot(5)) {
        let diff = compare_robots(&robot, &robot, 0.0);
        prop_assert!(diff.is_empty());
    }

    #[test]
    fn proptest_compare_is_deterministic(old in arb_robot(4), new in arb_robot(4)) {
        let config = DiffConfig::default();
        prop_assert_eq!(compare(&old, &new, &config), compare(&old, &new, &config));
    }

    #[test]
    fn proptest_swapping_inputs_swaps_statuses(old in arb_robot(4), new in arb_robot(4)) {
        let forward = compare_robots(&old, &new, 1e-6);
        let backward = compare_robots(&new, &old, 1e-6);
        prop_assert_eq!(forward.link_diffs.len(), backward.link_diffs.len());
        for (name, item) in &forward.link_diffs {
            let reverse = &backward.link_diffs[name];
            let expected = match item.status {
                Status::Added => Status::Removed,
                Status::Removed => Status::Added,
                Status::Modified => Status::Modified,
            };
            prop_assert_eq!(reverse.status, expected);
        }
    }

    #[test]
    fn proptest_tolerance_boundary(a in 1.0..1000.0f64, tol in 1e-9..1e-3f64) {
        let inside = a + a * tol * 0.5;
        let outside = a + a * tol * 2.0;
        prop_assert!(floats_close(a, inside, tol));
        prop_assert!(!floats_close(a, outside, tol));
        prop_assert!(compare_values(&Value::Float(a), &Value::Float(inside), tol).is_empty());
        prop_assert_eq!(
            compare_values(&Value::Float(a), &Value::Float(outside), tol).len(),
            1
        );
    }

    #[test]
    fn proptest_mass_change_is_reported(robot in arb_robot(3), delta in 1.0..10.0f64) {
        let mut changed = robot.clone();
        let link = changed.links.get_mut("link0").unwrap();
        let mut inertial = link.inertial.clone().unwrap_or_default();
        inertial.mass += delta;
        link.inertial = Some(inertial);

        let diff = compare_robots(&robot, &changed, 1e-6);
        let item = &diff.link_diffs["link0"];
        prop_assert_eq!(item.status, Status::Modified);
        prop_assert!(item.changes.keys().all(|path| path.starts_with("inertial")));
    }
}

// =============================================================================
// Filtering properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_filter_is_idempotent(
        old in arb_robot(4),
        new in arb_robot(4),
        excluded in arb_excluded(),
    ) {
        let diff = compare_robots(&old, &new, 1e-6);
        let once = filter_categories(&diff, &excluded);
        let twice = filter_categories(&once, &excluded);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn proptest_filter_never_adds(
        old in arb_robot(4),
        new in arb_robot(4),
        excluded in arb_excluded(),
    ) {
        let diff = compare_robots(&old, &new, 1e-6);
        let filtered = filter_categories(&diff, &excluded);
        for (name, item) in &filtered.link_diffs {
            let original = &diff.link_diffs[name];
            prop_assert_eq!(item.status, original.status);
            prop_assert!(item.changes.keys().all(|path| original.changes.contains_key(path)));
        }
        prop_assert!(filtered.joint_diffs.len() <= diff.joint_diffs.len());
    }

    #[test]
    fn proptest_excluding_everything_is_empty(old in arb_robot(4), new in arb_robot(4)) {
        let config = DiffConfig::default().exclude_all(Category::ALL);
        prop_assert!(compare(&old, &new, &config).is_empty());
    }
}
