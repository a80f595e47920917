//! Property-based tests over generated documents.
//!
//! Random arms are written out as URDF and SDF text, normalized, and diffed.
//!
//! Run with: cargo test -p robot-conformance-tests -- proptest

use proptest::prelude::*;
use robot_conformance_tests::load;
use robot_diff::{DEFAULT_FLOAT_TOLERANCE, DiffConfig, compare, compare_robots};
use robot_report::{Palette, ReportFormat};
use robot_types::{Robot, SourceFormat};

// =============================================================================
// Strategies for generating random arms
// =============================================================================

/// Parameters of a one-joint arm.
#[derive(Debug, Clone)]
struct ArmParams {
    mass: f64,
    size: [f64; 3],
    offset: [f64; 3],
    rpy: [f64; 3],
    limit: (f64, f64),
}

fn arb_arm() -> impl Strategy<Value = ArmParams> {
    (
        0.1..100.0f64,
        prop::array::uniform3(0.01..5.0f64),
        prop::array::uniform3(-2.0..2.0f64),
        prop::array::uniform3(-3.0..3.0f64),
        (-3.0..0.0f64, 0.0..3.0f64),
    )
        .prop_map(|(mass, size, offset, rpy, limit)| ArmParams {
            mass,
            size,
            offset,
            rpy,
            limit,
        })
}

fn join(v: [f64; 3]) -> String {
    format!("{} {} {}", v[0], v[1], v[2])
}

fn urdf(p: &ArmParams) -> String {
    format!(
        r#"<robot name="arm">
  <link name="base">
    <inertial><mass value="{mass}"/><inertia ixx="1" iyy="1" izz="1"/></inertial>
    <collision name="hull"><geometry><box size="{size}"/></geometry></collision>
  </link>
  <link name="tip"/>
  <joint name="hinge" type="revolute">
    <parent link="base"/>
    <child link="tip"/>
    <origin xyz="{offset}" rpy="{rpy}"/>
    <limit lower="{lower}" upper="{upper}"/>
  </joint>
</robot>"#,
        mass = p.mass,
        size = join(p.size),
        offset = join(p.offset),
        rpy = join(p.rpy),
        lower = p.limit.0,
        upper = p.limit.1,
    )
}

fn sdf(p: &ArmParams) -> String {
    format!(
        r#"<sdf version="1.9">
  <model name="arm">
    <link name="base">
      <inertial>
        <mass>{mass}</mass>
        <inertia><ixx>1</ixx><iyy>1</iyy><izz>1</izz></inertia>
      </inertial>
      <collision name="hull"><geometry><box><size>{size}</size></box></geometry></collision>
    </link>
    <link name="tip"><pose relative_to="hinge"/></link>
    <joint name="hinge" type="revolute">
      <parent>base</parent>
      <child>tip</child>
      <pose relative_to="base">{offset} {rpy}</pose>
      <axis><xyz>1 0 0</xyz><limit><lower>{lower}</lower><upper>{upper}</upper></limit></axis>
    </joint>
  </model>
</sdf>"#,
        mass = p.mass,
        size = join(p.size),
        offset = join(p.offset),
        rpy = join(p.rpy),
        lower = p.limit.0,
        upper = p.limit.1,
    )
}

fn load_urdf(p: &ArmParams) -> Robot {
    load(SourceFormat::Urdf, &urdf(p)).expect("generated URDF should load")
}

// =============================================================================
// Pipeline properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_document_diffs_equal_to_itself(params in arb_arm()) {
        let a = load_urdf(&params);
        let b = load_urdf(&params);
        prop_assert!(compare_robots(&a, &b, 0.0).is_empty());
    }

    #[test]
    fn proptest_urdf_and_sdf_agree(params in arb_arm()) {
        let from_urdf = load_urdf(&params);
        let from_sdf = load(SourceFormat::Sdf, &sdf(&params)).expect("generated SDF should load");
        let diff = compare_robots(&from_urdf, &from_sdf, DEFAULT_FLOAT_TOLERANCE);
        prop_assert!(diff.is_empty(), "{:#?}", diff);
    }

    #[test]
    fn proptest_canonical_quaternions(params in arb_arm()) {
        let robot = load_urdf(&params);
        let q = robot.joints["hinge"].origin.quat;
        prop_assert!(q.w >= 0.0);
        prop_assert!((q.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn proptest_mass_tolerance_boundary(params in arb_arm()) {
        let old = load_urdf(&params);

        let within = ArmParams { mass: params.mass * (1.0 + 0.5 * DEFAULT_FLOAT_TOLERANCE), ..params.clone() };
        prop_assert!(compare(&old, &load_urdf(&within), &DiffConfig::default()).is_empty());

        let beyond = ArmParams { mass: params.mass * (1.0 + 2.0 * DEFAULT_FLOAT_TOLERANCE), ..params.clone() };
        let diff = compare(&old, &load_urdf(&beyond), &DiffConfig::default());
        prop_assert_eq!(diff.link_diffs.len(), 1);
        prop_assert_eq!(
            diff.link_diffs["base"].changes.keys().collect::<Vec<_>>(),
            vec!["inertial.mass"]
        );
    }

    #[test]
    fn proptest_reports_render(old in arb_arm(), new in arb_arm()) {
        let diff = compare(&load_urdf(&old), &load_urdf(&new), &DiffConfig::default());
        for format in ReportFormat::ALL {
            let report = format.render(&diff, Palette::plain()).expect("report should render");
            if format == ReportFormat::Json {
                prop_assert!(report.starts_with('{'), "JSON report should start with '{{'");
            }
        }
    }
}
