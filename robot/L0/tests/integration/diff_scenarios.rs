//! End-to-end scenarios: two documents in, diff and rendered report out.

use std::fs;

use robot_conformance_tests::{load, normalizer};
use robot_diff::{Category, DiffConfig, DiffResult, Status, Value, compare};
use robot_report::{Palette, ReportFormat};
use robot_types::rotation::rpy_to_quat;
use robot_types::{NormalizeError, Robot, SourceFormat, Vector3};
use tempfile::TempDir;

/// A two-link arm with optional extra URDF elements spliced in.
fn urdf(name: &str, mass: &str, base_extra: &str, robot_extra: &str) -> Robot {
    let source = format!(
        r#"<robot name="{name}">
  <link name="base">
    <inertial>
      <mass value="{mass}"/>
      <inertia ixx="1" iyy="1" izz="1"/>
    </inertial>
    <collision>
      <geometry><box size="1 1 1"/></geometry>
    </collision>
    {base_extra}
  </link>
  <link name="upper_arm">
    <visual>
      <geometry><cylinder radius="0.1" length="0.5"/></geometry>
      <material name="blue"><color rgba="0 0 1 1"/></material>
    </visual>
  </link>
  <joint name="shoulder" type="revolute">
    <parent link="base"/>
    <child link="upper_arm"/>
    <origin xyz="0 0 0.5"/>
    <axis xyz="0 1 0"/>
    <limit lower="-1.57" upper="1.57" effort="50" velocity="2"/>
  </joint>
  {robot_extra}
</robot>"#
    );
    load(SourceFormat::Urdf, &source).expect("URDF should load")
}

fn base() -> Robot {
    urdf("arm", "1.0", "", "")
}

const TOOL: &str = r#"<link name="tool"/>
  <joint name="wrist" type="fixed">
    <parent link="upper_arm"/>
    <child link="tool"/>
  </joint>"#;

fn render(diff: &DiffResult, format: ReportFormat) -> String {
    format.render(diff, Palette::plain()).expect("report should render")
}

// ============================================================================
// Structural changes
// ============================================================================

#[test]
fn test_identical_documents() {
    let diff = compare(&base(), &base(), &DiffConfig::default());
    assert!(diff.is_empty());
    assert!(!diff.name_changed());
    assert!(render(&diff, ReportFormat::Status).contains("SUMMARY: 0 removed, 0 added, 0 modified"));
    assert_eq!(render(&diff, ReportFormat::Category), "");
}

#[test]
fn test_added_link_and_joint() {
    let new = urdf("arm", "1.0", "", TOOL);
    let diff = compare(&base(), &new, &DiffConfig::default());

    assert_eq!(diff.link_diffs.len(), 1);
    assert_eq!(diff.link_diffs["tool"].status, Status::Added);
    assert!(diff.link_diffs["tool"].changes.is_empty());
    assert_eq!(diff.joint_diffs["wrist"].status, Status::Added);

    let report = render(&diff, ReportFormat::Status);
    assert!(report.contains("SUMMARY: 0 removed, 2 added, 0 modified"));
    assert!(report.contains("━━━ ADDED ━━━\n\nLink: tool\nJoint: wrist"));

    let git = render(&diff, ReportFormat::Git);
    assert!(git.contains("@@ Links (0 removed, 1 added, 0 modified) @@\n\n+Link tool"));
    assert!(git.contains("+Joint wrist"));
}

#[test]
fn test_removed_link_and_joint() {
    let old = urdf("arm", "1.0", "", TOOL);
    let diff = compare(&old, &base(), &DiffConfig::default());

    assert_eq!(diff.link_diffs["tool"].status, Status::Removed);
    assert_eq!(diff.joint_diffs["wrist"].status, Status::Removed);
    let report = render(&diff, ReportFormat::Category);
    assert!(report.starts_with("━━━ KINEMATIC ━━━\n\nLink: tool\nJoint: wrist"));
}

#[test]
fn test_renamed_robot() {
    let diff = compare(&base(), &urdf("arm_v2", "1.0", "", ""), &DiffConfig::default());
    assert!(diff.is_empty());
    assert!(diff.name_changed());
    assert!(render(&diff, ReportFormat::Status).contains("arm → arm_v2"));
    assert!(render(&diff, ReportFormat::Git).contains("-name: arm\n+name: arm_v2"));
}

// ============================================================================
// Field changes
// ============================================================================

#[test]
fn test_mass_within_and_beyond_tolerance() {
    let new = urdf("arm", "1.0000001", "", "");
    assert!(compare(&base(), &new, &DiffConfig::default()).is_empty());

    let strict = DiffConfig::default().with_tolerance(1e-9);
    let diff = compare(&base(), &new, &strict);
    let change = &diff.link_diffs["base"].changes["inertial.mass"];
    assert_eq!(change.old_value, Value::Float(1.0));
    assert_eq!(change.new_value, Value::Float(1.000_000_1));
}

#[test]
fn test_extra_collision_reports_count() {
    let new = urdf(
        "arm",
        "1.0",
        r#"<collision><geometry><sphere radius="0.2"/></geometry></collision>"#,
        "",
    );
    let diff = compare(&base(), &new, &DiffConfig::default());
    let changes = &diff.link_diffs["base"].changes;
    assert_eq!(changes.len(), 1);
    assert_eq!(changes["collisions"].old_value, Value::Count(1));
    assert_eq!(changes["collisions"].new_value, Value::Count(2));
}

#[test]
fn test_geometry_kind_change_is_whole_replacement() {
    let old = base();
    let mut new = old.clone();
    let sphere = load(
        SourceFormat::Urdf,
        r#"<robot name="s"><link name="l"><collision>
             <geometry><sphere radius="0.5"/></geometry>
           </collision></link></robot>"#,
    )
    .expect("URDF should load")
    .links["l"]
        .collisions[0]
        .clone();
    new.links.get_mut("base").expect("base link").collisions[0] = sphere;

    let diff = compare(&old, &new, &DiffConfig::default());
    let changes = &diff.link_diffs["base"].changes;
    assert_eq!(changes.keys().collect::<Vec<_>>(), ["collisions[0].geometry"]);
    assert!(render(&diff, ReportFormat::Status).contains("collisions[0].geometry: Box → Sphere"));
}

#[test]
fn test_joint_rotation_is_one_tuple_change() {
    let old = base();
    let mut new = old.clone();
    new.joints.get_mut("shoulder").expect("shoulder").origin.quat =
        rpy_to_quat(Vector3::new(0.0, 0.0, 0.5));

    let diff = compare(&old, &new, &DiffConfig::default());
    let changes = &diff.joint_diffs["shoulder"].changes;
    assert_eq!(changes.keys().collect::<Vec<_>>(), ["origin.quat"]);
    assert_eq!(changes["origin.quat"].old_value, Value::Tuple(vec![1.0, 0.0, 0.0, 0.0]));
    assert!(matches!(&changes["origin.quat"].new_value, Value::Tuple(q) if q.len() == 4));
}

#[test]
fn test_limit_removed() {
    let old = base();
    let mut new = old.clone();
    new.joints.get_mut("shoulder").expect("shoulder").limit = None;

    let diff = compare(&old, &new, &DiffConfig::default());
    let change = &diff.joint_diffs["shoulder"].changes["limit"];
    assert_eq!(change.status(), Status::Removed);
    assert!(render(&diff, ReportFormat::Status).contains("  • limit: removed"));
    assert!(render(&diff, ReportFormat::Git).contains("-  limit: Limit"));
}

// ============================================================================
// Category filtering
// ============================================================================

#[test]
fn test_excluding_categories() {
    let new = urdf(
        "arm",
        "2.0",
        r#"<collision><geometry><sphere radius="0.2"/></geometry></collision>"#,
        TOOL,
    );

    let all = compare(&base(), &new, &DiffConfig::default());
    assert_eq!(all.link_diffs["base"].changes.len(), 2);
    assert!(all.link_diffs.contains_key("tool"));

    let no_inertial = compare(&base(), &new, &DiffConfig::default().exclude(Category::Inertial));
    assert_eq!(
        no_inertial.link_diffs["base"].changes.keys().collect::<Vec<_>>(),
        ["collisions"]
    );

    let structural_only = compare(
        &base(),
        &new,
        &DiffConfig::default().exclude_all([Category::Inertial, Category::Collision]),
    );
    assert!(!structural_only.link_diffs.contains_key("base"));
    assert_eq!(structural_only.link_diffs["tool"].status, Status::Added);

    let nothing = compare(&base(), &new, &DiffConfig::default().exclude_all(Category::ALL));
    assert!(nothing.is_empty());
}

#[test]
fn test_category_report_sections() {
    let new = urdf(
        "arm",
        "2.0",
        r#"<collision><geometry><sphere radius="0.2"/></geometry></collision>"#,
        "",
    );
    let report = render(&compare(&base(), &new, &DiffConfig::default()), ReportFormat::Category);
    assert!(report.starts_with("━━━ COLLISION ━━━\n\nLink: base\n  • collisions: 1 → 2"));
    assert!(report.contains("━━━ INERTIA ━━━\n\nLink: base\n  • inertial.mass: 1.0 → 2.0"));
    assert!(!report.contains("VISUAL"));
}

// ============================================================================
// Files and mixed formats
// ============================================================================

#[test]
fn test_parse_from_files() {
    let dir = TempDir::new().expect("temp dir");
    let urdf_path = dir.path().join("arm.urdf");
    let mjcf_path = dir.path().join("arm.xml");
    fs::write(&urdf_path, r#"<robot name="arm"><link name="base"/></robot>"#).expect("write");
    fs::write(
        &mjcf_path,
        r#"<mujoco model="arm"><worldbody><body name="base"/></worldbody></mujoco>"#,
    )
    .expect("write");

    let old = normalizer(SourceFormat::from_path(&urdf_path).expect("urdf"))
        .parse(&urdf_path)
        .expect("URDF should load");
    let new = normalizer(SourceFormat::from_path(&mjcf_path).expect("xml"))
        .parse(&mjcf_path)
        .expect("MJCF should load");
    assert!(compare(&old, &new, &DiffConfig::default()).is_empty());
    assert_eq!(old.links["base"].source.file.as_deref(), Some(urdf_path.as_path()));
    assert_eq!(new.links["base"].source.file.as_deref(), Some(mjcf_path.as_path()));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("missing.sdf");
    let err = normalizer(SourceFormat::Sdf).parse(&path).unwrap_err();
    assert!(matches!(err, NormalizeError::FileNotFound { .. }));
}

#[test]
fn test_json_report_of_real_diff() {
    let new = urdf("arm", "2.0", "", TOOL);
    let json = render(&compare(&base(), &new, &DiffConfig::default()), ReportFormat::Json);
    assert!(json.contains("\"inertial.mass\""));
    assert!(json.contains("\"status\": \"added\""));
}
