//! Equivalent rotations written in every supported notation must normalize to
//! the same canonical quaternion.
//!
//! Covers URDF `rpy`, SDF `euler_rpy` (radians and degrees) and `quat_xyzw`,
//! MJCF `euler` (radians and degrees) and `quat`, USD joint `localRot0`, and
//! USD `xformOp:orient` / `xformOp:rotateXYZ` transforms.

use approx::assert_relative_eq;
use robot_conformance_tests::load;
use robot_types::rotation::rpy_to_quat;
use robot_types::{Robot, SourceFormat, Vector3, Vector4};

const EPS: f64 = 1e-6;

fn urdf(rpy: &str) -> Robot {
    let source = format!(
        r#"<robot name="r">
             <link name="a"/>
             <link name="b"/>
             <joint name="j" type="fixed">
               <parent link="a"/>
               <child link="b"/>
               <origin xyz="1 2 3" rpy="{rpy}"/>
             </joint>
           </robot>"#
    );
    load(SourceFormat::Urdf, &source).expect("URDF should load")
}

fn sdf(pose_attrs: &str, rotation: &str) -> Robot {
    let source = format!(
        r#"<sdf version="1.9">
             <model name="r">
               <link name="a"/>
               <link name="b"><pose relative_to="j"/></link>
               <joint name="j" type="fixed">
                 <parent>a</parent>
                 <child>b</child>
                 <pose relative_to="a"{pose_attrs}>1 2 3 {rotation}</pose>
               </joint>
             </model>
           </sdf>"#
    );
    load(SourceFormat::Sdf, &source).expect("SDF should load")
}

fn mjcf(compiler: &str, rotation: &str) -> Robot {
    let source = format!(
        r#"<mujoco model="r">
             {compiler}
             <worldbody>
               <body name="a">
                 <body name="b" pos="1 2 3" {rotation}/>
               </body>
             </worldbody>
           </mujoco>"#
    );
    load(SourceFormat::Mjcf, &source).expect("MJCF should load")
}

fn usd(local_rot: &str) -> Robot {
    let source = format!(
        r#"#usda 1.0
(
    defaultPrim = "r"
)

def Xform "r"
{{
    rel isaac:physics:robotLinks = [</r/a>, </r/b>]
    rel isaac:physics:robotJoints = </r/j>

    def Xform "a"
    {{
    }}

    def Xform "b"
    {{
    }}

    def PhysicsFixedJoint "j"
    {{
        rel physics:body0 = </r/a>
        rel physics:body1 = </r/b>
        point3f physics:localPos0 = (1, 2, 3)
        quatf physics:localRot0 = ({local_rot})
    }}
}}
"#
    );
    load(SourceFormat::Usd, &source).expect("USD should load")
}

/// Visual origin of a USD link whose visual Xform carries the given ops.
fn usd_visual_origin(ops: &str, order: &str) -> Vector4<f64> {
    let source = format!(
        r#"#usda 1.0
(
    defaultPrim = "r"
)

def Xform "r"
{{
    rel isaac:physics:robotLinks = </r/a>

    def Xform "a"
    {{
        def Xform "visuals"
        {{
            def Xform "shape"
            {{
                {ops}
                uniform token[] xformOpOrder = [{order}]

                def Cube "cube"
                {{
                    double size = 1
                }}
            }}
        }}
    }}
}}
"#
    );
    let robot = load(SourceFormat::Usd, &source).expect("USD should load");
    robot.links["a"].visuals[0].origin.quat
}

fn joint_quat(robot: &Robot) -> Vector4<f64> {
    let joint = robot.joints.values().next().expect("one joint");
    assert_relative_eq!(joint.origin.xyz, Vector3::new(1.0, 2.0, 3.0));
    joint.origin.quat
}

// ============================================================================
// Quarter turn about z
// ============================================================================

#[test]
fn test_quarter_turn_in_every_format() {
    let expected = Vector4::new(0.707_107, 0.0, 0.0, 0.707_107);

    let quats = [
        ("urdf rpy", joint_quat(&urdf("0 0 1.5707963267948966"))),
        ("sdf rpy", joint_quat(&sdf("", "0 0 1.5707963267948966"))),
        ("sdf degrees", joint_quat(&sdf(r#" degrees="true""#, "0 0 90"))),
        (
            "sdf quat_xyzw",
            joint_quat(&sdf(
                r#" rotation_format="quat_xyzw""#,
                "0 0 0.7071068 0.7071068",
            )),
        ),
        ("mjcf euler", joint_quat(&mjcf("", r#"euler="0 0 1.5707963267948966""#))),
        (
            "mjcf euler degrees",
            joint_quat(&mjcf(r#"<compiler angle="degree"/>"#, r#"euler="0 0 90""#)),
        ),
        ("mjcf quat", joint_quat(&mjcf("", r#"quat="0.7071068 0 0 0.7071068""#))),
        ("usd localRot0", joint_quat(&usd("0.7071068, 0, 0, 0.7071068"))),
    ];

    for (label, quat) in quats {
        assert_relative_eq!(quat, expected, epsilon = EPS);
        assert!(quat.w >= 0.0, "{label} is not canonical: {quat:?}");
    }
}

#[test]
fn test_unnormalized_quaternions_are_normalized() {
    let expected = Vector4::new(0.707_107, 0.0, 0.0, 0.707_107);
    assert_relative_eq!(joint_quat(&mjcf("", r#"quat="2 0 0 2""#)), expected, epsilon = EPS);
    assert_relative_eq!(joint_quat(&usd("3, 0, 0, 3")), expected, epsilon = EPS);
}

#[test]
fn test_negative_w_is_flipped() {
    // q and -q are the same rotation
    let positive = joint_quat(&mjcf("", r#"quat="0.5 0.5 0.5 0.5""#));
    let negative = joint_quat(&mjcf("", r#"quat="-0.5 -0.5 -0.5 -0.5""#));
    assert_eq!(positive, negative);
    assert_eq!(positive, Vector4::new(0.5, 0.5, 0.5, 0.5));
}

// ============================================================================
// Arbitrary rotation
// ============================================================================

#[test]
fn test_combined_rotation_matches_across_xml_formats() {
    let rpy = "0.3 -0.2 1.1";
    let expected = rpy_to_quat(Vector3::new(0.3, -0.2, 1.1));

    assert_eq!(joint_quat(&urdf(rpy)), expected);
    assert_eq!(joint_quat(&sdf("", rpy)), expected);
    assert_eq!(joint_quat(&mjcf("", &format!(r#"euler="{rpy}""#))), expected);
}

#[test]
fn test_usd_transform_ops_match_rpy() {
    let (roll, pitch, yaw) = (0.3_f64, -0.2_f64, 1.1_f64);
    let expected = rpy_to_quat(Vector3::new(roll, pitch, yaw));

    let rotate = usd_visual_origin(
        &format!(
            "float3 xformOp:rotateXYZ = ({}, {}, {})",
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees()
        ),
        r#""xformOp:rotateXYZ""#,
    );
    assert_relative_eq!(rotate, expected, epsilon = EPS);

    // USD writes quaternions real part first, like the model
    let orient = usd_visual_origin(
        &format!(
            "quatf xformOp:orient = ({}, {}, {}, {})",
            expected.w, expected.x, expected.y, expected.z
        ),
        r#""xformOp:orient""#,
    );
    assert_relative_eq!(orient, expected, epsilon = EPS);
}

#[test]
fn test_half_turn_from_matrix() {
    let quat = usd_visual_origin(
        "matrix4d xformOp:transform = ((-1, 0, 0, 0), (0, -1, 0, 0), (0, 0, 1, 0), (0, 0, 0, 1))",
        r#""xformOp:transform""#,
    );
    assert_eq!(quat, Vector4::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(joint_quat(&urdf("0 0 3.141592653589793")), quat);
}
