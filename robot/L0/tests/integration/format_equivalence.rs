//! The same two-link arm written in each format must normalize to models the
//! diff engine considers equal, up to the fields a format cannot express.

use robot_conformance_tests::load;
use robot_diff::{DEFAULT_FLOAT_TOLERANCE, Status, compare_robots};
use robot_types::{JointType, Robot, SourceFormat};

const URDF_ARM: &str = r#"<robot name="arm">
  <link name="base">
    <inertial>
      <origin xyz="0 0 0.1"/>
      <mass value="2.5"/>
      <inertia ixx="0.1" iyy="0.2" izz="0.3"/>
    </inertial>
    <collision name="base_box">
      <origin xyz="0 0 0.05"/>
      <geometry><box size="1 2 3"/></geometry>
    </collision>
  </link>
  <link name="arm_link">
    <collision name="arm_collision">
      <geometry><cylinder radius="0.05" length="0.4"/></geometry>
    </collision>
    <visual>
      <geometry><sphere radius="0.1"/></geometry>
    </visual>
  </link>
  <joint name="shoulder" type="revolute">
    <parent link="base"/>
    <child link="arm_link"/>
    <origin xyz="0 0 1" rpy="0 0 1.5707963267948966"/>
    <axis xyz="0 0 1"/>
    <limit lower="-1" upper="1" effort="10" velocity="3"/>
  </joint>
</robot>
"#;

const SDF_ARM: &str = r#"<sdf version="1.9">
  <model name="arm">
    <link name="base">
      <inertial>
        <pose>0 0 0.1 0 0 0</pose>
        <mass>2.5</mass>
        <inertia><ixx>0.1</ixx><iyy>0.2</iyy><izz>0.3</izz></inertia>
      </inertial>
      <collision name="base_box">
        <pose>0 0 0.05 0 0 0</pose>
        <geometry><box><size>1 2 3</size></box></geometry>
      </collision>
    </link>
    <link name="arm_link">
      <pose relative_to="shoulder"/>
      <collision name="arm_collision">
        <geometry><cylinder><radius>0.05</radius><length>0.4</length></cylinder></geometry>
      </collision>
      <visual>
        <geometry><sphere><radius>0.1</radius></sphere></geometry>
      </visual>
    </link>
    <joint name="shoulder" type="revolute">
      <parent>base</parent>
      <child>arm_link</child>
      <pose relative_to="base" degrees="true">0 0 1 0 0 90</pose>
      <axis>
        <xyz>0 0 1</xyz>
        <limit><lower>-1</lower><upper>1</upper><effort>10</effort><velocity>3</velocity></limit>
      </axis>
    </joint>
  </model>
</sdf>
"#;

const MJCF_ARM: &str = r#"<mujoco model="arm">
  <default>
    <default class="collision">
      <geom group="3"/>
    </default>
    <default class="visual">
      <geom group="2" type="sphere"/>
    </default>
  </default>
  <worldbody>
    <body name="base">
      <inertial pos="0 0 0.1" mass="2.5" diaginertia="0.1 0.2 0.3"/>
      <geom name="base_box" class="collision" type="box" size="0.5 1 1.5" pos="0 0 0.05"/>
      <body name="arm_link" pos="0 0 1" quat="0.7071068 0 0 0.7071068">
        <joint name="shoulder" type="hinge" axis="0 0 1" range="-1 1"/>
        <geom name="arm_collision" class="collision" type="cylinder" size="0.05 0.2"/>
        <geom class="visual" size="0.1"/>
      </body>
    </body>
  </worldbody>
</mujoco>
"#;

const USD_ARM: &str = r#"#usda 1.0
(
    defaultPrim = "arm"
    upAxis = "Z"
)

def Xform "arm" (
    prepend apiSchemas = ["PhysicsArticulationRootAPI", "IsaacRobotAPI"]
)
{
    rel isaac:physics:robotLinks = [</arm/base>, </arm/arm_link>]
    rel isaac:physics:robotJoints = [</arm/joints/shoulder>]

    def Xform "base" (
        prepend apiSchemas = ["PhysicsRigidBodyAPI", "PhysicsMassAPI"]
    )
    {
        float physics:mass = 2.5
        point3f physics:centerOfMass = (0, 0, 0.1)
        float3 physics:diagonalInertia = (0.1, 0.2, 0.3)

        def Xform "collisions"
        {
            def Xform "base_box"
            {
                double3 xformOp:translate = (0, 0, 0.05)
                float3 xformOp:scale = (1, 2, 3)
                uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:scale"]

                def Cube "box" (
                    prepend apiSchemas = ["PhysicsCollisionAPI"]
                )
                {
                    double size = 1
                }
            }
        }
    }

    def Xform "arm_link" (
        prepend apiSchemas = ["PhysicsRigidBodyAPI"]
    )
    {
        double3 xformOp:translate = (0, 0, 1)
        uniform token[] xformOpOrder = ["xformOp:translate"]

        def Xform "collisions"
        {
            def Xform "arm_collision"
            {
                def Cylinder "cylinder" (
                    prepend apiSchemas = ["PhysicsCollisionAPI"]
                )
                {
                    double radius = 0.05
                    double height = 0.4
                    uniform token axis = "Z"
                }
            }
        }

        def Xform "visuals"
        {
            def Xform "ball"
            {
                def Sphere "sphere"
                {
                    double radius = 0.1
                }
            }
        }
    }

    def Scope "joints"
    {
        def PhysicsRevoluteJoint "shoulder"
        {
            rel physics:body0 = </arm/base>
            rel physics:body1 = </arm/arm_link>
            uniform token physics:axis = "Z"
            point3f physics:localPos0 = (0, 0, 1)
            quatf physics:localRot0 = (0.7071068, 0, 0, 0.7071068)
            float physics:lowerLimit = -57.29577951308232
            float physics:upperLimit = 57.29577951308232
            float drive:angular:physics:maxForce = 10
            float physxJoint:maxJointVelocity = 171.88733853924697
        }
    }
}
"#;

fn arm(format: SourceFormat) -> Robot {
    let source = match format {
        SourceFormat::Urdf => URDF_ARM,
        SourceFormat::Sdf => SDF_ARM,
        SourceFormat::Mjcf => MJCF_ARM,
        SourceFormat::Usd => USD_ARM,
    };
    load(format, source).unwrap_or_else(|e| panic!("{format} arm should load: {e}"))
}

#[test]
fn test_every_format_loads_the_arm() {
    for format in [
        SourceFormat::Urdf,
        SourceFormat::Sdf,
        SourceFormat::Mjcf,
        SourceFormat::Usd,
    ] {
        let robot = arm(format);
        assert_eq!(robot.name, "arm", "{format}");
        assert_eq!(
            robot.links.keys().collect::<Vec<_>>(),
            ["arm_link", "base"],
            "{format}"
        );
        assert_eq!(robot.joints["shoulder"].joint_type, JointType::Revolute, "{format}");
        assert_eq!(robot.joints["shoulder"].parent, "base", "{format}");
        assert_eq!(robot.joints["shoulder"].child, "arm_link", "{format}");
    }
}

#[test]
fn test_urdf_and_sdf_are_equal() {
    let diff = compare_robots(
        &arm(SourceFormat::Urdf),
        &arm(SourceFormat::Sdf),
        DEFAULT_FLOAT_TOLERANCE,
    );
    assert!(diff.is_empty(), "{diff:#?}");
}

#[test]
fn test_urdf_and_usd_are_equal() {
    let diff = compare_robots(
        &arm(SourceFormat::Urdf),
        &arm(SourceFormat::Usd),
        DEFAULT_FLOAT_TOLERANCE,
    );
    assert!(diff.is_empty(), "{diff:#?}");
}

#[test]
fn test_urdf_and_mjcf_differ_only_in_actuation_limits() {
    // MJCF joints carry no effort or velocity limit
    let diff = compare_robots(
        &arm(SourceFormat::Urdf),
        &arm(SourceFormat::Mjcf),
        DEFAULT_FLOAT_TOLERANCE,
    );
    assert!(diff.link_diffs.is_empty(), "{:#?}", diff.link_diffs);
    assert_eq!(diff.joint_diffs.len(), 1);

    let shoulder = &diff.joint_diffs["shoulder"];
    assert_eq!(shoulder.status, Status::Modified);
    assert_eq!(
        shoulder.changes.keys().collect::<Vec<_>>(),
        ["limit.effort", "limit.velocity"]
    );
}

#[test]
fn test_diff_is_direction_independent_for_equal_models() {
    let sdf = arm(SourceFormat::Sdf);
    let usd = arm(SourceFormat::Usd);
    assert!(compare_robots(&sdf, &usd, DEFAULT_FLOAT_TOLERANCE).is_empty());
    assert!(compare_robots(&usd, &sdf, DEFAULT_FLOAT_TOLERANCE).is_empty());
}
