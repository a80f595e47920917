//! Structural grammar for SDF documents.

use robot_xml::grammar::{ElementRule, Grammar, ValueKind, attr, many, one, opt, required, some};

const JOINT_TYPES: &[&str] = &["revolute", "continuous", "prismatic", "fixed", "ball"];

const NUM: ValueKind = ValueKind::Number;
const BOOL: ValueKind = ValueKind::Boolean;
const VEC3: ValueKind = ValueKind::Vector(&[3]);
const COLOR: ValueKind = ValueKind::Vector(&[3, 4]);

const RULES: &[ElementRule] = &[
    ElementRule::new("sdf")
        .attrs(&[attr("version", ValueKind::Any)])
        .children(&[one("model")]),
    ElementRule::new("model")
        .attrs(&[
            required("name", ValueKind::Name),
            attr("canonical_link", ValueKind::Any),
            attr("placement_frame", ValueKind::Any),
        ])
        .children(&[
            many("link"),
            many("joint"),
            opt("pose"),
            opt("static"),
            opt("self_collide"),
            opt("allow_auto_disable"),
            opt("enable_wind"),
            many("frame"),
            many("plugin"),
        ]),
    ElementRule::new("pose")
        .attrs(&[
            attr("relative_to", ValueKind::Any),
            attr("rotation_format", ValueKind::Choice(&["euler_rpy", "quat_xyzw"])),
            attr("degrees", BOOL),
        ])
        .text(ValueKind::Vector(&[0, 6, 7])),
    ElementRule::new("link")
        .attrs(&[required("name", ValueKind::Name)])
        .children(&[
            opt("pose"),
            opt("inertial"),
            many("visual"),
            many("collision"),
            many("sensor"),
            opt("gravity"),
            opt("self_collide"),
            opt("kinematic"),
            opt("must_be_base_link"),
            opt("enable_wind"),
        ]),
    ElementRule::new("inertial").children(&[opt("pose"), opt("mass"), opt("inertia")]),
    ElementRule::new("mass").text(NUM),
    ElementRule::new("inertia").children(&[
        opt("ixx"),
        opt("ixy"),
        opt("ixz"),
        opt("iyy"),
        opt("iyz"),
        opt("izz"),
    ]),
    ElementRule::new("ixx").text(NUM),
    ElementRule::new("ixy").text(NUM),
    ElementRule::new("ixz").text(NUM),
    ElementRule::new("iyy").text(NUM),
    ElementRule::new("iyz").text(NUM),
    ElementRule::new("izz").text(NUM),
    ElementRule::new("visual")
        .attrs(&[attr("name", ValueKind::Any)])
        .children(&[
            opt("pose"),
            one("geometry"),
            opt("material"),
            opt("cast_shadows"),
            opt("transparency"),
            opt("laser_retro"),
            many("plugin"),
        ]),
    ElementRule::new("collision")
        .attrs(&[attr("name", ValueKind::Any)])
        .children(&[
            opt("pose"),
            one("geometry"),
            opt("surface"),
            opt("laser_retro"),
            opt("max_contacts"),
        ]),
    ElementRule::new("geometry")
        .children(&[
            opt("box"),
            opt("cylinder"),
            opt("sphere"),
            opt("mesh"),
            opt("capsule"),
            opt("ellipsoid"),
            opt("plane"),
            opt("empty"),
        ])
        .choice(),
    ElementRule::new("box").children(&[one("size")]),
    ElementRule::new("box/size").text(VEC3),
    ElementRule::new("cylinder").children(&[one("radius"), one("length")]),
    ElementRule::new("sphere").children(&[one("radius")]),
    ElementRule::new("capsule").children(&[one("radius"), one("length")]),
    ElementRule::new("ellipsoid").children(&[one("radii")]),
    ElementRule::new("radii").text(VEC3),
    ElementRule::new("plane").children(&[opt("normal"), opt("size")]),
    ElementRule::new("plane/size").text(ValueKind::Vector(&[2])),
    ElementRule::new("normal").text(VEC3),
    ElementRule::new("empty"),
    ElementRule::new("radius").text(NUM),
    ElementRule::new("length").text(NUM),
    ElementRule::new("mesh").children(&[one("uri"), opt("scale"), opt("submesh")]),
    ElementRule::new("scale").text(VEC3),
    ElementRule::new("uri").text(ValueKind::Name),
    ElementRule::new("material").children(&[
        opt("ambient"),
        opt("diffuse"),
        opt("specular"),
        opt("emissive"),
        opt("script"),
        opt("lighting"),
        opt("shader"),
        opt("pbr"),
        opt("render_order"),
        opt("double_sided"),
    ]),
    ElementRule::new("ambient").text(COLOR),
    ElementRule::new("diffuse").text(ValueKind::Vector(&[4])),
    ElementRule::new("specular").text(COLOR),
    ElementRule::new("emissive").text(COLOR),
    ElementRule::new("lighting").text(BOOL),
    ElementRule::new("double_sided").text(BOOL),
    ElementRule::new("render_order").text(NUM),
    ElementRule::new("script").children(&[some("uri"), one("name")]),
    ElementRule::new("script/name").text(ValueKind::Name),
    ElementRule::new("joint")
        .attrs(&[
            required("name", ValueKind::Name),
            required("type", ValueKind::Choice(JOINT_TYPES)),
        ])
        .children(&[
            one("parent"),
            one("child"),
            opt("pose"),
            opt("axis"),
            opt("physics"),
            many("sensor"),
        ]),
    ElementRule::new("parent").text(ValueKind::Name),
    ElementRule::new("child").text(ValueKind::Name),
    ElementRule::new("axis").children(&[opt("xyz"), opt("limit"), opt("dynamics")]),
    ElementRule::new("xyz")
        .attrs(&[attr("expressed_in", ValueKind::Any)])
        .text(VEC3),
    ElementRule::new("limit").children(&[
        opt("lower"),
        opt("upper"),
        opt("effort"),
        opt("velocity"),
        opt("stiffness"),
        opt("dissipation"),
    ]),
    ElementRule::new("lower").text(NUM),
    ElementRule::new("upper").text(NUM),
    ElementRule::new("effort").text(NUM),
    ElementRule::new("velocity").text(NUM),
    ElementRule::new("stiffness").text(NUM),
    ElementRule::new("dissipation").text(NUM),
    ElementRule::new("static").text(BOOL),
    ElementRule::new("self_collide").text(BOOL),
    ElementRule::new("allow_auto_disable").text(BOOL),
    ElementRule::new("enable_wind").text(BOOL),
    ElementRule::new("gravity").text(BOOL),
    ElementRule::new("kinematic").text(BOOL),
    ElementRule::new("must_be_base_link").text(BOOL),
    ElementRule::new("cast_shadows").text(BOOL),
    ElementRule::new("transparency").text(NUM),
    ElementRule::new("laser_retro").text(NUM),
    ElementRule::new("max_contacts").text(NUM),
    ElementRule::new("frame").open(),
    ElementRule::new("plugin").open(),
    ElementRule::new("sensor").open(),
    ElementRule::new("surface").open(),
    ElementRule::new("submesh").open(),
    ElementRule::new("shader").open(),
    ElementRule::new("pbr").open(),
    ElementRule::new("physics").open(),
    ElementRule::new("dynamics").open(),
];

/// SDF grammar.
pub const SDF_GRAMMAR: Grammar = Grammar {
    format: "SDF",
    root: "sdf",
    rules: RULES,
};
