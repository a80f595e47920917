//! Structural grammar for URDF documents.

use robot_xml::grammar::{ElementRule, Grammar, ValueKind, attr, many, one, opt, required};

const JOINT_TYPES: &[&str] = &[
    "revolute",
    "continuous",
    "prismatic",
    "fixed",
    "floating",
    "planar",
];

const VEC3: ValueKind = ValueKind::Vector(&[3]);
const NUM: ValueKind = ValueKind::Number;

const RULES: &[ElementRule] = &[
    ElementRule::new("robot")
        .attrs(&[required("name", ValueKind::Name), attr("version", ValueKind::Any)])
        .children(&[
            many("link"),
            many("joint"),
            many("material"),
            many("transmission"),
            many("gazebo"),
        ]),
    ElementRule::new("link")
        .attrs(&[required("name", ValueKind::Name), attr("type", ValueKind::Any)])
        .children(&[opt("inertial"), many("visual"), many("collision")]),
    ElementRule::new("inertial").children(&[opt("origin"), opt("mass"), opt("inertia")]),
    ElementRule::new("origin").attrs(&[attr("xyz", VEC3), attr("rpy", VEC3)]),
    ElementRule::new("mass").attrs(&[required("value", NUM)]),
    ElementRule::new("inertia").attrs(&[
        attr("ixx", NUM),
        attr("ixy", NUM),
        attr("ixz", NUM),
        attr("iyy", NUM),
        attr("iyz", NUM),
        attr("izz", NUM),
    ]),
    ElementRule::new("visual")
        .attrs(&[attr("name", ValueKind::Any)])
        .children(&[opt("origin"), one("geometry"), opt("material")]),
    ElementRule::new("collision")
        .attrs(&[attr("name", ValueKind::Any)])
        .children(&[opt("origin"), one("geometry")]),
    ElementRule::new("geometry")
        .children(&[opt("box"), opt("cylinder"), opt("sphere"), opt("mesh")])
        .choice(),
    ElementRule::new("box").attrs(&[required("size", VEC3)]),
    ElementRule::new("cylinder").attrs(&[required("radius", NUM), required("length", NUM)]),
    ElementRule::new("sphere").attrs(&[required("radius", NUM)]),
    ElementRule::new("mesh").attrs(&[required("filename", ValueKind::Name), attr("scale", VEC3)]),
    ElementRule::new("robot/material")
        .attrs(&[required("name", ValueKind::Name)])
        .children(&[opt("color"), opt("texture")]),
    ElementRule::new("visual/material")
        .attrs(&[attr("name", ValueKind::Any)])
        .children(&[opt("color"), opt("texture")]),
    ElementRule::new("color").attrs(&[required("rgba", ValueKind::Vector(&[4]))]),
    ElementRule::new("texture").attrs(&[attr("filename", ValueKind::Any)]),
    ElementRule::new("joint")
        .attrs(&[
            required("name", ValueKind::Name),
            required("type", ValueKind::Choice(JOINT_TYPES)),
        ])
        .children(&[
            one("parent"),
            one("child"),
            opt("origin"),
            opt("axis"),
            opt("limit"),
            opt("dynamics"),
            opt("calibration"),
            opt("mimic"),
            opt("safety_controller"),
        ]),
    ElementRule::new("parent").attrs(&[required("link", ValueKind::Name)]),
    ElementRule::new("child").attrs(&[required("link", ValueKind::Name)]),
    ElementRule::new("axis").attrs(&[attr("xyz", VEC3)]),
    ElementRule::new("limit").attrs(&[
        attr("lower", NUM),
        attr("upper", NUM),
        attr("effort", NUM),
        attr("velocity", NUM),
    ]),
    ElementRule::new("dynamics").attrs(&[attr("damping", NUM), attr("friction", NUM)]),
    ElementRule::new("calibration").attrs(&[
        attr("rising", NUM),
        attr("falling", NUM),
        attr("reference_position", NUM),
    ]),
    ElementRule::new("mimic").attrs(&[
        required("joint", ValueKind::Name),
        attr("multiplier", NUM),
        attr("offset", NUM),
    ]),
    ElementRule::new("safety_controller").attrs(&[
        attr("soft_lower_limit", NUM),
        attr("soft_upper_limit", NUM),
        attr("k_position", NUM),
        required("k_velocity", NUM),
    ]),
    ElementRule::new("transmission").open(),
    ElementRule::new("gazebo").open(),
];

/// URDF grammar.
pub const URDF_GRAMMAR: Grammar = Grammar {
    format: "URDF",
    root: "robot",
    rules: RULES,
};
