//! Structural grammar for MJCF documents.
//!
//! MJCF has a very large vocabulary (actuators, sensors, tendons, rendering
//! options). Only the elements the normalizer reads are checked closely. The
//! rest are accepted as open elements.

use robot_xml::grammar::{ElementRule, Grammar, ValueKind, attr, many, opt, required};

const JOINT_TYPES: &[&str] = &["hinge", "slide", "ball", "free"];

const GEOM_TYPES: &[&str] = &[
    "plane", "hfield", "sphere", "capsule", "ellipsoid", "cylinder", "box", "mesh", "sdf",
];

const NUM: ValueKind = ValueKind::Number;
const VEC3: ValueKind = ValueKind::Vector(&[3]);
const QUAT: ValueKind = ValueKind::Vector(&[4]);
const RANGE: ValueKind = ValueKind::Vector(&[2]);

const RULES: &[ElementRule] = &[
    ElementRule::new("mujoco")
        .attrs(&[attr("model", ValueKind::Any)])
        .children(&[
            many("compiler"),
            many("option"),
            many("size"),
            many("visual"),
            many("statistic"),
            many("default"),
            many("asset"),
            many("worldbody"),
            many("contact"),
            many("equality"),
            many("tendon"),
            many("actuator"),
            many("sensor"),
            many("keyframe"),
            many("custom"),
            many("extension"),
        ]),
    ElementRule::new("compiler")
        .attrs(&[
            attr("angle", ValueKind::Choice(&["degree", "radian"])),
            attr("meshdir", ValueKind::Any),
            attr("autolimits", ValueKind::Boolean),
        ])
        .open(),
    ElementRule::new("asset").children(&[
        many("mesh"),
        many("material"),
        many("texture"),
        many("hfield"),
        many("skin"),
    ]),
    ElementRule::new("asset/mesh")
        .attrs(&[
            attr("name", ValueKind::Name),
            attr("file", ValueKind::Name),
            attr("scale", VEC3),
        ])
        .open(),
    ElementRule::new("asset/material")
        .attrs(&[
            required("name", ValueKind::Name),
            attr("rgba", QUAT),
            attr("texture", ValueKind::Name),
        ])
        .open(),
    ElementRule::new("asset/texture")
        .attrs(&[attr("name", ValueKind::Name), attr("file", ValueKind::Name)])
        .open(),
    ElementRule::new("default")
        .attrs(&[attr("class", ValueKind::Name)])
        .children(&[many("default"), opt("joint"), opt("geom")])
        .open(),
    ElementRule::new("worldbody").children(&[many("body"), many("geom")]).open(),
    ElementRule::new("body")
        .attrs(&[
            attr("name", ValueKind::Any),
            attr("childclass", ValueKind::Name),
            attr("pos", VEC3),
            attr("quat", QUAT),
            attr("euler", VEC3),
            attr("mocap", ValueKind::Boolean),
        ])
        .children(&[
            many("body"),
            opt("inertial"),
            many("joint"),
            opt("freejoint"),
            many("geom"),
        ])
        .open(),
    ElementRule::new("inertial").attrs(&[
        attr("pos", VEC3),
        attr("quat", QUAT),
        attr("euler", VEC3),
        attr("mass", NUM),
        attr("diaginertia", VEC3),
        attr("fullinertia", ValueKind::Vector(&[6])),
    ]),
    ElementRule::new("joint")
        .attrs(&[
            attr("name", ValueKind::Name),
            attr("class", ValueKind::Name),
            attr("type", ValueKind::Choice(JOINT_TYPES)),
            attr("axis", VEC3),
            attr("range", RANGE),
            attr("pos", VEC3),
        ])
        .open(),
    ElementRule::new("freejoint")
        .attrs(&[attr("name", ValueKind::Name), attr("align", ValueKind::Any)]),
    ElementRule::new("geom")
        .attrs(&[
            attr("name", ValueKind::Any),
            attr("class", ValueKind::Name),
            attr("type", ValueKind::Choice(GEOM_TYPES)),
            attr("size", ValueKind::AtLeast(1)),
            attr("pos", VEC3),
            attr("quat", QUAT),
            attr("euler", VEC3),
            attr("rgba", QUAT),
            attr("material", ValueKind::Name),
            attr("mesh", ValueKind::Name),
        ])
        .open(),
    ElementRule::new("option").open(),
    ElementRule::new("size").open(),
    ElementRule::new("visual").open(),
    ElementRule::new("statistic").open(),
    ElementRule::new("hfield").open(),
    ElementRule::new("skin").open(),
    ElementRule::new("contact").open(),
    ElementRule::new("equality").open(),
    ElementRule::new("tendon").open(),
    ElementRule::new("actuator").open(),
    ElementRule::new("sensor").open(),
    ElementRule::new("keyframe").open(),
    ElementRule::new("custom").open(),
    ElementRule::new("extension").open(),
];

/// MJCF grammar.
pub const MJCF_GRAMMAR: Grammar = Grammar {
    format: "MJCF",
    root: "mujoco",
    rules: RULES,
};
