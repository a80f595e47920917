//! USD normalizer.
//!
//! Reads robots exported in the Isaac layout from USD layers into the
//! canonical [`robot_types::Robot`] model. ASCII layers (`.usda`) go through a
//! small tokenizer and recursive-descent reader, binary crate layers (`.usdc`)
//! through a section reader; both produce the same [`Stage`] of prims. No USD
//! runtime is involved.
//!
//! # Layout
//!
//! ```text
//! /robot                      defaultPrim, robotLinks and robotJoints relationships
//!   /base_link                PhysicsMassAPI gives the inertial
//!     /collisions/<xform>/<geom>   PhysicsCollisionAPI geometry
//!     /visuals/<xform>/<geom>      any geometric prim
//!   /joints/<joint>           PhysicsRevoluteJoint, PhysicsPrismaticJoint, PhysicsFixedJoint
//! ```
//!
//! Collision and visual origins are the local transform of the Xform holding
//! the geometry, and its `xformOp:scale` is folded into the shape dimensions.
//! Revolute limits and velocities are authored in degrees and converted.
//!
//! In-layer references, payloads, inherits and specializes are composed, and
//! instanceable prims read as their instance proxies. Arcs into other files
//! are logged and skipped.
//!
//! # Example
//!
//! ```
//! use robot_usd::normalize_usda_str;
//!
//! let usda = r#"#usda 1.0
//! (
//!     defaultPrim = "bot"
//! )
//! def Xform "bot"
//! {
//!     rel isaac:physics:robotLinks = [</bot/base>]
//!     def Xform "base" {}
//! }
//! "#;
//!
//! let robot = normalize_usda_str(usda, None).expect("should parse");
//! assert_eq!(robot.name, "bot");
//! assert!(robot.links.contains_key("base"));
//! ```

#![doc(html_root_url = "https://docs.rs/robot-usd/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::float_cmp
)]

mod compose;
mod crate_file;
mod lexer;
mod normalizer;
mod stage;
mod xform;

pub use normalizer::{UsdNormalizer, normalize_usda_str, normalize_usdc_bytes};
pub use stage::{Attribute, CompositionArc, Prim, Specifier, Stage, Value};
pub use xform::{local_pose, local_transform};
