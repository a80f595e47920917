//! Canonical robot model shared by every robot-description normalizer.
//!
//! URDF, SDF, MJCF and USD describe the same physical concepts (rigid-body
//! poses, inertia tensors, joint kinematics, visual and collision geometry)
//! with different units, rotation conventions and default rules. Each format
//! crate converts its documents into the types defined here, and the diff
//! engine compares two of them.
//!
//! # Layer 0
//!
//! This crate has no rendering or engine dependencies. It only depends on
//! `nalgebra` for small fixed-size vectors.
//!
//! # Conventions
//!
//! - Lengths in meters, masses in kilograms, angles in radians.
//! - Quaternions are `(w, x, y, z)`, normalized, with `w >= 0` and rounded to
//!   six decimal places (see [`rotation`]).
//! - Every entity carries a [`Provenance`] that is ignored by equality.
//!
//! # Example
//!
//! ```
//! use robot_types::{Joint, JointType, Link, Robot};
//!
//! let mut robot = Robot::new("arm");
//! robot.add_link(Link::new("base")).unwrap();
//! robot.add_link(Link::new("upper")).unwrap();
//! robot
//!     .add_joint(Joint::new("shoulder", JointType::Revolute, "base", "upper"))
//!     .unwrap();
//!
//! assert!(robot.check_joint_links(&[]).is_ok());
//! assert!(robot.add_link(Link::new("base")).is_err());
//! ```

#![doc(html_root_url = "https://docs.rs/robot-types/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::float_cmp
)]

mod error;
mod format;
mod model;
mod provenance;
pub mod rotation;

pub use error::{NormalizeError, Result};
pub use format::{Normalizer, SourceFormat};
pub use model::{
    BoxGeometry, Collision, Cylinder, Geometry, Inertia, Inertial, Joint, JointType, Limit, Link,
    Material, Mesh, Pose, Robot, Sphere, Visual,
};
pub use provenance::Provenance;

// Re-export math types used in the public model
pub use nalgebra::{Vector3, Vector4};
