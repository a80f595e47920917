//! MJCF normalizer.
//!
//! Converts [MuJoCo](https://mujoco.readthedocs.io) XML models into the
//! canonical [`robot_types::Robot`] model.
//!
//! # Mapping
//!
//! - Every named `<body>` becomes a link. A body nested in another named body
//!   is connected to it by a joint whose origin is the body's own pose.
//! - `<freejoint>` becomes a floating joint named `<body>_freejoint`. The
//!   first `<joint>` maps `hinge`, `slide`, `ball` and `free` to revolute,
//!   prismatic, continuous and floating, named `<body>_joint`. A body with
//!   neither gets a fixed joint named `<body>_fixed`.
//! - Geoms are split by default class: those in the `visual` class tree become
//!   visuals, those in the `collision` class tree become collisions, and all
//!   others are left out.
//! - Box sizes are half-extents and cylinder lengths half-lengths in MJCF;
//!   both are doubled.
//!
//! # Default Classes
//!
//! `<default>` elements form a class forest. Attributes resolve per attribute
//! from the element, then its class, then each ancestor class. An element's
//! class is its `class` attribute, else the nearest `childclass`, else `main`.
//!
//! # Angles
//!
//! Angles are radians unless `<compiler angle="degree"/>` is given.
//!
//! # Example
//!
//! ```
//! use robot_mjcf::normalize_mjcf_str;
//! use robot_types::JointType;
//!
//! let mjcf = r#"
//!     <mujoco model="pendulum">
//!         <worldbody>
//!             <body name="base">
//!                 <body name="arm" pos="0 0 1">
//!                     <joint name="swing" type="hinge" axis="0 1 0"/>
//!                 </body>
//!             </body>
//!         </worldbody>
//!     </mujoco>
//! "#;
//!
//! let robot = normalize_mjcf_str(mjcf, None).expect("should parse");
//! assert_eq!(robot.name, "pendulum");
//! assert_eq!(robot.joints["swing"].joint_type, JointType::Revolute);
//! ```

#![doc(html_root_url = "https://docs.rs/robot-mjcf/0.3.0")]
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

mod defaults;
mod grammar;
mod normalizer;

pub use grammar::MJCF_GRAMMAR;
pub use normalizer::{MjcfNormalizer, normalize_mjcf_str};
