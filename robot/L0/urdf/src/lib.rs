//! URDF normalizer.
//!
//! Converts [URDF](http://wiki.ros.org/urdf) (Unified Robot Description
//! Format) documents into the canonical [`robot_types::Robot`] model.
//!
//! # Supported URDF Elements
//!
//! - `<material>` at robot level: named colors and textures, referenced from visuals
//! - `<link>` with `<inertial>`, `<visual>` and `<collision>`
//! - `<joint>` with `<parent>`, `<child>`, `<origin>`, `<axis>` and `<limit>`
//! - Geometry: `<box>`, `<cylinder>`, `<sphere>`, `<mesh>`
//!
//! `<dynamics>`, `<calibration>`, `<mimic>`, `<safety_controller>`,
//! `<transmission>` and `<gazebo>` are validated or tolerated but not part of
//! the canonical model.
//!
//! # Defaults
//!
//! | Missing | Value |
//! |---------|-------|
//! | `<origin>` or its `xyz`/`rpy` | zeros (identity pose) |
//! | `<axis>` | `(1, 0, 0)` |
//! | `<limit>` | no limit |
//! | limit attributes | `0` |
//! | `<mass>` / `<inertia>` | zero |
//! | mesh `scale` | `(1, 1, 1)` |
//!
//! # Example
//!
//! ```
//! use robot_urdf::normalize_urdf_str;
//!
//! let urdf = r#"
//!     <robot name="simple">
//!         <link name="base_link">
//!             <inertial>
//!                 <mass value="1.0"/>
//!                 <inertia ixx="0.1" iyy="0.1" izz="0.1"/>
//!             </inertial>
//!         </link>
//!     </robot>
//! "#;
//!
//! let robot = normalize_urdf_str(urdf, None).expect("should parse");
//! assert_eq!(robot.name, "simple");
//! assert_eq!(robot.links.len(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/robot-urdf/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::redundant_closure_for_method_calls
)]

mod grammar;
mod normalizer;

pub use grammar::URDF_GRAMMAR;
pub use normalizer::{UrdfNormalizer, normalize_urdf_str};
