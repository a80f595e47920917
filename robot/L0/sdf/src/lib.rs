//! SDF normalizer.
//!
//! Converts [SDFormat](http://sdformat.org) documents into the canonical
//! [`robot_types::Robot`] model. The document's single `<model>` becomes the
//! robot.
//!
//! # Frames
//!
//! SDF poses carry a `relative_to` frame. Only the layout that maps one-to-one
//! onto the canonical model is accepted:
//!
//! | Element | Required `relative_to` | Pose value |
//! |---------|------------------------|------------|
//! | joint `<pose>` | the joint's parent link | any |
//! | child link `<pose>` | the joint that owns the link | identity |
//! | root link `<pose>` | anything | identity |
//!
//! Poses are `x y z roll pitch yaw` by default. `degrees="true"` switches the
//! angles to degrees and `rotation_format="quat_xyzw"` takes
//! `x y z qx qy qz qw` instead.
//!
//! # Mapping
//!
//! - `ball` joints become continuous joints.
//! - The joint limit lives under `<axis><limit>`.
//! - `<capsule>`, `<ellipsoid>`, `<plane>` and `<empty>` geometry have no
//!   canonical counterpart and are recorded as missing geometry.
//! - Material `<diffuse>` is the color, `<script>` supplies name and texture.
//! - `world` is accepted as a joint parent.
//!
//! # Example
//!
//! ```
//! use robot_sdf::normalize_sdf_str;
//!
//! let sdf = r#"
//!     <sdf version="1.9">
//!         <model name="cart">
//!             <link name="chassis"/>
//!         </model>
//!     </sdf>
//! "#;
//!
//! let robot = normalize_sdf_str(sdf, None).expect("should parse");
//! assert_eq!(robot.name, "cart");
//! assert!(robot.links.contains_key("chassis"));
//! ```

#![doc(html_root_url = "https://docs.rs/robot-sdf/0.3.0")]
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

mod grammar;
mod normalizer;

pub use grammar::SDF_GRAMMAR;
pub use normalizer::{SdfNormalizer, normalize_sdf_str};
