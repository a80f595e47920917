//! Structural diff of canonical robot models.
//!
//! Two [`Robot`](robot_types::Robot)s are compared link by link and joint by
//! joint. Each entity is turned into a [`Value`] tree through [`Diffable`] and
//! the trees are walked together:
//!
//! | Values | Result |
//! |--------|--------|
//! | one absent | one change at the path, added or removed |
//! | floats | changed when `abs(a - b) > tolerance * max(abs(a), abs(b))` |
//! | records of different type | one change replacing the whole value |
//! | records of the same type | recurse into fields, `origin.xyz` |
//! | lists | a length change if sizes differ, then recurse into the common prefix, `collisions[0]` |
//! | tuples (vectors, quaternions, colors) | one change for the whole tuple if any element differs |
//!
//! Items are keyed and emitted in name order. Category filtering runs on the
//! finished result (see [`filter_categories`]).
//!
//! # Example
//!
//! ```
//! use robot_diff::{DiffConfig, Status, Value, compare};
//! use robot_types::{BoxGeometry, Collision, Geometry, Link, Robot, Vector3};
//!
//! let mut old = Robot::new("bot");
//! old.add_link(Link::new("base")).unwrap();
//!
//! let mut new = old.clone();
//! new.links.get_mut("base").unwrap().collisions.push(Collision {
//!     geometry: Some(Geometry::Box(BoxGeometry::new(Vector3::new(1.0, 1.0, 1.0)))),
//!     ..Collision::default()
//! });
//!
//! let diff = compare(&old, &new, &DiffConfig::default());
//! let base = &diff.link_diffs["base"];
//! assert_eq!(base.status, Status::Modified);
//! assert_eq!(base.changes["collisions"].old_value, Value::Count(0));
//! assert_eq!(base.changes["collisions"].new_value, Value::Count(1));
//! ```

#![doc(html_root_url = "https://docs.rs/robot-diff/0.3.0")]
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

mod compare;
mod config;
mod filter;
mod result;
mod value;

pub use compare::{compare, compare_robots, compare_values, floats_close};
pub use config::{Category, DEFAULT_FLOAT_TOLERANCE, DiffConfig};
pub use filter::{filter_categories, path_in_categories};
pub use result::{Change, DiffResult, ItemDiff, Status, StatusCounts};
pub use value::{Diffable, Record, Value, format_float};
