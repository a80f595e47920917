//! Helpers for the cross-format conformance tests.
//!
//! The tests themselves live in `integration/`. This crate only provides the
//! glue to normalize a document of any supported format held in memory.
//!
//! ```
//! use robot_conformance_tests::load;
//! use robot_types::SourceFormat;
//!
//! let robot = load(SourceFormat::Urdf, r#"<robot name="r"><link name="a"/></robot>"#).unwrap();
//! assert_eq!(robot.name, "r");
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

use robot_mjcf::MjcfNormalizer;
use robot_sdf::SdfNormalizer;
use robot_types::{Normalizer, Result, Robot, SourceFormat};
use robot_urdf::UrdfNormalizer;
use robot_usd::UsdNormalizer;

/// Normalizer for a source format.
#[must_use]
pub fn normalizer(format: SourceFormat) -> Box<dyn Normalizer> {
    match format {
        SourceFormat::Urdf => Box::new(UrdfNormalizer),
        SourceFormat::Sdf => Box::new(SdfNormalizer),
        SourceFormat::Mjcf => Box::new(MjcfNormalizer),
        SourceFormat::Usd => Box::new(UsdNormalizer),
    }
}

/// Normalize a document of the given format.
pub fn load(format: SourceFormat, source: &str) -> Result<Robot> {
    normalizer(format).normalize_str(source, None)
}
