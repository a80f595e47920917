//! Source-tracking XML support for the robot description normalizers.
//!
//! URDF, SDF and MJCF are all XML. This crate gives them:
//!
//! - [`Document`]: an element tree built from `quick-xml` events, where every
//!   [`Element`] records its line and an absolute locator (`/robot/link[2]`).
//! - [`Grammar`]: a static table of element rules used to validate a document
//!   before it is traversed, reporting every violation at once.
//! - Numeric helpers on [`Element`] that turn attribute or text values into
//!   numbers and vectors with line-aware format errors.
//!
//! # Example
//!
//! ```
//! use robot_xml::Document;
//!
//! let doc = Document::parse("<robot name=\"r\">\n  <link name=\"base\"/>\n</robot>").unwrap();
//! let link = doc.root.child("link").unwrap();
//! assert_eq!(link.attr("name"), Some("base"));
//! assert_eq!(link.line, 2);
//! assert_eq!(link.locator, "/robot/link");
//! ```

#![doc(html_root_url = "https://docs.rs/robot-xml/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

mod document;
pub mod grammar;
mod values;

pub use document::{Document, Element};
pub use grammar::{ElementRule, Grammar, ValueKind};
pub use values::{parse_exact, parse_floats};

use robot_types::{NormalizeError, Result};

/// Parse a document and validate it against a grammar.
///
/// # Errors
///
/// Format errors for malformed XML, validation errors for grammar violations.
pub fn load(source: &str, grammar: &Grammar) -> Result<Document> {
    let doc = Document::parse(source)?;
    grammar.validate(&doc)?;
    Ok(doc)
}

/// Required attribute lookup for code running after validation.
///
/// Validation guarantees presence, so a miss here means the grammar and the
/// normalizer disagree; it is reported as a validation error rather than a panic.
pub fn required_attr<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element.attr(name).ok_or_else(|| NormalizeError::Validation {
        messages: vec![format!(
            "line {}: {}: missing required attribute '{name}'",
            element.line, element.locator
        )],
    })
}

/// Required child lookup for code running after validation.
pub fn required_child<'a>(element: &'a Element, name: &str) -> Result<&'a Element> {
    element.child(name).ok_or_else(|| NormalizeError::Validation {
        messages: vec![format!(
            "line {}: {}: missing required child <{name}>",
            element.line, element.locator
        )],
    })
}

