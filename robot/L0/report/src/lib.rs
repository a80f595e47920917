//! Rendering of robot model diffs.
//!
//! Four report layouts share one [`DiffResult`]:
//!
//! - [`ReportFormat::Status`]: removed, added and modified sections with a summary line
//! - [`ReportFormat::Git`]: `@@` hunks with `-`/`+` lines
//! - [`ReportFormat::Category`]: kinematic, collision, inertia and visual sections
//! - [`ReportFormat::Json`]: the result itself, pretty-printed
//!
//! Text reports colour removed values red and added values green unless a
//! [`Palette::plain`] palette is given.
//!
//! # Example
//!
//! ```
//! use robot_diff::{DiffResult, ItemDiff};
//! use robot_report::{Palette, ReportFormat};
//!
//! let mut diff = DiffResult::new("arm", "arm");
//! diff.link_diffs.insert("tool".into(), ItemDiff::added("tool"));
//!
//! let report = ReportFormat::Git.render(&diff, Palette::plain()).unwrap();
//! assert!(report.contains("+Link tool"));
//! ```

#![doc(html_root_url = "https://docs.rs/robot-report/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::float_cmp
)]

mod category;
mod common;
mod error;
mod git;
mod json;
mod palette;
mod status;

#[cfg(test)]
mod testing;

use std::fmt;
use std::str::FromStr;

use robot_diff::DiffResult;
use robot_types::NormalizeError;

pub use category::render_category;
pub use error::{ReportError, Result};
pub use git::render_git;
pub use json::render_json;
pub use palette::Palette;
pub use status::render_status;

/// Report layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    /// Grouped by item status.
    #[default]
    Status,
    /// Unified-diff style.
    Git,
    /// Grouped by physical concern.
    Category,
    /// Pretty-printed JSON.
    Json,
}

impl ReportFormat {
    /// Every layout.
    pub const ALL: [Self; 4] = [Self::Status, Self::Git, Self::Category, Self::Json];

    /// Lowercase name, as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Git => "git",
            Self::Category => "category",
            Self::Json => "json",
        }
    }

    /// Render a diff. The palette is ignored for JSON.
    pub fn render(self, diff: &DiffResult, palette: Palette) -> Result<String> {
        Ok(match self {
            Self::Status => render_status(diff, palette),
            Self::Git => render_git(diff, palette),
            Self::Category => render_category(diff, palette),
            Self::Json => render_json(diff)?,
        })
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = NormalizeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| {
                NormalizeError::configuration(format!(
                    "unknown report format '{s}' (expected status, git, category or json)"
                ))
            })
    }
}
