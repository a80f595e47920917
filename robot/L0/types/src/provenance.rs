//! Source tracking attached to every model entity.

use std::fmt;
use std::path::{Path, PathBuf};

/// Where an entity came from: file, locator inside the file, and line.
///
/// Provenance never takes part in equality. Two entities that differ only in
/// where they were read from compare equal, which is what lets a robot read
/// from a URDF file compare equal to the same robot read from an SDF file.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Provenance {
    /// Source file, if the document came from disk.
    pub file: Option<PathBuf>,
    /// Hierarchical locator inside the document (`/robot/link[2]`, `/robot/base_link`).
    pub locator: Option<String>,
    /// One-based line number, for text formats that track it.
    pub line: Option<usize>,
}

impl Provenance {
    /// Create a provenance record.
    #[must_use]
    pub fn new(file: Option<&Path>, locator: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            file: file.map(Path::to_path_buf),
            locator: Some(locator.into()),
            line,
        }
    }

    /// True if nothing is known about the origin.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.file.is_none() && self.locator.is_none() && self.line.is_none()
    }
}

impl PartialEq for Provenance {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
            if self.locator.is_some() {
                write!(f, " ")?;
            }
        } else if let Some(line) = self.line {
            write!(f, "line {line} ")?;
        }
        match &self.locator {
            Some(locator) => write!(f, "{locator}"),
            None if self.file.is_none() && self.line.is_none() => write!(f, "<unknown>"),
            None => Ok(()),
        }
    }
}
