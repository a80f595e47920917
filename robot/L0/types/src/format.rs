//! Source format selection and the normalizer contract.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use crate::error::{NormalizeError, Result};
use crate::model::Robot;

/// Robot description formats understood by the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Unified Robot Description Format, `.urdf`.
    Urdf,
    /// Simulation Description Format, `.sdf`.
    Sdf,
    /// MuJoCo XML, `.xml`.
    Mjcf,
    /// Universal Scene Description, any extension containing `usd`.
    Usd,
}

impl SourceFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
        match ext {
            "urdf" => Ok(Self::Urdf),
            "sdf" => Ok(Self::Sdf),
            "xml" => Ok(Self::Mjcf),
            e if e.contains("usd") => Ok(Self::Usd),
            e => Err(NormalizeError::configuration(format!(
                "unsupported file extension: '{}' ({})",
                if e.is_empty() { "<none>" } else { e },
                path.display()
            ))),
        }
    }

    /// Human-readable format name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Urdf => "URDF",
            Self::Sdf => "SDF",
            Self::Mjcf => "MJCF",
            Self::Usd => "USD",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts one document format into the canonical [`Robot`] model.
pub trait Normalizer {
    /// Format handled by this normalizer.
    fn format(&self) -> SourceFormat;

    /// Normalize a document held in memory. `file` is recorded as provenance.
    fn normalize_str(&self, source: &str, file: Option<&Path>) -> Result<Robot>;

    /// Normalize raw document bytes.
    ///
    /// Text formats decode UTF-8 and defer to [`normalize_str`](Self::normalize_str).
    fn normalize_bytes(&self, bytes: &[u8], file: Option<&Path>) -> Result<Robot> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            NormalizeError::format(format!("{} document is not valid UTF-8: {e}", self.format()))
        })?;
        self.normalize_str(text, file)
    }

    /// Read and normalize a file.
    fn parse(&self, path: &Path) -> Result<Robot> {
        if !path.exists() {
            return Err(NormalizeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), format = %self.format(), "normalizing document");
        let robot = self.normalize_bytes(&bytes, Some(path))?;
        tracing::debug!(
            robot = %robot.name,
            links = robot.links.len(),
            joints = robot.joints.len(),
            "normalized document"
        );
        Ok(robot)
    }
}
