//! Error taxonomy shared by every normalizer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while turning a robot description into a [`Robot`](crate::Robot).
///
/// Every failure is fatal for the document being read; no partial robot is
/// ever returned.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Input path does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// Document is malformed (unparsable markup, bad numbers, wrong vector arity).
    #[error("format error{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Format {
        /// Description of the problem.
        message: String,
        /// Line number, when known.
        line: Option<usize>,
    },

    /// Document violates the format's grammar.
    #[error("document failed validation:\n  {}", messages.join("\n  "))]
    Validation {
        /// Every violation found, in document order.
        messages: Vec<String>,
    },

    /// Document is well-formed and valid but structurally inconsistent.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// Caller asked for something the tool cannot do (unsupported extension, bad tolerance).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    /// Create a format error without a line number.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            line: None,
        }
    }

    /// Create a format error pointing at a line.
    pub fn format_at(message: impl Into<String>, line: usize) -> Self {
        Self::Format {
            message: message.into(),
            line: Some(line),
        }
    }

    /// Create a semantic error.
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic(message.into())
    }

    /// Create a duplicate-name error for the given kind of entity.
    pub fn duplicate(kind: &str, name: &str) -> Self {
        Self::Semantic(format!("duplicate {kind} name: '{name}'"))
    }

    /// Create an error for a joint that references an undeclared link.
    pub fn undefined_link(link_name: &str, joint_name: &str) -> Self {
        Self::Semantic(format!(
            "joint '{joint_name}' references undefined link '{link_name}'"
        ))
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short category name, used by the command line front-end.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "file-not-found",
            Self::Format { .. } => "format",
            Self::Validation { .. } => "validation",
            Self::Semantic(_) => "semantic",
            Self::Configuration(_) => "configuration",
            Self::Io(_) => "io",
        }
    }
}

/// Result type for normalization.
pub type Result<T> = std::result::Result<T, NormalizeError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = NormalizeError::format_at("unclosed tag", 12);
        assert_eq!(err.to_string(), "format error at line 12: unclosed tag");

        let err = NormalizeError::format("bad number");
        assert_eq!(err.to_string(), "format error: bad number");
    }

    #[test]
    fn test_validation_lists_every_message() {
        let err = NormalizeError::Validation {
            messages: vec!["line 3: a".into(), "line 7: b".into()],
        };
        let text = err.to_string();
        assert!(text.contains("line 3: a"));
        assert!(text.contains("line 7: b"));
    }

    #[test]
    fn test_duplicate() {
        let err = NormalizeError::duplicate("link", "base");
        assert!(matches!(err, NormalizeError::Semantic(_)));
        assert!(err.to_string().contains("duplicate link name: 'base'"));
    }

    #[test]
    fn test_undefined_link() {
        let err = NormalizeError::undefined_link("ghost", "j1");
        assert!(err.to_string().contains("ghost"));
        assert!(err.to_string().contains("j1"));
        assert_eq!(err.kind(), "semantic");
    }
}
