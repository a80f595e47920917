//! Diff result types.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Whether something was added, removed or modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Status {
    /// Only in the new robot.
    Added,
    /// Only in the old robot.
    Removed,
    /// In both, with differences.
    Modified,
}

impl Status {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Change {
    /// Value before, [`Value::Absent`] if it was added.
    pub old_value: Value,
    /// Value after, [`Value::Absent`] if it was removed.
    pub new_value: Value,
}

impl Change {
    /// Create a change.
    pub fn new(old_value: Value, new_value: Value) -> Self {
        Self {
            old_value,
            new_value,
        }
    }

    /// Derived status: added when the old value is absent, removed when the
    /// new one is, modified otherwise.
    pub fn status(&self) -> Status {
        if self.old_value.is_absent() {
            Status::Added
        } else if self.new_value.is_absent() {
            Status::Removed
        } else {
            Status::Modified
        }
    }
}

/// Diff of one link or joint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemDiff {
    /// Link or joint name.
    pub name: String,
    /// Item status.
    pub status: Status,
    /// Changes keyed by field path (`origin.xyz`, `collisions[0].geometry`).
    /// Empty for added and removed items.
    pub changes: BTreeMap<String, Change>,
}

impl ItemDiff {
    /// An item present only in the new robot.
    pub fn added(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Added,
            changes: BTreeMap::new(),
        }
    }

    /// An item present only in the old robot.
    pub fn removed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Removed,
            changes: BTreeMap::new(),
        }
    }

    /// An item present in both robots with field changes.
    pub fn modified(name: impl Into<String>, changes: BTreeMap<String, Change>) -> Self {
        Self {
            name: name.into(),
            status: Status::Modified,
            changes,
        }
    }
}

/// Difference between two robots.
///
/// Maps are ordered by name, so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiffResult {
    /// Name of the old robot.
    pub old_name: String,
    /// Name of the new robot.
    pub new_name: String,
    /// Link diffs by link name.
    pub link_diffs: BTreeMap<String, ItemDiff>,
    /// Joint diffs by joint name.
    pub joint_diffs: BTreeMap<String, ItemDiff>,
}

impl DiffResult {
    /// Create an empty diff.
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            link_diffs: BTreeMap::new(),
            joint_diffs: BTreeMap::new(),
        }
    }

    /// True when no link or joint differs. A name change alone does not count.
    pub fn is_empty(&self) -> bool {
        self.link_diffs.is_empty() && self.joint_diffs.is_empty()
    }

    /// Whether the robot names differ.
    pub fn name_changed(&self) -> bool {
        self.old_name != self.new_name
    }

    /// Link diffs, then joint diffs.
    pub fn items(&self) -> impl Iterator<Item = &ItemDiff> {
        self.link_diffs.values().chain(self.joint_diffs.values())
    }
}

/// Number of item diffs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Removed items.
    pub removed: usize,
    /// Added items.
    pub added: usize,
    /// Modified items.
    pub modified: usize,
}

impl StatusCounts {
    /// Count the items of an iterator.
    pub fn of<'a>(items: impl IntoIterator<Item = &'a ItemDiff>) -> Self {
        items.into_iter().fold(Self::default(), |mut counts, item| {
            match item.status {
                Status::Removed => counts.removed += 1,
                Status::Added => counts.added += 1,
                Status::Modified => counts.modified += 1,
            }
            counts
        })
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} removed, {} added, {} modified",
            self.removed, self.added, self.modified
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_change_status() {
        assert_eq!(Change::new(Value::Absent, Value::Float(1.0)).status(), Status::Added);
        assert_eq!(Change::new(Value::Float(1.0), Value::Absent).status(), Status::Removed);
        assert_eq!(
            Change::new(Value::Float(1.0), Value::Float(2.0)).status(),
            Status::Modified
        );
    }

    #[test]
    fn test_counts() {
        let mut diff = DiffResult::new("a", "a");
        diff.link_diffs.insert("x".into(), ItemDiff::added("x"));
        diff.link_diffs.insert("y".into(), ItemDiff::removed("y"));
        diff.joint_diffs.insert("j".into(), ItemDiff::added("j"));

        let counts = StatusCounts::of(diff.items());
        assert_eq!(counts.to_string(), "1 removed, 2 added, 0 modified");
        assert!(!diff.is_empty());
        assert!(!diff.name_changed());
    }
}
