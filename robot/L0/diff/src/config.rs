//! Diff configuration.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use robot_types::{NormalizeError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default relative tolerance for float comparison.
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 1e-6;

/// Physical concern a change belongs to, used to filter diff output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Category {
    /// Link and joint structure: added or removed items and joint changes.
    Kinematic,
    /// Mass properties.
    Inertial,
    /// Collision geometry.
    Collision,
    /// Visual geometry and materials.
    Visual,
}

impl Category {
    /// Every category.
    pub const ALL: [Self; 4] = [Self::Kinematic, Self::Inertial, Self::Collision, Self::Visual];

    /// Lowercase name. Change paths containing it belong to the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kinematic => "kinematic",
            Self::Inertial => "inertial",
            Self::Collision => "collision",
            Self::Visual => "visual",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                NormalizeError::configuration(format!(
                    "unknown category '{s}' (expected kinematic, inertial, collision or visual)"
                ))
            })
    }
}

/// How two robots are compared.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiffConfig {
    /// Relative tolerance: floats `a` and `b` are equal when
    /// `|a - b| <= tolerance * max(|a|, |b|)`.
    pub float_tolerance: f64,
    /// Categories removed from the result.
    pub excluded: BTreeSet<Category>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
            excluded: BTreeSet::new(),
        }
    }
}

impl DiffConfig {
    /// Set the float tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, float_tolerance: f64) -> Self {
        self.float_tolerance = float_tolerance;
        self
    }

    /// Exclude a category.
    #[must_use]
    pub fn exclude(mut self, category: Category) -> Self {
        self.excluded.insert(category);
        self
    }

    /// Exclude several categories.
    #[must_use]
    pub fn exclude_all(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.excluded.extend(categories);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.float_tolerance.is_finite() || self.float_tolerance < 0.0 {
            return Err(NormalizeError::configuration(format!(
                "float tolerance must be a finite non-negative number, got {}",
                self.float_tolerance
            )));
        }
        Ok(())
    }
}
