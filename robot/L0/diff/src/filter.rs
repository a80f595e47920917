//! Category filtering, applied to a finished diff.
//!
//! Change paths carry their category in their text: `inertial.mass`,
//! `collisions[0].origin`, `visuals[1].material.rgba`. Kinematic changes have
//! no path of their own; excluding them drops every joint diff and every
//! added or removed link.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Category;
use crate::result::{DiffResult, ItemDiff, Status};

/// Whether a change path belongs to any of the categories.
pub fn path_in_categories(path: &str, categories: &BTreeSet<Category>) -> bool {
    categories.iter().any(|c| path.contains(c.as_str()))
}

/// Remove the excluded categories from a diff.
///
/// Modified links keep only the changes outside the excluded categories and
/// disappear when none are left.
pub fn filter_categories(diff: &DiffResult, excluded: &BTreeSet<Category>) -> DiffResult {
    let kinematic = excluded.contains(&Category::Kinematic);

    let mut filtered = DiffResult::new(&diff.old_name, &diff.new_name);
    for (name, item) in &diff.link_diffs {
        if item.status == Status::Modified {
            let changes: BTreeMap<_, _> = item
                .changes
                .iter()
                .filter(|(path, _)| !path_in_categories(path, excluded))
                .map(|(path, change)| (path.clone(), change.clone()))
                .collect();
            if !changes.is_empty() {
                filtered
                    .link_diffs
                    .insert(name.clone(), ItemDiff::modified(&item.name, changes));
            }
        } else if !kinematic {
            filtered.link_diffs.insert(name.clone(), item.clone());
        }
    }
    if !kinematic {
        filtered.joint_diffs.clone_from(&diff.joint_diffs);
    }
    filtered
}
