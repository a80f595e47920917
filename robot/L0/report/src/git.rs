//! Report in the style of a unified diff.

use std::collections::BTreeMap;

use robot_diff::{Change, DiffResult, ItemDiff, Status, StatusCounts};

use crate::common::finish;
use crate::palette::Palette;

/// Render the git-style report.
pub fn render_git(diff: &DiffResult, palette: Palette) -> String {
    let mut lines = vec!["@@ Name @@".to_string(), String::new()];
    if diff.name_changed() {
        lines.push(palette.removed(&format!("-name: {}", diff.old_name)));
        lines.push(palette.added(&format!("+name: {}", diff.new_name)));
    }
    lines.push(String::new());

    for (title, kind, items) in [
        ("Links", "Link", &diff.link_diffs),
        ("Joints", "Joint", &diff.joint_diffs),
    ] {
        lines.push(format!(
            "@@ {title} ({}) @@",
            StatusCounts::of(items.values())
        ));
        lines.push(String::new());
        lines.extend(hunk(items, kind, palette));
    }

    finish(&lines)
}

fn hunk(items: &BTreeMap<String, ItemDiff>, kind: &str, palette: Palette) -> Vec<String> {
    let mut lines = Vec::new();
    for item in items.values() {
        match item.status {
            Status::Removed => lines.push(palette.removed(&format!("-{kind} {}", item.name))),
            Status::Added => lines.push(palette.added(&format!("+{kind} {}", item.name))),
            Status::Modified => {
                lines.push(format!(" {kind} {}", item.name));
                for (path, change) in &item.changes {
                    lines.extend(change_lines(path, change, palette));
                }
            }
        }
        lines.push(String::new());
    }
    lines
}

fn change_lines(path: &str, change: &Change, palette: Palette) -> Vec<String> {
    let old = palette.removed(&format!("-  {path}: {}", change.old_value));
    let new = palette.added(&format!("+  {path}: {}", change.new_value));
    match change.status() {
        Status::Added => vec![new],
        Status::Removed => vec![old],
        Status::Modified => vec![old, new],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::sample_diff;

    #[test]
    fn test_git_report() {
        let report = render_git(&sample_diff(), Palette::plain());
        let expected = "\
@@ Name @@

-name: arm
+name: arm_v2

@@ Links (1 removed, 0 added, 1 modified) @@

 Link base
-  collisions: 1
+  collisions: 2
-  collisions[0].origin.xyz: (0.0, 0.0, 0.1)
+  collisions[0].origin.xyz: (0.0, 0.0, 0.2)
-  inertial.mass: 1.5
+  inertial.mass: 2.0

-Link gripper

@@ Joints (0 removed, 1 added, 1 modified) @@

 Joint shoulder
+  limit: Limit

+Joint wrist";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_same_name_has_no_name_lines() {
        let report = render_git(&DiffResult::new("arm", "arm"), Palette::plain());
        assert_eq!(
            report,
            "@@ Name @@\n\n\n@@ Links (0 removed, 0 added, 0 modified) @@\n\n\
             @@ Joints (0 removed, 0 added, 0 modified) @@"
        );
    }

    #[test]
    fn test_colored_lines() {
        let report = render_git(&sample_diff(), Palette::colored());
        assert!(report.contains("\x1b[31m-Link gripper"));
        assert!(report.contains("\x1b[32m+Joint wrist"));
    }
}
