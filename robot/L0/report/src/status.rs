//! Report grouped by item status: removed, added, then modified.

use robot_diff::{DiffResult, Status, StatusCounts};

use crate::common::{bullet_lines, finish, with_status, wrap_bars};
use crate::palette::Palette;

const SUMMARY_RULE: &str = "═════════════════════════════════════════════";

/// Render the status report.
pub fn render_status(diff: &DiffResult, palette: Palette) -> String {
    let mut lines = vec![wrap_bars("NAME"), String::new()];
    if diff.name_changed() {
        lines.push(format!(
            "{} → {}",
            palette.removed(&diff.old_name),
            palette.added(&diff.new_name)
        ));
    } else {
        lines.push(format!("{} → {}", diff.old_name, diff.new_name));
    }
    lines.push(String::new());

    lines.push(SUMMARY_RULE.to_string());
    lines.push(format!("SUMMARY: {}", StatusCounts::of(diff.items())));
    lines.push(SUMMARY_RULE.to_string());
    lines.push(String::new());

    lines.extend(simple_section(diff, Status::Removed, "REMOVED", palette));
    lines.extend(simple_section(diff, Status::Added, "ADDED", palette));
    lines.extend(modified_section(diff, palette));

    finish(&lines)
}

fn simple_section(diff: &DiffResult, status: Status, title: &str, palette: Palette) -> Vec<String> {
    let links = with_status(&diff.link_diffs, status);
    let joints = with_status(&diff.joint_diffs, status);
    if links.is_empty() && joints.is_empty() {
        return Vec::new();
    }

    let paint = |name: &str| match status {
        Status::Removed => palette.removed(name),
        _ => palette.added(name),
    };

    let mut lines = vec![wrap_bars(title), String::new()];
    lines.extend(links.iter().map(|item| format!("Link: {}", paint(&item.name))));
    lines.extend(joints.iter().map(|item| format!("Joint: {}", paint(&item.name))));
    lines.push(String::new());
    lines
}

fn modified_section(diff: &DiffResult, palette: Palette) -> Vec<String> {
    let links = with_status(&diff.link_diffs, Status::Modified);
    let joints = with_status(&diff.joint_diffs, Status::Modified);
    if links.is_empty() && joints.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![wrap_bars("MODIFIED"), String::new()];
    for (kind, items) in [("Link", links), ("Joint", joints)] {
        for item in items {
            lines.push(format!("{kind}: {}", item.name));
            lines.extend(bullet_lines(&item.changes, palette));
            lines.push(String::new());
        }
    }
    lines
}
