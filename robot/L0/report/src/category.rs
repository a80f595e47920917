//! Report grouped by physical concern.
//!
//! Structural changes (added or removed items, joint edits) come first, then
//! link changes selected by path: `collisions`, `inertial` and `visuals`.

use robot_diff::{DiffResult, Status};

use crate::common::{bullet_lines, finish, with_status, wrap_bars};
use crate::palette::Palette;

/// Render the category report.
pub fn render_category(diff: &DiffResult, palette: Palette) -> String {
    let mut lines = Vec::new();
    if diff.name_changed() {
        lines.extend([
            wrap_bars("NAME"),
            String::new(),
            format!(
                "{} → {}",
                palette.removed(&diff.old_name),
                palette.added(&diff.new_name)
            ),
            String::new(),
        ]);
    }

    lines.extend(kinematic_section(diff, palette));
    lines.extend(link_section(diff, "collisions", "COLLISION", palette));
    lines.extend(link_section(diff, "inertial", "INERTIA", palette));
    lines.extend(link_section(diff, "visuals", "VISUAL", palette));

    finish(&lines)
}

/// Wrap a section body in its header, or nothing when the body is empty.
fn section(title: &str, body: Vec<String>) -> Vec<String> {
    if body.is_empty() {
        return body;
    }
    let mut lines = vec![wrap_bars(title), String::new()];
    lines.extend(body);
    lines
}

fn kinematic_section(diff: &DiffResult, palette: Palette) -> Vec<String> {
    let mut body = Vec::new();

    for status in [Status::Removed, Status::Added] {
        let paint = |name: &str| match status {
            Status::Removed => palette.removed(name),
            _ => palette.added(name),
        };
        let links = with_status(&diff.link_diffs, status);
        let joints = with_status(&diff.joint_diffs, status);
        if links.is_empty() && joints.is_empty() {
            continue;
        }
        body.extend(links.iter().map(|item| format!("Link: {}", paint(&item.name))));
        body.extend(joints.iter().map(|item| format!("Joint: {}", paint(&item.name))));
        body.push(String::new());
    }

    for joint in with_status(&diff.joint_diffs, Status::Modified) {
        body.push(format!("Joint: {}", joint.name));
        body.extend(bullet_lines(&joint.changes, palette));
        body.push(String::new());
    }

    section("KINEMATIC", body)
}

fn link_section(diff: &DiffResult, needle: &str, title: &str, palette: Palette) -> Vec<String> {
    let mut body = Vec::new();
    for link in with_status(&diff.link_diffs, Status::Modified) {
        let changes: Vec<_> = link
            .changes
            .iter()
            .filter(|(path, _)| path.contains(needle))
            .collect();
        if changes.is_empty() {
            continue;
        }
        body.push(format!("Link: {}", link.name));
        body.extend(bullet_lines(changes, palette));
        body.push(String::new());
    }
    section(title, body)
}
