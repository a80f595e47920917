//! Pieces shared by the text formatters.

use std::collections::BTreeMap;

use robot_diff::{Change, ItemDiff, Status, Value, format_float};

use crate::palette::Palette;

/// Section header, `━━━ TITLE ━━━`.
pub(crate) fn wrap_bars(title: &str) -> String {
    format!("━━━ {title} ━━━")
}

/// Items of one status, in name order.
pub(crate) fn with_status(items: &BTreeMap<String, ItemDiff>, status: Status) -> Vec<&ItemDiff> {
    items.values().filter(|item| item.status == status).collect()
}

/// Old and new tuples with only the differing elements coloured.
///
/// Tuples of different length are coloured as a whole.
fn tuples_with_diff(old: &[f64], new: &[f64], palette: Palette) -> (String, String) {
    if old.len() != new.len() {
        return (
            palette.removed(&Value::Tuple(old.to_vec()).to_string()),
            palette.added(&Value::Tuple(new.to_vec()).to_string()),
        );
    }

    let (old_parts, new_parts): (Vec<_>, Vec<_>) = old
        .iter()
        .zip(new)
        .map(|(&a, &b)| {
            let (a_text, b_text) = (format_float(a), format_float(b));
            if a == b {
                (a_text, b_text)
            } else {
                (palette.removed(&a_text), palette.added(&b_text))
            }
        })
        .unzip();
    (
        format!("({})", old_parts.join(", ")),
        format!("({})", new_parts.join(", ")),
    )
}

/// One change as `old → new`, or `added` / `removed` when a side is absent.
pub(crate) fn format_change(change: &Change, palette: Palette) -> String {
    match change.status() {
        Status::Added => return palette.added("added"),
        Status::Removed => return palette.removed("removed"),
        Status::Modified => {}
    }

    if let (Some(old), Some(new)) = (change.old_value.as_tuple(), change.new_value.as_tuple()) {
        let (old, new) = tuples_with_diff(old, new, palette);
        return format!("{old} → {new}");
    }

    format!(
        "{} → {}",
        palette.removed(&change.old_value.to_string()),
        palette.added(&change.new_value.to_string())
    )
}

/// Changes as bullet lines, `  • path: old → new`.
pub(crate) fn bullet_lines<'a>(
    changes: impl IntoIterator<Item = (&'a String, &'a Change)>,
    palette: Palette,
) -> Vec<String> {
    changes
        .into_iter()
        .map(|(path, change)| format!("  • {path}: {}", format_change(change, palette)))
        .collect()
}

/// Join lines and drop trailing blank space.
pub(crate) fn finish(lines: &[String]) -> String {
    lines.join("\n").trim_end().to_string()
}
