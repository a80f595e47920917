//! Machine-readable report.

use robot_diff::DiffResult;

use crate::error::Result;

/// Render the diff as pretty-printed JSON.
///
/// Absent values serialize as `null`, tuples as arrays and records as
/// `{"type": …, "fields": [[name, value], …]}`.
pub fn render_json(diff: &DiffResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(diff)?)
}
