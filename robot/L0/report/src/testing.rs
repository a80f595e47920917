//! Shared fixture for the formatter tests.

use std::collections::BTreeMap;

use robot_diff::{Change, DiffResult, Diffable, ItemDiff, Value};
use robot_types::Limit;

/// Name change, a removed link, an added joint, a modified link and a
/// modified joint.
pub(crate) fn sample_diff() -> DiffResult {
    let mut diff = DiffResult::new("arm", "arm_v2");

    let base: BTreeMap<_, _> = [
        ("collisions", Change::new(Value::Count(1), Value::Count(2))),
        (
            "collisions[0].origin.xyz",
            Change::new(
                Value::Tuple(vec![0.0, 0.0, 0.1]),
                Value::Tuple(vec![0.0, 0.0, 0.2]),
            ),
        ),
        (
            "inertial.mass",
            Change::new(Value::Float(1.5), Value::Float(2.0)),
        ),
    ]
    .into_iter()
    .map(|(path, change)| (path.to_string(), change))
    .collect();
    diff.link_diffs
        .insert("base".into(), ItemDiff::modified("base", base));
    diff.link_diffs
        .insert("gripper".into(), ItemDiff::removed("gripper"));

    let shoulder: BTreeMap<_, _> = [(
        "limit".to_string(),
        Change::new(Value::Absent, Limit::range(-1.0, 1.0).to_value()),
    )]
    .into_iter()
    .collect();
    diff.joint_diffs
        .insert("shoulder".into(), ItemDiff::modified("shoulder", shoulder));
    diff.joint_diffs
        .insert("wrist".into(), ItemDiff::added("wrist"));

    diff
}
