//! Local transforms composed from `xformOpOrder`.
//!
//! USD writes ops in the order they apply to a row vector from the outside
//! in. With column vectors that is the plain product of the ops in listed
//! order: `translate, orient, scale` composes to `T * R * S`.

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};
use robot_types::rotation::{matrix_to_quat, quat_from_wxyz};
use robot_types::{NormalizeError, Pose, Result};

use crate::stage::Prim;

const INVERT_PREFIX: &str = "!invert!";
const RESET_STACK: &str = "!resetXformStack!";

/// Compose the local transform of a prim. A prim without `xformOpOrder`
/// has the identity transform.
///
/// # Errors
///
/// Semantic error when an op listed in `xformOpOrder` has no value, is of an
/// unknown kind, or is a singular `!invert!` op.
pub fn local_transform(prim: &Prim) -> Result<Matrix4<f64>> {
    let Some(order) = prim.attr_tokens("xformOpOrder")? else {
        return Ok(Matrix4::identity());
    };

    let mut transform = Matrix4::identity();
    for entry in order {
        if entry == RESET_STACK {
            continue;
        }
        let (name, invert) = match entry.strip_prefix(INVERT_PREFIX) {
            Some(name) => (name, true),
            None => (entry, false),
        };
        let mut op = op_matrix(prim, name)?;
        if invert {
            op = op.try_inverse().ok_or_else(|| {
                NormalizeError::semantic(format!("cannot invert singular {name} on {}", prim.path))
            })?;
        }
        transform *= op;
    }
    Ok(transform)
}

/// Local transform of a prim as a pose. Scale is dropped.
pub fn local_pose(prim: &Prim) -> Result<Pose> {
    Ok(matrix_to_pose(&local_transform(prim)?))
}

/// Split a rigid transform (possibly with scale) into translation and a
/// canonical rotation.
pub fn matrix_to_pose(m: &Matrix4<f64>) -> Pose {
    let xyz = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let mut rotation: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
    for mut column in rotation.column_iter_mut() {
        let norm = column.norm();
        if norm > f64::EPSILON {
            column /= norm;
        }
    }
    Pose::new(xyz, matrix_to_quat(&rotation))
}

fn op_matrix(prim: &Prim, name: &str) -> Result<Matrix4<f64>> {
    let missing = || {
        NormalizeError::semantic(format!("{name} is listed in xformOpOrder of {} but has no value", prim.path))
    };
    // xformOp:<kind>[:<suffix>]
    let kind = name
        .strip_prefix("xformOp:")
        .map(|rest| rest.split(':').next().unwrap_or(rest))
        .ok_or_else(|| NormalizeError::semantic(format!("'{name}' is not an xform op on {}", prim.path)))?;

    let matrix = match kind {
        "translate" => {
            let t = prim.attr_vec3(name)?.ok_or_else(missing)?;
            Matrix4::new_translation(&t)
        }
        "scale" => {
            let s = prim.attr_vec3(name)?.ok_or_else(missing)?;
            Matrix4::new_nonuniform_scaling(&s)
        }
        "orient" => {
            let q = prim.attr_quat(name)?.ok_or_else(missing)?;
            quat_from_wxyz(q)?.to_homogeneous()
        }
        "rotateX" | "rotateY" | "rotateZ" => {
            let degrees = prim.attr_f64(name)?.ok_or_else(missing)?;
            let axis = kind.chars().last().unwrap_or('X');
            axis_rotation(axis, degrees).to_homogeneous()
        }
        "transform" => prim.attr_matrix4(name)?.ok_or_else(missing)?.transpose(),
        rotate if is_three_axis_rotate(rotate) => {
            let degrees = prim.attr_vec3(name)?.ok_or_else(missing)?;
            // angles are always written (x, y, z); the suffix gives application order
            let rotation = rotate["rotate".len()..]
                .chars()
                .map(|axis| axis_rotation(axis, degrees[axis_index(axis)]))
                .fold(Rotation3::identity(), |acc, r| r * acc);
            rotation.to_homogeneous()
        }
        other => {
            return Err(NormalizeError::semantic(format!(
                "unsupported xform op '{other}' on {}",
                prim.path
            )));
        }
    };
    Ok(matrix)
}

fn is_three_axis_rotate(kind: &str) -> bool {
    matches!(kind, "rotateXYZ" | "rotateXZY" | "rotateYXZ" | "rotateYZX" | "rotateZXY" | "rotateZYX")
}

fn axis_index(axis: char) -> usize {
    match axis {
        'X' => 0,
        'Y' => 1,
        _ => 2,
    }
}

fn axis_rotation(axis: char, degrees: f64) -> Rotation3<f64> {
    let unit = match axis {
        'X' => Vector3::x_axis(),
        'Y' => Vector3::y_axis(),
        _ => Vector3::z_axis(),
    };
    Rotation3::from_axis_angle(&unit, degrees.to_radians())
}
