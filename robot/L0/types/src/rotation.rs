//! Rotation conversion and canonicalization.
//!
//! Every rotation that enters the model (roll-pitch-yaw triples, direct
//! quaternions, rotation matrices from scene-graph transforms) passes through
//! [`canonical_quat`], so two equivalent rotations written differently end up
//! as the same `(w, x, y, z)` tuple.

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3, Vector4};

use crate::error::{NormalizeError, Result};

/// Decimal places kept in canonical quaternions.
pub const QUAT_PRECISION: i32 = 6;

/// Identity quaternion in `(w, x, y, z)` order.
#[must_use]
pub fn identity_quat() -> Vector4<f64> {
    Vector4::new(1.0, 0.0, 0.0, 0.0)
}

/// Convert a `(w, x, y, z)` vector to a `UnitQuaternion`.
///
/// Fails on a zero-norm quaternion, which has no rotation meaning.
pub fn quat_from_wxyz(q: Vector4<f64>) -> Result<UnitQuaternion<f64>> {
    let raw = Quaternion::new(q[0], q[1], q[2], q[3]);
    if !raw.norm().is_finite() || raw.norm() < 1e-12 {
        return Err(NormalizeError::format(format!(
            "quaternion ({}, {}, {}, {}) cannot be normalized",
            q[0], q[1], q[2], q[3]
        )));
    }
    Ok(UnitQuaternion::from_quaternion(raw))
}

/// Convert a `UnitQuaternion` back to `(w, x, y, z)` order.
#[must_use]
pub fn quat_to_wxyz(q: &UnitQuaternion<f64>) -> Vector4<f64> {
    let qi = q.into_inner();
    Vector4::new(qi.w, qi.i, qi.j, qi.k)
}

/// Fixed-axis roll-pitch-yaw (radians) to quaternion: `Rz(yaw) * Ry(pitch) * Rx(roll)`.
#[must_use]
pub fn rpy_to_unit_quat(rpy: Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z)
}

/// Roll-pitch-yaw (radians) to a canonical `(w, x, y, z)` quaternion.
#[must_use]
pub fn rpy_to_quat(rpy: Vector3<f64>) -> Vector4<f64> {
    canonical_unit(&rpy_to_unit_quat(rpy))
}

/// Rotation matrix to a canonical quaternion. The matrix is re-orthonormalized
/// first, so slightly skewed input from text files is accepted.
#[must_use]
pub fn matrix_to_quat(m: &Matrix3<f64>) -> Vector4<f64> {
    // the iterative fit stalls on half turns when started from the identity,
    // so seed it with the closed-form conversion
    let seed = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*m));
    let seed = UnitQuaternion::from_quaternion(seed.into_inner());
    let rotation = Rotation3::from_matrix_eps(m, 1e-12, 100, seed.to_rotation_matrix());
    canonical_unit(&UnitQuaternion::from_rotation_matrix(&rotation))
}

/// Canonicalize an arbitrary `(w, x, y, z)` quaternion.
///
/// Normalizes, flips the sign of every component when `w < 0`, and rounds to
/// [`QUAT_PRECISION`] decimal places.
pub fn canonical_quat(q: Vector4<f64>) -> Result<Vector4<f64>> {
    Ok(canonical_unit(&quat_from_wxyz(q)?))
}

/// Canonicalize a unit quaternion.
#[must_use]
pub fn canonical_unit(q: &UnitQuaternion<f64>) -> Vector4<f64> {
    let mut v = quat_to_wxyz(q);
    if v[0] < 0.0 {
        v = -v;
    }
    v.map(|c| round_to(c, QUAT_PRECISION))
}

/// Round to a number of decimal places. Negative zero comes back as zero.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}
