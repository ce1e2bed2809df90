//! Quaternion helpers used to sweep the slice plane for angle integration.
//!
//! Quaternions are stored as nalgebra [`Quaternion`]s `(w, i, j, k)`; [`qcompose`] builds
//! the rotation quaternion of an axis and angle, [`qtom`] turns a list of them into 3×3
//! rotation matrices.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use tracing::warn;

use crate::constants::{Degree, Radian, MAX_ANGLE_PLANES, MIN_ANGLE_PLANES, RADEG};

/// Quaternion of a rotation by `angle` around `axis` (right-handed).
///
/// `q = [cos(angle/2), sin(angle/2) · axis/|axis|]`. A zero axis yields the identity.
pub fn qcompose(axis: &Vector3<f64>, angle: Radian) -> Quaternion<f64> {
    let (s, c) = (angle / 2.0).sin_cos();
    match axis.try_normalize(0.0) {
        Some(n) => Quaternion::new(c, s * n.x, s * n.y, s * n.z),
        None => Quaternion::identity(),
    }
}

/// Rotation matrices of a list of quaternions (normalized first).
pub fn qtom(quaternions: &[Quaternion<f64>]) -> Vec<Matrix3<f64>> {
    quaternions
        .iter()
        .map(|q| {
            UnitQuaternion::from_quaternion(*q)
                .to_rotation_matrix()
                .into_inner()
        })
        .collect()
}

/// Number of sweep planes for an angle-integration range.
///
/// `max(2, ceil((max − min) / min_width))`, where `min_width` is the smallest full angular
/// width (degrees) of the rebinned bins, so that consecutive planes are never further
/// apart than one bin. The count never exceeds [`MAX_ANGLE_PLANES`].
pub fn sweep_plane_count(range: [Degree; 2], min_width: Option<Degree>) -> usize {
    let span = (range[1] - range[0]).abs();
    let wanted = match min_width {
        Some(w) if w.is_finite() && w > 0.0 && span.is_finite() => (span / w).ceil(),
        _ => return MIN_ANGLE_PLANES,
    };
    if wanted > MAX_ANGLE_PLANES as f64 {
        warn!(wanted, max = MAX_ANGLE_PLANES, "angle integration plane count capped");
        return MAX_ANGLE_PLANES;
    }
    (wanted as usize).max(MIN_ANGLE_PLANES)
}

/// Rotations about the slice x-axis at `n_planes` evenly spaced angles spanning `range`
/// (both endpoints included).
pub fn angle_sweep(range: [Degree; 2], n_planes: usize) -> Vec<Matrix3<f64>> {
    let (lo, hi) = (range[0].min(range[1]), range[0].max(range[1]));
    let step = if n_planes > 1 {
        (hi - lo) / (n_planes - 1) as f64
    } else {
        0.0
    };
    let quaternions: Vec<_> = (0..n_planes)
        .map(|k| qcompose(&Vector3::x(), (lo + step * k as f64) * RADEG))
        .collect();
    qtom(&quaternions)
}
