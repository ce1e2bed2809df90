//! Cartesian ↔ spherical conversions in the instrument angle convention.
//!
//! * `phi` is the azimuth measured in the x-y plane from +x towards +y, in `[-180, 180]` degrees.
//! * `theta` is the elevation above the x-y plane, in `[-90, 90]` degrees.
//!
//! Both the aggregated bins and the rotated grid points go through these helpers so that
//! their angles are directly comparable.

use nalgebra::Vector3;

use crate::constants::{Degree, ANGLE_SNAP_TOL, DEGRAD, RADEG};

/// Convert a Cartesian vector into `(phi, theta, r)`.
///
/// The elevation is computed with `atan2(z, ρ)` so the origin maps to `(0, 0, 0)`
/// instead of a NaN elevation.
#[inline]
pub fn cart_to_sphere(v: &Vector3<f64>) -> (Degree, Degree, f64) {
    let rho = v.x.hypot(v.y);
    let r = rho.hypot(v.z);
    let phi = v.y.atan2(v.x) * DEGRAD;
    let theta = v.z.atan2(rho) * DEGRAD;
    (phi, theta, r)
}

/// Convert `(phi, theta, r)` back into a Cartesian vector.
#[inline]
pub fn sphere_to_cart(phi: Degree, theta: Degree, r: f64) -> Vector3<f64> {
    let (sp, cp) = (phi * RADEG).sin_cos();
    let (st, ct) = (theta * RADEG).sin_cos();
    Vector3::new(r * ct * cp, r * ct * sp, r * st)
}

/// Wrap an azimuth into `[-180, 180)`.
#[inline]
pub fn wrap_phi(phi: Degree) -> Degree {
    (phi + 180.0).rem_euclid(360.0) - 180.0
}

/// Snap an angle onto the nearest integer when it lies within [`ANGLE_SNAP_TOL`] of it.
///
/// Absorbs rounding noise at the poles and in the zero-elevation plane.
#[inline]
pub fn snap_angle(angle: Degree) -> Degree {
    let nearest = angle.round();
    if (angle - nearest).abs() < ANGLE_SNAP_TOL {
        nearest
    } else {
        angle
    }
}
