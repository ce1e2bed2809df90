//! # Slice orientation
//!
//! Resolves the [`OrientationBasis`] of a slice by composing three stages, in order:
//!
//! 1. **Custom rotation** (optional, [`custom::CustomRotation`]): an arbitrary matrix,
//!    time-averaged when time-varying.
//! 2. **Named physical rotation** ([`presets::RotationPreset`]): a plane defined by two
//!    reference vectors built from the support data, expressed in the custom frame.
//! 3. **In-plane orientation**: the slice normal (z) defaults to the z-axis of the preset
//!    frame; the slice x-axis is the projection of the coordinate axis closest to
//!    perpendicular to the normal, unless explicitly given.
//!
//! Every stage produces a *frame matrix* whose columns are its new axes expressed in the
//! previous frame; the composed frame matrix `C · R · O` therefore holds the slice x, y, z
//! axes in instrument coordinates, and maps a slice-plane point onto the instrument frame.
//!
//! ## Errors
//!
//! * [`SliceError::MissingSupportData`] – a preset or axis override needs an absent vector.
//! * [`SliceError::SingularRotation`] – parallel reference vectors, a slice x-axis parallel
//!   to the normal, or a singular custom matrix.
//!
//! ## See also
//! ------------
//! * [`presets::cal_rot`] – the two-vector rotation primitive.
//! * [`quaternion::angle_sweep`] – extra planes for angle integration.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::slice_errors::SliceError;
use crate::support::{ResolvedSupport, SupportKind};

pub mod custom;
pub mod presets;
pub mod quaternion;

use presets::{unit, RotationPreset};

/// Direction used to override the slice normal or x-axis.
///
/// Directions are expressed in the frame obtained after the custom and named rotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSpec {
    Vector(Vector3<f64>),
    Support(SupportKind),
}

impl AxisSpec {
    fn resolve(&self, support: &ResolvedSupport, rotation: &str) -> Result<Vector3<f64>, SliceError> {
        match self {
            AxisSpec::Vector(v) => Ok(*v),
            AxisSpec::Support(kind) => support.require(*kind, rotation),
        }
    }
}

/// Orthonormal basis of the slice.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationBasis {
    /// Columns are the slice x, y, z axes in instrument coordinates (slice → instrument).
    frame: Matrix3<f64>,
    /// Inverse of `frame` (instrument → slice).
    to_slice: Matrix3<f64>,
    rotation_name: String,
}

impl OrientationBasis {
    /// Basis from a frame matrix.
    ///
    /// Return
    /// ----------
    /// * [`SliceError::SingularRotation`] if `frame` is not invertible.
    pub fn from_frame(frame: Matrix3<f64>, rotation_name: impl Into<String>) -> Result<Self, SliceError> {
        let to_slice = frame.try_inverse().ok_or_else(|| {
            SliceError::SingularRotation("composed slice basis is not invertible".into())
        })?;
        Ok(OrientationBasis {
            frame,
            to_slice,
            rotation_name: rotation_name.into(),
        })
    }

    pub fn frame(&self) -> &Matrix3<f64> {
        &self.frame
    }

    /// Instrument → slice matrix; its rows are the slice axes for an orthonormal basis.
    pub fn to_slice_matrix(&self) -> &Matrix3<f64> {
        &self.to_slice
    }

    pub fn rotation_name(&self) -> &str {
        &self.rotation_name
    }

    /// Express an instrument-frame vector in slice coordinates.
    pub fn to_slice(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.to_slice * v
    }

    /// Map a slice-coordinate point back onto the instrument frame.
    pub fn to_instrument(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.frame * p
    }
}

/// Frame matrix of the final in-plane orientation stage.
///
/// `z` is the slice normal. Without an explicit `x`, the coordinate axis (x, y or z, in
/// that order on ties) closest to perpendicular to `z` is used. `x` is projected onto the
/// plane normal to `z`, then `y = z × x`.
pub fn in_plane_orientation(
    z: &Vector3<f64>,
    x: Option<&Vector3<f64>>,
) -> Result<Matrix3<f64>, SliceError> {
    let z = unit(z).ok_or_else(|| {
        SliceError::SingularRotation("slice normal has zero length".into())
    })?;

    let x = match x {
        Some(x) => *x,
        None => {
            let axes = [Vector3::x(), Vector3::y(), Vector3::z()];
            let mut best = axes[0];
            for axis in &axes[1..] {
                if axis.dot(&z).abs() < best.dot(&z).abs() {
                    best = *axis;
                }
            }
            best
        }
    };

    let x = unit(&(x - z * x.dot(&z))).ok_or_else(|| {
        SliceError::SingularRotation("slice x-axis is parallel to the slice normal".into())
    })?;
    let y = z.cross(&x);

    Ok(Matrix3::from_columns(&[x, y, z]))
}

/// Compose the full slice basis.
///
/// Arguments
/// -----------------
/// * `preset`: named physical rotation.
/// * `custom`: resolved custom matrix (instrument → custom frame), if any.
/// * `slice_x`, `slice_norm`: optional in-plane overrides, in the preset frame.
/// * `support`: time-averaged support vectors in instrument coordinates.
///
/// Return
/// ----------
/// * The composed [`OrientationBasis`], see the module documentation for errors.
pub fn resolve_orientation(
    preset: RotationPreset,
    custom: Option<&Matrix3<f64>>,
    slice_x: Option<&AxisSpec>,
    slice_norm: Option<&AxisSpec>,
    support: &ResolvedSupport,
) -> Result<OrientationBasis, SliceError> {
    let name = match custom {
        Some(_) => format!("custom/{}", preset.name()),
        None => preset.name().to_string(),
    };

    let (custom_frame, custom_support) = match custom {
        Some(m) => {
            let frame = m.try_inverse().ok_or_else(|| {
                SliceError::SingularRotation("custom rotation matrix is singular".into())
            })?;
            (frame, support.transformed(m))
        }
        None => (Matrix3::identity(), *support),
    };

    let preset_frame = preset.frame_matrix(&custom_support)?;
    let preset_support = custom_support.transformed(&preset_frame.transpose());

    let z = match slice_norm {
        Some(spec) => spec.resolve(&preset_support, &name)?,
        None => Vector3::z(),
    };
    let x = slice_x
        .map(|spec| spec.resolve(&preset_support, &name))
        .transpose()?;
    let orient_frame = in_plane_orientation(&z, x.as_ref())?;

    let frame = custom_frame * preset_frame * orient_frame;
    debug!(rotation = %name, ?frame, "resolved slice orientation");
    OrientationBasis::from_frame(frame, name)
}

#[cfg(test)]
mod orientation_test {
    use super::*;
    use crate::orientation::quaternion::{qcompose, qtom};
    use approx::assert_relative_eq;

    fn support() -> ResolvedSupport {
        ResolvedSupport {
            bfield: Some(Vector3::new(1.0, 2.0, -0.5)),
            vbulk: Some(Vector3::new(-300.0, 10.0, 40.0)),
            sundir: Some(Vector3::new(1.0, 0.0, 0.0)),
        }
    }

    #[test]
    fn test_default_orientation_is_identity() {
        let m = in_plane_orientation(&Vector3::z(), None).unwrap();
        assert_eq!(m, Matrix3::identity());
    }

    #[test]
    fn test_in_plane_picks_most_perpendicular_axis() {
        // normal mostly along x: y or z are the candidates, y comes first on ties
        let m = in_plane_orientation(&Vector3::new(1.0, 0.2, 0.2), None).unwrap();
        let x = m.column(0).into_owned();
        assert!(x.y.abs() > 0.9);
        assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_x_parallel_to_normal_is_singular() {
        let err = in_plane_orientation(&Vector3::z(), Some(&Vector3::new(0.0, 0.0, -2.0)));
        assert!(matches!(err, Err(SliceError::SingularRotation(_))));
    }

    #[test]
    fn test_presets_compose_to_orthonormal_basis() {
        for preset in RotationPreset::ALL {
            let basis = resolve_orientation(preset, None, None, None, &support()).unwrap();
            let m = basis.frame();
            assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-12);
            assert_relative_eq!(m.determinant().abs(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(*basis.to_slice_matrix(), m.transpose(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_custom_rotation_is_applied_first() {
        // M maps instrument vectors into the custom frame: a -90° turn about z sends y to x
        let m = qtom(&[qcompose(&Vector3::z(), -std::f64::consts::FRAC_PI_2)])[0];
        let basis =
            resolve_orientation(RotationPreset::Xy, Some(&m), None, None, &support()).unwrap();
        assert_eq!(basis.rotation_name(), "custom/xy");
        // the slice x-axis is the custom x-axis, i.e. instrument +y
        let slice_x = basis.to_instrument(&Vector3::x());
        assert_relative_eq!(slice_x, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(basis.to_slice(&Vector3::y()), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_slice_norm_from_support() {
        let basis = resolve_orientation(
            RotationPreset::Xy,
            None,
            None,
            Some(&AxisSpec::Support(SupportKind::MagneticField)),
            &support(),
        )
        .unwrap();
        let b_hat = support().bfield.unwrap().normalize();
        assert_relative_eq!(basis.to_slice(&b_hat), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_slice_x_from_missing_support() {
        let err = resolve_orientation(
            RotationPreset::Xz,
            None,
            Some(&AxisSpec::Support(SupportKind::SunDirection)),
            None,
            &ResolvedSupport::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SliceError::MissingSupportData {
                rotation: "xz".into(),
                required: "sun direction",
            }
        );
    }
}
