//! # Named physical rotations
//!
//! Every preset is defined by a pair of reference vectors fed into the shared [`cal_rot`]
//! primitive. The first vector becomes the slice x-axis, the second one lies in the slice
//! x-y plane.
//!
//! | Preset | x-axis | x-y plane contains | Needs |
//! |---|---|---|---|
//! | `xy` | x | y | – |
//! | `xz` | x | z | – |
//! | `yz` | y | z | – |
//! | `bv` | B | V | B, V |
//! | `be` | B | B×V | B, V |
//! | `xvel` | x | V | V |
//! | `perp` | (B×V)×B (V⊥B) | B×V | B, V |
//! | `perp1-perp2` | E×B | B×(E×B) | B, V |
//! | `perp_xy` | x projected ⊥ B | y projected ⊥ B | B |
//! | `perp_xz` | x projected ⊥ B | z projected ⊥ B | B |
//! | `perp_yz` | y projected ⊥ B | z projected ⊥ B | B |
//! | `b_exb` | B | E×B | B, V |
//!
//! with the convective electric field `E = −V×B`.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::PARALLEL_EPS;
use crate::slice_errors::SliceError;
use crate::support::{ResolvedSupport, SupportKind};

/// Named physical-frame rotation applied after the optional custom rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationPreset {
    #[default]
    #[serde(rename = "xy")]
    Xy,
    #[serde(rename = "xz")]
    Xz,
    #[serde(rename = "yz")]
    Yz,
    #[serde(rename = "bv")]
    Bv,
    #[serde(rename = "be")]
    Be,
    #[serde(rename = "xvel")]
    Xvel,
    #[serde(rename = "perp")]
    Perp,
    #[serde(rename = "perp1-perp2")]
    Perp1Perp2,
    #[serde(rename = "perp_xy")]
    PerpXy,
    #[serde(rename = "perp_xz")]
    PerpXz,
    #[serde(rename = "perp_yz")]
    PerpYz,
    #[serde(rename = "b_exb")]
    BExb,
}

impl RotationPreset {
    pub const ALL: [RotationPreset; 12] = [
        RotationPreset::Xy,
        RotationPreset::Xz,
        RotationPreset::Yz,
        RotationPreset::Bv,
        RotationPreset::Be,
        RotationPreset::Xvel,
        RotationPreset::Perp,
        RotationPreset::Perp1Perp2,
        RotationPreset::PerpXy,
        RotationPreset::PerpXz,
        RotationPreset::PerpYz,
        RotationPreset::BExb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RotationPreset::Xy => "xy",
            RotationPreset::Xz => "xz",
            RotationPreset::Yz => "yz",
            RotationPreset::Bv => "bv",
            RotationPreset::Be => "be",
            RotationPreset::Xvel => "xvel",
            RotationPreset::Perp => "perp",
            RotationPreset::Perp1Perp2 => "perp1-perp2",
            RotationPreset::PerpXy => "perp_xy",
            RotationPreset::PerpXz => "perp_xz",
            RotationPreset::PerpYz => "perp_yz",
            RotationPreset::BExb => "b_exb",
        }
    }

    /// Support vectors this preset cannot be built without.
    pub fn required_support(&self) -> &'static [SupportKind] {
        use SupportKind::*;
        match self {
            RotationPreset::Xy | RotationPreset::Xz | RotationPreset::Yz => &[],
            RotationPreset::Xvel => &[BulkVelocity],
            RotationPreset::PerpXy | RotationPreset::PerpXz | RotationPreset::PerpYz => {
                &[MagneticField]
            }
            RotationPreset::Bv
            | RotationPreset::Be
            | RotationPreset::Perp
            | RotationPreset::Perp1Perp2
            | RotationPreset::BExb => &[MagneticField, BulkVelocity],
        }
    }

    /// Frame matrix of the preset: its columns are the new x, y, z axes expressed in the
    /// frame of `support`.
    ///
    /// Return
    /// ----------
    /// * [`SliceError::MissingSupportData`] when a required support vector is absent.
    /// * [`SliceError::SingularRotation`] when the reference vectors are parallel,
    ///   antiparallel or degenerate.
    pub fn frame_matrix(&self, support: &ResolvedSupport) -> Result<Matrix3<f64>, SliceError> {
        let name = self.name();
        let b = || support.require(SupportKind::MagneticField, name);
        let v = || support.require(SupportKind::BulkVelocity, name);
        let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
        let perp_b = |axis: Vector3<f64>, b: &Vector3<f64>| b.cross(&axis).cross(b);
        let e_cross_b = |b: &Vector3<f64>, v: &Vector3<f64>| (-v.cross(b)).cross(b);

        let (v1, v2) = match self {
            RotationPreset::Xy => return Ok(Matrix3::identity()),
            RotationPreset::Xz => (x, z),
            RotationPreset::Yz => (y, z),
            RotationPreset::Bv => (b()?, v()?),
            RotationPreset::Be => {
                let (b, v) = (b()?, v()?);
                (b, b.cross(&v))
            }
            RotationPreset::Xvel => (x, v()?),
            RotationPreset::Perp => {
                let (b, v) = (b()?, v()?);
                (b.cross(&v).cross(&b), b.cross(&v))
            }
            RotationPreset::Perp1Perp2 => {
                let (b, v) = (b()?, v()?);
                let exb = e_cross_b(&b, &v);
                (exb, b.cross(&exb))
            }
            RotationPreset::PerpXy => {
                let b = b()?;
                (perp_b(x, &b), perp_b(y, &b))
            }
            RotationPreset::PerpXz => {
                let b = b()?;
                (perp_b(x, &b), perp_b(z, &b))
            }
            RotationPreset::PerpYz => {
                let b = b()?;
                (perp_b(y, &b), perp_b(z, &b))
            }
            RotationPreset::BExb => {
                let (b, v) = (b()?, v()?);
                (b, e_cross_b(&b, &v))
            }
        };

        cal_rot(&v1, &v2).map_err(|err| match err {
            SliceError::SingularRotation(msg) => {
                SliceError::SingularRotation(format!("rotation '{name}': {msg}"))
            }
            other => other,
        })
    }
}

impl fmt::Display for RotationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RotationPreset {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RotationPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| SliceError::InvalidSliceParameter(format!("unknown rotation '{s}'")))
    }
}

/// Unit vector along `v`, or `None` for a zero-length or non-finite vector.
#[inline]
pub(crate) fn unit(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    (norm.is_finite() && norm > PARALLEL_EPS).then(|| v / norm)
}

/// Rotation defined by two reference vectors.
///
/// Builds `a = v1/|v1|`, `d = v2/|v2|`, `c = unit(a × d)`, `b = unit(−(a × c))`, assembles
/// `[a; b; c]` as rows and inverts it. The returned matrix therefore has `a`, `b`, `c` as
/// **columns**: it maps slice coordinates onto the input frame, and its inverse
/// (transpose) maps input vectors into slice coordinates.
///
/// Return
/// ----------
/// * [`SliceError::SingularRotation`] if either vector has zero length or the two are
///   parallel/antiparallel, in which case the plane they span is undefined.
pub fn cal_rot(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Result<Matrix3<f64>, SliceError> {
    let singular = |what: &str| SliceError::SingularRotation(what.to_string());

    let a = unit(v1).ok_or_else(|| singular("first reference vector has zero length"))?;
    let d = unit(v2).ok_or_else(|| singular("second reference vector has zero length"))?;
    let c = unit(&a.cross(&d)).ok_or_else(|| singular("reference vectors are parallel"))?;
    let b = unit(&-a.cross(&c)).ok_or_else(|| singular("degenerate in-plane axis"))?;

    let rows = Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]);
    rows.try_inverse()
        .ok_or_else(|| singular("basis matrix is not invertible"))
}
