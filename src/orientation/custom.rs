use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{Seconds, DETERMINANT_TOL};
use crate::slice_errors::SliceError;
use crate::support::time_average;

/// Arbitrary rotation applied before the named preset.
///
/// The matrix maps vectors of the native frame into the custom frame (`v' = M · v`).
/// A time-varying rotation is element-wise averaged over the slice time range, with the
/// same fallback as support data (interpolation at the range midpoint when no matrix lies
/// in range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomRotation {
    Fixed(Matrix3<f64>),
    Series {
        times: Vec<Seconds>,
        matrices: Vec<Matrix3<f64>>,
    },
}

impl CustomRotation {
    /// Build a time-varying rotation, checking that times and matrices line up.
    pub fn series(times: Vec<Seconds>, matrices: Vec<Matrix3<f64>>) -> Result<Self, SliceError> {
        if times.len() != matrices.len() || times.is_empty() {
            return Err(SliceError::ShapeMismatch(format!(
                "custom rotation has {} times but {} matrices",
                times.len(),
                matrices.len()
            )));
        }
        Ok(CustomRotation::Series { times, matrices })
    }

    /// The rotation to use for a slice over `trange`.
    ///
    /// An averaged matrix whose determinant is not within [`DETERMINANT_TOL`] of 1 is still
    /// returned, but logged: averaging rotations does not, in general, yield a rotation.
    pub fn resolve(&self, trange: [Seconds; 2]) -> Result<Matrix3<f64>, SliceError> {
        let matrix = match self {
            CustomRotation::Fixed(m) => *m,
            CustomRotation::Series { times, matrices } => time_average(times, matrices, trange)
                .ok_or_else(|| {
                    SliceError::ShapeMismatch(
                        "custom rotation series has no finite matrix for this range".into(),
                    )
                })?,
        };

        let det = matrix.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return Err(SliceError::SingularRotation(
                "custom rotation matrix is singular".into(),
            ));
        }
        if (det - 1.0).abs() > DETERMINANT_TOL {
            warn!(det, "custom rotation is not a proper rotation");
        }
        Ok(matrix)
    }
}
