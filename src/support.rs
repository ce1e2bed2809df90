//! # Support data
//!
//! Auxiliary vector time series used only to orient the slice: the magnetic field, the bulk
//! velocity and the sun direction. Each series is time-averaged over the slice's time range
//! by [`SupportSeries::average`] before the orientation is resolved.
//!
//! ## Averaging rule
//!
//! 1. Arithmetic mean of the finite vectors whose time lies in `[t0, t1]`.
//! 2. If none does, linear interpolation of the finite vectors at the range midpoint
//!    (clamped to the first/last finite point of the series).
//! 3. A series without any finite vector, or a range without a defined midpoint, resolves
//!    to `None`, which orientation stages report as missing support data.

use nalgebra::{Matrix3, SMatrix, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::Seconds;
use crate::slice_errors::SliceError;

/// Time series of 3-vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportSeries {
    times: Vec<Seconds>,
    values: Vec<Vector3<f64>>,
}

impl SupportSeries {
    /// Build a series from matching time and vector lists.
    ///
    /// Return
    /// ----------
    /// * [`SliceError::ShapeMismatch`] if the two lists have different lengths.
    pub fn new(times: Vec<Seconds>, values: Vec<Vector3<f64>>) -> Result<Self, SliceError> {
        if times.len() != values.len() {
            return Err(SliceError::ShapeMismatch(format!(
                "support data has {} times but {} vectors",
                times.len(),
                values.len()
            )));
        }
        Ok(SupportSeries { times, values })
    }

    /// Build a series from a row-major `[n, ncols]` table, as delivered by file readers.
    ///
    /// Only `ncols == 3` is a valid vector layout; anything else (scalars, 4-component
    /// quantities, a non-2-D payload) is rejected with [`SliceError::ShapeMismatch`].
    pub fn from_flat(times: Vec<Seconds>, flat: &[f64], ncols: usize) -> Result<Self, SliceError> {
        if ncols != 3 || flat.len() != times.len() * ncols {
            return Err(SliceError::ShapeMismatch(format!(
                "support data must be [{}, 3], got {} values with {} columns",
                times.len(),
                flat.len(),
                ncols
            )));
        }
        let values = flat.chunks_exact(3).map(Vector3::from_column_slice).collect();
        Self::new(times, values)
    }

    /// Series holding a single constant vector.
    pub fn constant(value: Vector3<f64>) -> Self {
        SupportSeries {
            times: vec![0.0],
            values: vec![value],
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Average the series over `[trange[0], trange[1]]`, see the module documentation.
    pub fn average(&self, trange: [Seconds; 2]) -> Option<Vector3<f64>> {
        time_average(&self.times, &self.values, trange)
    }
}

/// Time-average a series of fixed-size matrices (vectors included) over `trange`.
///
/// Only entries with a finite time and finite components take part. Their arithmetic
/// mean over the inclusive range is returned; when none lies in range, the finite entries
/// are linearly interpolated at the range midpoint, clamped to the ends of the series.
/// `None` when no entry is finite or the midpoint is undefined (e.g. `[-inf, inf]`).
pub(crate) fn time_average<const R: usize, const C: usize>(
    times: &[Seconds],
    values: &[SMatrix<f64, R, C>],
    trange: [Seconds; 2],
) -> Option<SMatrix<f64, R, C>> {
    let finite: Vec<(Seconds, SMatrix<f64, R, C>)> = times
        .iter()
        .zip(values)
        .filter(|(t, v)| t.is_finite() && v.iter().all(|c| c.is_finite()))
        .map(|(t, v)| (*t, *v))
        .collect();

    let (sum, n) = finite
        .iter()
        .filter(|(t, _)| *t >= trange[0] && *t <= trange[1])
        .fold((SMatrix::<f64, R, C>::zeros(), 0usize), |(acc, n), (_, v)| (acc + v, n + 1));

    if n > 0 {
        return Some(sum / n as f64);
    }
    interpolate(&finite, (trange[0] + trange[1]) / 2.0)
}

/// Linear interpolation of time-sorted finite entries at `time`, clamped at both ends.
fn interpolate<const R: usize, const C: usize>(
    entries: &[(Seconds, SMatrix<f64, R, C>)],
    time: Seconds,
) -> Option<SMatrix<f64, R, C>> {
    if time.is_nan() {
        return None;
    }
    let (first, last) = (entries.first()?, entries.last()?);
    if time <= first.0 {
        return Some(first.1);
    }
    if time >= last.0 {
        return Some(last.1);
    }

    // first.0 < time < last.0, so 1 <= i <= len - 1
    let i = entries.partition_point(|(t, _)| *t <= time);
    let ((t0, v0), (t1, v1)) = (entries[i - 1], entries[i]);
    let w = if t1 > t0 { (time - t0) / (t1 - t0) } else { 0.0 };
    Some(v0 * (1.0 - w) + v1 * w)
}

/// Which support quantity an orientation stage refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportKind {
    MagneticField,
    BulkVelocity,
    SunDirection,
}

impl SupportKind {
    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            SupportKind::MagneticField => "magnetic field",
            SupportKind::BulkVelocity => "bulk velocity",
            SupportKind::SunDirection => "sun direction",
        }
    }
}

/// All optional support series available for a slice request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportData {
    pub mag: Option<SupportSeries>,
    pub vel: Option<SupportSeries>,
    pub sun: Option<SupportSeries>,
}

impl SupportData {
    pub fn with_mag(mut self, series: SupportSeries) -> Self {
        self.mag = Some(series);
        self
    }

    pub fn with_vel(mut self, series: SupportSeries) -> Self {
        self.vel = Some(series);
        self
    }

    pub fn with_sun(mut self, series: SupportSeries) -> Self {
        self.sun = Some(series);
        self
    }

    /// Time-average every available series over `trange`.
    pub fn resolve(&self, trange: [Seconds; 2]) -> ResolvedSupport {
        ResolvedSupport {
            bfield: self.mag.as_ref().and_then(|s| s.average(trange)),
            vbulk: self.vel.as_ref().and_then(|s| s.average(trange)),
            sundir: self.sun.as_ref().and_then(|s| s.average(trange)),
        }
    }
}

/// Support vectors averaged over the slice time range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedSupport {
    pub bfield: Option<Vector3<f64>>,
    pub vbulk: Option<Vector3<f64>>,
    pub sundir: Option<Vector3<f64>>,
}

impl ResolvedSupport {
    pub fn get(&self, kind: SupportKind) -> Option<Vector3<f64>> {
        match kind {
            SupportKind::MagneticField => self.bfield,
            SupportKind::BulkVelocity => self.vbulk,
            SupportKind::SunDirection => self.sundir,
        }
    }

    /// The vector of `kind`, or [`SliceError::MissingSupportData`] naming the rotation that
    /// needed it.
    pub fn require(&self, kind: SupportKind, rotation: &str) -> Result<Vector3<f64>, SliceError> {
        self.get(kind).ok_or_else(|| SliceError::MissingSupportData {
            rotation: rotation.to_string(),
            required: kind.label(),
        })
    }

    /// Apply `matrix` to every available vector.
    pub fn transformed(&self, matrix: &Matrix3<f64>) -> Self {
        ResolvedSupport {
            bfield: self.bfield.map(|v| matrix * v),
            vbulk: self.vbulk.map(|v| matrix * v),
            sundir: self.sundir.map(|v| matrix * v),
        }
    }
}

#[cfg(test)]
mod support_test {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> SupportSeries {
        SupportSeries::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 1.0),
                Vector3::new(2.0, 0.0, 1.0),
                Vector3::new(3.0, f64::NAN, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_average_in_range_skips_non_finite() {
        let avg = ramp().average([0.5, 3.0]).unwrap();
        assert_relative_eq!(avg, Vector3::new(1.5, 0.0, 1.0));
    }

    #[test]
    fn test_interpolates_when_range_is_empty() {
        let s = ramp();
        let v = s.average([1.2, 1.4]).unwrap();
        assert_relative_eq!(v, Vector3::new(1.3, 0.0, 1.0), epsilon = 1e-12);

        let before = s.average([-10.0, -5.0]).unwrap();
        assert_relative_eq!(before, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_fill_value_series_resolves_to_none() {
        let fill = SupportSeries::new(vec![0.0, 1.0, 2.0], vec![Vector3::repeat(f64::NAN); 3])
            .unwrap();
        assert_eq!(fill.average([f64::NEG_INFINITY, f64::INFINITY]), None);
        assert_eq!(fill.average([5.0, 6.0]), None);

        let data = SupportData::default().with_mag(fill);
        let resolved = data.resolve([f64::NEG_INFINITY, f64::INFINITY]);
        assert_eq!(
            resolved.require(SupportKind::MagneticField, "bv").unwrap_err(),
            SliceError::MissingSupportData {
                rotation: "bv".into(),
                required: "magnetic field",
            }
        );
    }

    #[test]
    fn test_unbounded_ranges() {
        let s = ramp();
        // every finite entry lies in an infinite range
        let all = s.average([f64::NEG_INFINITY, f64::INFINITY]).unwrap();
        assert_relative_eq!(all, Vector3::new(1.0, 0.0, 1.0));
        // half-open range past the data clamps to the last finite entry
        let after = s.average([10.0, f64::INFINITY]).unwrap();
        assert_relative_eq!(after, Vector3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn test_empty_series_resolves_to_none() {
        let s = SupportSeries::new(vec![], vec![]).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.average([0.0, 1.0]), None);
    }

    #[test]
    fn test_shape_checks() {
        assert!(matches!(
            SupportSeries::new(vec![0.0], vec![]),
            Err(SliceError::ShapeMismatch(_))
        ));
        assert!(matches!(
            SupportSeries::from_flat(vec![0.0, 1.0], &[1.0; 8], 4),
            Err(SliceError::ShapeMismatch(_))
        ));
        let s = SupportSeries::from_flat(vec![0.0, 1.0], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3)
            .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.average([1.0, 1.0]), Some(Vector3::new(4.0, 5.0, 6.0)));
    }

    #[test]
    fn test_require_reports_rotation() {
        let support = ResolvedSupport::default();
        assert_eq!(
            support.require(SupportKind::BulkVelocity, "bv").unwrap_err(),
            SliceError::MissingSupportData {
                rotation: "bv".into(),
                required: "bulk velocity",
            }
        );
    }
}
