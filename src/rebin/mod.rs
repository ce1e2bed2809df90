//! # Geometric rebinning
//!
//! Maps an [`AggregatedBinSet`] onto a uniform `N × N` grid lying in the slice plane.
//!
//! ## Algorithm
//!
//! 1. The grid spans `[-R, R]` on both axes with `R = max(rad) + max(dr)` over the valid
//!    bins, so every populated radius is inside the grid whatever `N` is.
//! 2. For each grid plane (the slice plane, plus `K` planes swept around the slice x-axis
//!    when angle integration is requested), every grid point is mapped onto the instrument
//!    frame and converted to `(phi, theta, r)`.
//! 3. For every valid, non-zero bin, the grid points inside its box accumulate
//!    `weight += 1` and `value += data`. A point is inside when
//!    - `r ∈ [rad − dr/2, rad + dr/2)`,
//!    - `theta ∈ [theta − dt, theta + dt]` (snapped, see [`snap_angle`]),
//!    - `phi ∈ [lo, hi]` with both bounds wrapped into `[-180, 180)`; when `lo > hi` the
//!      interval crosses the ±180 seam and the test becomes `phi > lo || phi <= hi`.
//! 4. Unreached points get `weight = 1` so the final `value / weight` is `0`, never NaN,
//!    except in angle-sum mode where the raw sum is returned.
//!
//! Bins with non-finite geometry or data, or a non-positive radial width, are dropped
//! silently: they are routine instrument noise, not an error. Bins whose data is exactly
//! zero are skipped as well, so they add no weight to the pixels they cover: a pixel
//! shared by a zero bin and a non-zero bin takes the non-zero value, not their mean.
//!
//! With angle integration, the plane count follows the smallest full angular width of the
//! rebinned bins only (a full-azimuth phi extent does not count), and is capped at
//! [`MAX_ANGLE_PLANES`](crate::constants::MAX_ANGLE_PLANES).
//!
//! Overlapping bins from different samples that reach the same pixel are averaged
//! together regardless of their time separation.
//!
//! The membership test is driven by a [`grid_index::RadialIndex`], so each bin only
//! visits the grid points of its radial shell.

use nalgebra::{DMatrix, Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::AggregatedBinSet;
use crate::constants::Degree;
use crate::conversion::{cart_to_sphere, snap_angle, wrap_phi};
use crate::orientation::quaternion::{angle_sweep, sweep_plane_count};
use crate::orientation::OrientationBasis;
use crate::progress::{fmt_dur, ProgressReporter};
use crate::slice_errors::SliceError;

pub mod grid_index;
pub mod smooth;

use grid_index::RadialIndex;

/// How the planes of an angle integration are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleMode {
    #[default]
    Average,
    Sum,
}

/// Integration over a range of rotation angles around the slice x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleIntegration {
    /// `[min, max]` rotation angles in degrees.
    pub range: [Degree; 2],
    pub mode: AngleMode,
}

/// Numeric output of the rebinning engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RebinOutput {
    /// `data[(i, j)]` is the value at `(xgrid[i], ygrid[j])`.
    pub data: DMatrix<f64>,
    pub xgrid: Vec<f64>,
    pub ygrid: Vec<f64>,
    /// Number of grid planes accumulated (1 without angle integration).
    pub n_planes: usize,
}

/// One bin that passed validation, with its membership box precomputed.
struct BinBox {
    value: f64,
    r_lo: f64,
    r_hi: f64,
    theta_lo: f64,
    theta_hi: f64,
    phi: PhiInterval,
    /// Smallest full angular width (degrees), ignoring a full-azimuth phi extent.
    min_width: Option<Degree>,
}

enum PhiInterval {
    Full,
    Plain(f64, f64),
    Wrapped(f64, f64),
}

impl PhiInterval {
    fn new(center: Degree, half_width: Degree) -> Self {
        if half_width >= 180.0 {
            return PhiInterval::Full;
        }
        let lo = wrap_phi(center - half_width);
        let hi = wrap_phi(center + half_width);
        if lo > hi {
            PhiInterval::Wrapped(lo, hi)
        } else {
            PhiInterval::Plain(lo, hi)
        }
    }

    #[inline]
    fn contains(&self, phi: Degree) -> bool {
        match *self {
            PhiInterval::Full => true,
            PhiInterval::Plain(lo, hi) => phi >= lo && phi <= hi,
            PhiInterval::Wrapped(lo, hi) => phi > lo || phi <= hi,
        }
    }
}

impl BinBox {
    fn from_set(bins: &AggregatedBinSet, k: usize) -> Option<Self> {
        let (value, rad, dr) = (bins.data[k], bins.rad[k], bins.dr[k]);
        let (phi, theta, dp, dt) = (bins.phi[k], bins.theta[k], bins.dp[k], bins.dt[k]);
        let finite = [value, rad, dr, phi, theta, dp, dt].iter().all(|v| v.is_finite());
        if !finite || dr <= 0.0 || value == 0.0 {
            return None;
        }
        let phi_interval = PhiInterval::new(phi, dp);
        let phi_width = match phi_interval {
            PhiInterval::Full => None,
            _ => Some(2.0 * dp),
        };
        let min_width = phi_width
            .into_iter()
            .chain(Some(2.0 * dt))
            .filter(|w| *w > 0.0)
            .reduce(f64::min);
        Some(BinBox {
            value,
            r_lo: rad - dr / 2.0,
            r_hi: rad + dr / 2.0,
            theta_lo: snap_angle(theta - dt),
            theta_hi: snap_angle(theta + dt),
            phi: phi_interval,
            min_width,
        })
    }

    #[inline]
    fn contains_angles(&self, phi: Degree, theta: Degree) -> bool {
        theta >= self.theta_lo && theta <= self.theta_hi && self.phi.contains(phi)
    }
}

/// Grid point coordinates of one plane, in the instrument frame.
struct PlaneCoords {
    phi: Vec<f64>,
    theta: Vec<f64>,
    index: RadialIndex,
}

impl PlaneCoords {
    fn new(grid: &[f64], frame: &Matrix3<f64>) -> Self {
        let n = grid.len();
        let mut phi = Vec::with_capacity(n * n);
        let mut theta = Vec::with_capacity(n * n);
        let mut radii = Vec::with_capacity(n * n);
        // point p = i + n·j sits at (grid[i], grid[j]), matching DMatrix column-major storage
        for &y in grid {
            for &x in grid {
                let (p, t, r) = cart_to_sphere(&(frame * Vector3::new(x, y, 0.0)));
                phi.push(p);
                theta.push(snap_angle(t));
                radii.push(r);
            }
        }
        PlaneCoords {
            phi,
            theta,
            index: RadialIndex::new(&radii),
        }
    }
}

/// Uniform axis of `n` points spanning `[-half_range, half_range]`.
pub fn uniform_axis(half_range: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![0.0; n];
    }
    let step = 2.0 * half_range / (n - 1) as f64;
    (0..n).map(|i| -half_range + step * i as f64).collect()
}

/// Rebin `bins` onto an `resolution × resolution` grid in the plane of `basis`.
///
/// Arguments
/// -----------------
/// * `bins`: aggregated bins (radial coordinate already velocity or energy).
/// * `basis`: composed slice orientation.
/// * `resolution`: number of grid points per axis (≥ 2).
/// * `angle`: optional integration over rotations around the slice x-axis.
///
/// Return
/// ----------
/// * The rebinned grid, or [`SliceError::NoDataInRange`] when no bin has usable geometry.
pub fn rebin(
    bins: &AggregatedBinSet,
    basis: &OrientationBasis,
    resolution: usize,
    angle: Option<&AngleIntegration>,
) -> Result<RebinOutput, SliceError> {
    let boxes: Vec<BinBox> = (0..bins.len())
        .filter_map(|k| BinBox::from_set(bins, k))
        .collect();
    if boxes.is_empty() {
        return Err(SliceError::NoDataInRange(
            "no bin with valid geometry and non-zero data".into(),
        ));
    }

    let valid = |k: &usize| bins.rad[*k].is_finite() && bins.dr[*k].is_finite();
    let max_r = (0..bins.len()).filter(valid).map(|k| bins.rad[k]).fold(f64::MIN, f64::max);
    let max_dr = (0..bins.len()).filter(valid).map(|k| bins.dr[k]).fold(f64::MIN, f64::max);
    let half_range = max_r + max_dr;
    let grid = uniform_axis(half_range, resolution);

    let mut planes = vec![Matrix3::identity()];
    if let Some(angle) = angle {
        let n = sweep_plane_count(angle.range, min_angular_width(&boxes));
        planes.extend(angle_sweep(angle.range, n));
    }

    let n_points = resolution * resolution;
    let mut weight = vec![0.0; n_points];
    let mut value = vec![0.0; n_points];
    let mut progress = ProgressReporter::new("rebinning", (planes.len() * boxes.len()) as u64);

    for plane in &planes {
        let coords = PlaneCoords::new(&grid, &(basis.frame() * plane));
        for bin in &boxes {
            for &p in coords.index.shell(bin.r_lo, bin.r_hi) {
                if bin.contains_angles(coords.phi[p], coords.theta[p]) {
                    weight[p] += 1.0;
                    value[p] += bin.value;
                }
            }
            progress.tick();
        }
    }
    let elapsed = progress.finish();

    let raw_sum = matches!(angle, Some(AngleIntegration { mode: AngleMode::Sum, .. }));
    let out: Vec<f64> = if raw_sum {
        value
    } else {
        value
            .iter()
            .zip(&weight)
            .map(|(v, w)| if *w > 0.0 { v / w } else { *v })
            .collect()
    };

    debug!(
        bins = boxes.len(),
        planes = planes.len(),
        resolution,
        half_range,
        elapsed = %fmt_dur(elapsed),
        "rebinned slice"
    );

    Ok(RebinOutput {
        data: DMatrix::from_vec(resolution, resolution, out),
        xgrid: grid.clone(),
        ygrid: grid,
        n_planes: planes.len(),
    })
}

/// Smallest full angular width (degrees) among the bins that are rebinned.
fn min_angular_width(boxes: &[BinBox]) -> Option<Degree> {
    boxes.iter().filter_map(|b| b.min_width).reduce(f64::min)
}
