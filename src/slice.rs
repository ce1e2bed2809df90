//! # Two-dimensional distribution slices
//!
//! [`slice2d`] is the single entry point of the crate. It runs the full pipeline as one
//! blocking, side-effect free call:
//!
//! 1. **Selection** – [`select_samples`] keeps the samples whose midpoint lies in the
//!    requested time range.
//! 2. **Aggregation** – [`aggregate`] averages (or sums) bin-compatible runs of samples and
//!    flattens them into an [`AggregatedBinSet`](crate::aggregation::AggregatedBinSet).
//! 3. **Orientation** – support vectors and the optional custom rotation are averaged over
//!    the slice time range, then [`resolve_orientation`] composes the slice basis.
//! 4. **Rebinning** – [`rebin`] maps the bins onto an `N × N` grid, optionally integrating
//!    over rotations around the slice x-axis.
//! 5. **Post-processing** – optional Gaussian smoothing, optional shift of the axes into
//!    the bulk-flow rest frame, and the output metadata.
//!
//! Every buffer is owned by the call, so independent requests may run on separate threads.
//!
//! ## Errors
//!
//! Any [`SliceError`] raised by a stage propagates unchanged; [`SliceError::is_no_data`]
//! separates the "nothing to plot" outcome from real failures.

use nalgebra::{DMatrix, Vector3};
use tracing::{debug, warn};

use crate::aggregation::aggregate;
use crate::constants::Seconds;
use crate::distribution::DistributionSample;
use crate::orientation::{resolve_orientation, OrientationBasis};
use crate::rebin::rebin;
use crate::rebin::smooth::gaussian_smooth;
use crate::selection::select_samples;
use crate::slice_errors::SliceError;
use crate::slice_params::SliceParams;
use crate::support::{SupportData, SupportKind};

/// Rebinned slice plus the metadata a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceGrid {
    /// `data[(i, j)]` is the value at `(xgrid[i], ygrid[j])`.
    pub data: DMatrix<f64>,
    pub xgrid: Vec<f64>,
    pub ygrid: Vec<f64>,
    pub xrange: [f64; 2],
    pub yrange: [f64; 2],
    /// Radial extent `[min(rad − dr/2), max(rad + dr/2)]` of the aggregated bins.
    pub rrange: [f64; 2],
    /// Min/max of the finite non-zero values (positive only in log scale).
    pub drange: Option<[f64; 2]>,
    pub rotation_name: String,
    pub trange: [Seconds; 2],
    pub n_samples: usize,
    pub units_name: String,
    pub species: String,
    /// Radial axis is energy (eV) rather than velocity (km/s).
    pub energy: bool,
    pub log_scale: bool,
    pub basis: OrientationBasis,
    /// Bulk velocity in slice coordinates, when velocity data was available.
    pub bulk_velocity: Option<Vector3<f64>>,
    /// Number of grid planes accumulated.
    pub n_planes: usize,
}

impl SliceGrid {
    pub fn resolution(&self) -> usize {
        self.xgrid.len()
    }
}

/// Produce a two-dimensional slice through a series of distributions.
///
/// Arguments
/// -----------------
/// * `samples`: the distributions, in time order.
/// * `support`: magnetic field, bulk velocity and sun direction series (all optional).
/// * `params`: slice configuration, see [`SliceParams`].
///
/// Return
/// ----------
/// * The [`SliceGrid`], or:
///   - [`SliceError::NoDataInRange`] when no sample or bin survives selection,
///   - [`SliceError::MissingSupportData`] when the orientation or `subtract_bulk` needs an
///     absent support vector,
///   - [`SliceError::SingularRotation`] for degenerate reference vectors,
///   - [`SliceError::InvalidSliceParameter`] for an inconsistent configuration.
///
/// See also
/// ------------
/// * [`crate::rebin::rebin`] – membership rules of the rebinning step.
pub fn slice2d(
    samples: &[DistributionSample],
    support: &SupportData,
    params: &SliceParams,
) -> Result<SliceGrid, SliceError> {
    params.validate()?;

    let selection = select_samples(samples, &params.time).ok_or_else(|| {
        SliceError::NoDataInRange(format!("no distribution in time selection {:?}", params.time))
    })?;
    let trange = selection.trange;

    let bins = aggregate(
        samples,
        &selection.indices,
        params.energy,
        params.aggregation,
        params.erange,
    )?;

    let resolved = support.resolve(trange);
    let custom = params
        .custom_rotation
        .as_ref()
        .map(|c| c.resolve(trange))
        .transpose()?;
    let basis = resolve_orientation(
        params.rotation,
        custom.as_ref(),
        params.slice_x.as_ref(),
        params.slice_norm.as_ref(),
        &resolved,
    )?;

    let rebinned = rebin(
        &bins,
        &basis,
        params.resolution,
        params.angle_integration.as_ref(),
    )?;

    let data = match params.smooth {
        Some(width) => gaussian_smooth(&rebinned.data, width),
        None => rebinned.data,
    };

    let bulk_velocity = resolved.vbulk.map(|v| basis.to_slice(&v));
    let (mut xgrid, mut ygrid) = (rebinned.xgrid, rebinned.ygrid);
    if params.subtract_bulk {
        if params.energy {
            warn!("subtract_bulk has no meaning for energy slices, ignored");
        } else {
            let v = bulk_velocity.ok_or(SliceError::MissingSupportData {
                rotation: "subtract_bulk".into(),
                required: SupportKind::BulkVelocity.label(),
            })?;
            xgrid.iter_mut().for_each(|x| *x -= v.x);
            ygrid.iter_mut().for_each(|y| *y -= v.y);
        }
    }

    let (units_name, species) = selection
        .indices
        .first()
        .and_then(|&i| samples.get(i))
        .map(|s| (s.units_name().to_string(), s.species().to_string()))
        .unwrap_or_default();
    let grid = SliceGrid {
        xrange: axis_range(&xgrid),
        yrange: axis_range(&ygrid),
        rrange: bins.radial_range().unwrap_or([0.0, 0.0]),
        drange: data_range(&data, params.log_scale),
        data,
        xgrid,
        ygrid,
        rotation_name: basis.rotation_name().to_string(),
        trange,
        n_samples: selection.indices.len(),
        units_name,
        species,
        energy: params.energy,
        log_scale: params.log_scale,
        basis,
        bulk_velocity,
        n_planes: rebinned.n_planes,
    };

    debug!(
        rotation = %grid.rotation_name,
        n_samples = grid.n_samples,
        bins = bins.len(),
        resolution = grid.resolution(),
        "slice complete"
    );
    Ok(grid)
}

fn axis_range(axis: &[f64]) -> [f64; 2] {
    match (axis.first(), axis.last()) {
        (Some(lo), Some(hi)) => [*lo, *hi],
        _ => [0.0, 0.0],
    }
}

/// Min/max of the finite non-zero values of `data` (positive values only in log scale).
fn data_range(data: &DMatrix<f64>, log_scale: bool) -> Option<[f64; 2]> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite() && *v != 0.0 && (!log_scale || *v > 0.0))
        .fold(None, |acc, v| match acc {
            None => Some([v, v]),
            Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
        })
}
