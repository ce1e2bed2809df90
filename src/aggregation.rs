//! # Multi-sample aggregation
//!
//! Sums (or averages) the bins of a run of **bin-compatible** samples and flattens the
//! result into an [`AggregatedBinSet`], the input of the rebinning engine.
//!
//! ## Algorithm
//!
//! For every selected sample, in order:
//!
//! 1. If its bin geometry differs from the previous sample
//!    ([`bins_compatible`](crate::distribution::bin_check::bins_compatible)), the current
//!    accumulation is **collated** and a new one starts.
//! 2. For every bin with `bins != 0`, finite `data` and (optionally) an energy inside the
//!    requested energy range: `weight += 1`, `data_sum += data`.
//!
//! Collating divides `data_sum` by `weight` (mean mode) or keeps the sum (sum mode),
//! flattens the `(E, A1, A2)` arrays in standard (row-major) order, drops zero-weight bins
//! and appends what remains, with its spherical geometry, to the output.
//!
//! A zero-weight bin never reaches the output, so `0/0` is never mistaken for a valid zero.

use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::ElectronVolt;
use crate::distribution::bin_check::bins_compatible;
use crate::distribution::geometry::SphericalGeometry;
use crate::distribution::DistributionSample;
use crate::slice_errors::SliceError;

/// How the values of compatible samples are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Mean over the contributing samples.
    #[default]
    Average,
    /// Straight sum over the contributing samples.
    Sum,
}

/// Flat, weight-normalized list of bins spanning one or more samples.
///
/// All vectors have the same length, one entry per retained bin, appended segment by
/// segment (not spatially ordered). `dr` is a full radial width, `dp`/`dt` are angular
/// half-widths in degrees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedBinSet {
    pub data: Vec<f64>,
    pub rad: Vec<f64>,
    pub phi: Vec<f64>,
    pub theta: Vec<f64>,
    pub dr: Vec<f64>,
    pub dp: Vec<f64>,
    pub dt: Vec<f64>,
}

impl AggregatedBinSet {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Radial extent `[min(rad - dr/2), max(rad + dr/2)]` over bins with finite geometry.
    pub fn radial_range(&self) -> Option<[f64; 2]> {
        self.rad
            .iter()
            .zip(&self.dr)
            .filter(|(r, d)| r.is_finite() && d.is_finite())
            .fold(None, |acc, (r, d)| {
                let (lo, hi) = (r - d / 2.0, r + d / 2.0);
                Some(match acc {
                    None => [lo, hi],
                    Some([a, b]) => [f64::min(a, lo), f64::max(b, hi)],
                })
            })
    }

    /// Append the non-zero-weight bins of one collated segment.
    fn append_segment(&mut self, values: &Array3<f64>, weight: &Array3<f64>, geo: &SphericalGeometry) {
        let kept = weight.iter().enumerate().filter(|(_, w)| **w > 0.0).map(|(i, _)| i);
        // Logical (row-major) iteration order is shared by every array, so flat indices line up.
        let flat = |a: &Array3<f64>| a.iter().copied().collect::<Vec<_>>();
        let (v, r, p, t, dr, dp, dt) = (
            flat(values),
            flat(&geo.rad),
            flat(&geo.phi),
            flat(&geo.theta),
            flat(&geo.dr),
            flat(&geo.dphi),
            flat(&geo.dtheta),
        );
        for i in kept {
            self.data.push(v[i]);
            self.rad.push(r[i]);
            self.phi.push(p[i]);
            self.theta.push(t[i]);
            self.dr.push(dr[i]);
            self.dp.push(dp[i]);
            self.dt.push(dt[i]);
        }
    }
}

/// Running accumulation over one run of compatible samples.
struct Accumulator<'a> {
    template: &'a DistributionSample,
    data_sum: Array3<f64>,
    weight: Array3<f64>,
}

impl<'a> Accumulator<'a> {
    fn new(template: &'a DistributionSample) -> Self {
        Accumulator {
            template,
            data_sum: Array3::zeros(template.shape()),
            weight: Array3::zeros(template.shape()),
        }
    }

    fn add(&mut self, sample: &DistributionSample, erange: Option<[ElectronVolt; 2]>) {
        Zip::from(&mut self.data_sum)
            .and(&mut self.weight)
            .and(sample.data())
            .and(sample.bins())
            .and(sample.energy())
            .for_each(|sum, w, &d, &b, &e| {
                let in_erange = erange.map_or(true, |[lo, hi]| e >= lo && e <= hi);
                if b != 0 && d.is_finite() && in_erange {
                    *sum += d;
                    *w += 1.0;
                }
            });
    }

    fn collate(self, mode: AggregationMode, energy: bool, out: &mut AggregatedBinSet) {
        let values = match mode {
            AggregationMode::Average => {
                let mut v = self.data_sum;
                Zip::from(&mut v).and(&self.weight).for_each(|v, &w| {
                    if w > 0.0 {
                        *v /= w;
                    }
                });
                v
            }
            AggregationMode::Sum => self.data_sum,
        };
        let geo = SphericalGeometry::extract(self.template, energy);
        out.append_segment(&values, &self.weight, &geo);
    }
}

/// Aggregate the selected samples into one flat bin list.
///
/// Arguments
/// -----------------
/// * `samples`: every available distribution.
/// * `indices`: the selected samples, in the order they are accumulated.
/// * `energy`: use energy (instead of velocity) as the radial coordinate.
/// * `mode`: mean or sum across compatible samples.
/// * `erange`: optional inclusive `[min, max]` restriction on bin energies (eV).
///
/// Return
/// ----------
/// * The aggregated bins, or [`SliceError::NoDataInRange`] when no bin survives.
pub fn aggregate(
    samples: &[DistributionSample],
    indices: &[usize],
    energy: bool,
    mode: AggregationMode,
    erange: Option<[ElectronVolt; 2]>,
) -> Result<AggregatedBinSet, SliceError> {
    let mut out = AggregatedBinSet::default();
    let mut current: Option<Accumulator> = None;
    let mut segments = 0usize;

    for sample in indices.iter().filter_map(|&i| samples.get(i)) {
        let compatible = bins_compatible(current.as_ref().map(|acc| acc.template), sample);
        if !compatible {
            if let Some(acc) = current.take() {
                acc.collate(mode, energy, &mut out);
                segments += 1;
            }
        }
        current
            .get_or_insert_with(|| Accumulator::new(sample))
            .add(sample, erange);
    }
    if let Some(acc) = current.take() {
        acc.collate(mode, energy, &mut out);
        segments += 1;
    }

    debug!(
        bins = out.len(),
        segments,
        samples = indices.len(),
        "aggregated distribution samples"
    );

    if out.is_empty() {
        return Err(SliceError::NoDataInRange(
            "no valid bins in the selected samples".into(),
        ));
    }
    Ok(out)
}
