//! # Particle distribution samples
//!
//! A [`DistributionSample`] is one timestamped 3-D histogram produced by an instrument:
//! counts (or flux) indexed by `[energy, angle1, angle2]`, together with the per-bin
//! energy and angle centers and angular half-widths.
//!
//! All per-bin arrays share the same `(E, A1, A2)` shape. This is checked **once**, in
//! [`DistributionSample::new`], so the rest of the pipeline can index the arrays without
//! re-validating them.
//!
//! ## Conventions
//!
//! - `energy` in eV, `mass` in eV/(km/s)² (see [`crate::constants`]).
//! - `phi` (azimuth) and `theta` (elevation) in degrees; `dphi` and `dtheta` are the
//!   **half-widths** of each bin in degrees.
//! - `bins` is the validity mask: a zero entry marks a cell that must never contribute
//!   to an aggregation.
//!
//! ## See also
//! ------------
//! * [`bin_check::bins_compatible`] – decides whether two samples can be summed elementwise.
//! * [`geometry::SphericalGeometry::extract`] – radial/angular centers and widths of a sample.

use ndarray::Array3;

use crate::constants::{ElectronVolt, Seconds};
use crate::slice_errors::SliceError;

pub mod bin_check;
pub mod geometry;

/// Per-bin arrays of one instrument histogram, all of shape `(E, A1, A2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleArrays {
    pub energy: Array3<ElectronVolt>,
    pub phi: Array3<f64>,
    pub theta: Array3<f64>,
    pub dphi: Array3<f64>,
    pub dtheta: Array3<f64>,
    pub data: Array3<f64>,
    pub bins: Array3<u8>,
}

/// One timestamped 3-D velocity-space histogram.
///
/// Instances are immutable once built; use [`DistributionSample::new`] to construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSample {
    start_time: Seconds,
    end_time: Seconds,
    arrays: SampleArrays,
    mass: f64,
    species: String,
    units_name: String,
}

impl DistributionSample {
    /// Build a sample after checking its array-shape invariants.
    ///
    /// Arguments
    /// -----------------
    /// * `start_time`, `end_time`: accumulation interval of the histogram (seconds).
    /// * `arrays`: the per-bin arrays, all of identical shape `(E, A1, A2)`.
    /// * `mass`: particle rest mass in eV/(km/s)².
    /// * `species`: free-form species tag (e.g. `"i"`, `"e"`, `"hplus"`).
    /// * `units_name`: name of the units of `data` (e.g. `"df_km"`, `"eflux"`).
    ///
    /// Return
    /// ----------
    /// * The validated sample, or [`SliceError::InvalidSample`] when:
    ///   - any array's shape differs from `energy`'s,
    ///   - fewer than two energy levels or zero angular bins are present,
    ///   - `mass` is not finite and strictly positive,
    ///   - the time interval is not finite or `end_time < start_time`.
    pub fn new(
        start_time: Seconds,
        end_time: Seconds,
        arrays: SampleArrays,
        mass: f64,
        species: impl Into<String>,
        units_name: impl Into<String>,
    ) -> Result<Self, SliceError> {
        let shape = arrays.energy.dim();
        let shapes = [
            ("phi", arrays.phi.dim()),
            ("theta", arrays.theta.dim()),
            ("dphi", arrays.dphi.dim()),
            ("dtheta", arrays.dtheta.dim()),
            ("data", arrays.data.dim()),
            ("bins", arrays.bins.dim()),
        ];
        if let Some((name, dim)) = shapes.iter().find(|(_, dim)| *dim != shape) {
            return Err(SliceError::InvalidSample(format!(
                "'{name}' has shape {dim:?}, expected {shape:?}"
            )));
        }
        if shape.0 < 2 {
            return Err(SliceError::InvalidSample(format!(
                "at least two energy levels are required, got {}",
                shape.0
            )));
        }
        if shape.1 == 0 || shape.2 == 0 {
            return Err(SliceError::InvalidSample(
                "sample has no angular bins".into(),
            ));
        }
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SliceError::InvalidSample(format!(
                "mass must be finite and positive, got {mass}"
            )));
        }
        if !(start_time.is_finite() && end_time.is_finite()) || end_time < start_time {
            return Err(SliceError::InvalidSample(format!(
                "invalid time interval [{start_time}, {end_time}]"
            )));
        }

        Ok(DistributionSample {
            start_time,
            end_time,
            arrays,
            mass,
            species: species.into(),
            units_name: units_name.into(),
        })
    }

    pub fn start_time(&self) -> Seconds {
        self.start_time
    }

    pub fn end_time(&self) -> Seconds {
        self.end_time
    }

    /// Center of the accumulation interval, used for time selection.
    pub fn mid_time(&self) -> Seconds {
        (self.start_time + self.end_time) / 2.0
    }

    /// `(E, A1, A2)` shape shared by every per-bin array.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.arrays.energy.dim()
    }

    pub fn energy(&self) -> &Array3<ElectronVolt> {
        &self.arrays.energy
    }

    pub fn phi(&self) -> &Array3<f64> {
        &self.arrays.phi
    }

    pub fn theta(&self) -> &Array3<f64> {
        &self.arrays.theta
    }

    pub fn dphi(&self) -> &Array3<f64> {
        &self.arrays.dphi
    }

    pub fn dtheta(&self) -> &Array3<f64> {
        &self.arrays.dtheta
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.arrays.data
    }

    pub fn bins(&self) -> &Array3<u8> {
        &self.arrays.bins
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn units_name(&self) -> &str {
        &self.units_name
    }
}
