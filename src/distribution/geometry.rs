//! # Spherical bin geometry
//!
//! Converts the energy/angle bins of one [`DistributionSample`] into radial and angular
//! centers and widths, the coordinates in which the rebinning engine works.
//!
//! ## Radial coordinate
//!
//! For `E` energy levels the routine first builds `E + 1` **gapless boundaries**:
//!
//! ```text
//! bound[i] = (e[i-1] + e[i]) / 2              for 1 ≤ i ≤ E-1
//! bound[0] = e[0] + (e[0] - bound[1])
//! bound[E] = e[E-1] + (e[E-1] - bound[E-1])
//! ```
//!
//! When the radial coordinate is velocity, each boundary is converted to a relativistic
//! speed
//!
//! ```text
//! v = c · sqrt(1 − 1 / (E / E_rest + 1)²),   E_rest = mass · c²
//! ```
//!
//! and the radial center/width are the midpoint/absolute difference of adjacent boundaries.
//!
//! Extrapolated boundaries may be negative (e.g. strongly increasing energy tables). Such
//! values are **not** special-cased here; in velocity mode they turn into NaN radii which the
//! rebinning engine silently drops.

use ndarray::{Array1, Array3, ArrayView1, Axis, Zip};

use super::DistributionSample;
use crate::constants::{ElectronVolt, KmPerSec, VLIGHT};

/// Radial and angular centers/widths of every bin of a sample, all of shape `(E, A1, A2)`.
///
/// `dr` is a **full** radial width, `dphi`/`dtheta` are angular **half**-widths as carried by
/// the sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalGeometry {
    pub rad: Array3<f64>,
    pub dr: Array3<f64>,
    pub phi: Array3<f64>,
    pub theta: Array3<f64>,
    pub dphi: Array3<f64>,
    pub dtheta: Array3<f64>,
}

impl SphericalGeometry {
    /// Compute the geometry of `sample` with energy (`energy = true`) or velocity as the
    /// radial coordinate.
    pub fn extract(sample: &DistributionSample, energy: bool) -> Self {
        let shape = sample.shape();
        let mut rad = Array3::zeros(shape);
        let mut dr = Array3::zeros(shape);

        Zip::from(rad.lanes_mut(Axis(0)))
            .and(dr.lanes_mut(Axis(0)))
            .and(sample.energy().lanes(Axis(0)))
            .for_each(|mut rad_lane, mut dr_lane, e_lane| {
                let mut bounds = energy_bounds(e_lane);
                if !energy {
                    bounds.mapv_inplace(|b| energy_to_velocity(b, sample.mass()));
                }
                for i in 0..rad_lane.len() {
                    rad_lane[i] = (bounds[i] + bounds[i + 1]) / 2.0;
                    dr_lane[i] = (bounds[i + 1] - bounds[i]).abs();
                }
            });

        SphericalGeometry {
            rad,
            dr,
            phi: sample.phi().clone(),
            theta: sample.theta().clone(),
            dphi: sample.dphi().clone(),
            dtheta: sample.dtheta().clone(),
        }
    }
}

/// Gapless boundaries around a column of energy centers (`E` centers → `E + 1` boundaries).
///
/// The column must hold at least two levels, which [`DistributionSample::new`] guarantees.
pub fn energy_bounds(energies: ArrayView1<ElectronVolt>) -> Array1<ElectronVolt> {
    let n = energies.len();
    let mut bounds = Array1::zeros(n + 1);
    for i in 1..n {
        bounds[i] = (energies[i - 1] + energies[i]) / 2.0;
    }
    bounds[0] = energies[0] + (energies[0] - bounds[1]);
    bounds[n] = energies[n - 1] + (energies[n - 1] - bounds[n - 1]);
    bounds
}

/// Relativistic speed (km/s) of a particle of kinetic energy `energy` (eV) and rest mass
/// `mass` (eV/(km/s)²).
#[inline]
pub fn energy_to_velocity(energy: ElectronVolt, mass: f64) -> KmPerSec {
    let rest_energy = mass * VLIGHT * VLIGHT;
    let gamma = energy / rest_energy + 1.0;
    VLIGHT * (1.0 - 1.0 / (gamma * gamma)).sqrt()
}
