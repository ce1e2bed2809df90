#![allow(dead_code)]

use distslice::constants::PROTON_MASS;
use distslice::distribution::{DistributionSample, SampleArrays};
use nalgebra::{Matrix3, Vector3};
use ndarray::Array3;

/// Sample with a single angular bin covering the whole sphere.
///
/// `energies` are the bin centers; every energy bin holds `value`.
pub fn whole_sphere_sample(start: f64, end: f64, energies: &[f64], value: f64) -> DistributionSample {
    let shape = (energies.len(), 1, 1);
    DistributionSample::new(
        start,
        end,
        SampleArrays {
            energy: Array3::from_shape_fn(shape, |(e, _, _)| energies[e]),
            phi: Array3::zeros(shape),
            theta: Array3::zeros(shape),
            dphi: Array3::from_elem(shape, 180.0),
            dtheta: Array3::from_elem(shape, 90.0),
            data: Array3::from_elem(shape, value),
            bins: Array3::from_elem(shape, 1),
        },
        PROTON_MASS,
        "i",
        "df_km",
    )
    .unwrap()
}

/// Instrument-like sample with `n_e` log-spaced energies and a regular phi/theta grid.
///
/// Data follow `data_fn(e, p, t)`.
pub fn grid_sample(
    start: f64,
    n_e: usize,
    n_phi: usize,
    n_theta: usize,
    data_fn: impl Fn(usize, usize, usize) -> f64,
) -> DistributionSample {
    let shape = (n_e, n_phi, n_theta);
    let dp = 180.0 / n_phi as f64;
    let dt = 90.0 / n_theta as f64;
    DistributionSample::new(
        start,
        start + 3.0,
        SampleArrays {
            energy: Array3::from_shape_fn(shape, |(e, _, _)| 5.0 * 1.5f64.powi(e as i32)),
            phi: Array3::from_shape_fn(shape, |(_, p, _)| dp * (2 * p + 1) as f64),
            theta: Array3::from_shape_fn(shape, |(_, _, t)| -90.0 + dt * (2 * t + 1) as f64),
            dphi: Array3::from_elem(shape, dp),
            dtheta: Array3::from_elem(shape, dt),
            data: Array3::from_shape_fn(shape, |(e, p, t)| data_fn(e, p, t)),
            bins: Array3::from_elem(shape, 1),
        },
        PROTON_MASS,
        "i",
        "df_km",
    )
    .unwrap()
}

/// `M · Mᵀ ≈ I` and `|det M| ≈ 1`.
pub fn assert_orthonormal(m: &Matrix3<f64>, epsilon: f64) {
    let product = m * m.transpose();
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!(
                (product[(i, j)] - expected).abs() < epsilon,
                "M·Mᵀ[{i},{j}] = {} for\n{m}",
                product[(i, j)]
            );
        }
    }
    assert!((m.determinant().abs() - 1.0).abs() < epsilon);
}

pub fn bfield() -> Vector3<f64> {
    Vector3::new(2.0, -1.0, 4.0)
}

pub fn vbulk() -> Vector3<f64> {
    Vector3::new(-350.0, 40.0, 25.0)
}
