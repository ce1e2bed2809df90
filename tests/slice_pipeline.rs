mod common;

use approx::assert_relative_eq;
use common::{bfield, grid_sample, vbulk, whole_sphere_sample};
use distslice::aggregation::{aggregate, AggregationMode};
use distslice::orientation::presets::RotationPreset;
use distslice::selection::{select_samples, TimeSelection};
use distslice::support::{SupportData, SupportSeries};
use distslice::{slice2d, SliceError, SliceParams};
use nalgebra::Vector3;

fn round_trip_samples() -> Vec<distslice::distribution::DistributionSample> {
    [10.0, 20.0, 30.0, 40.0]
        .iter()
        .enumerate()
        .map(|(t, value)| whole_sphere_sample(t as f64, t as f64, &[1.0, 2.0], *value))
        .collect()
}

#[test]
fn test_round_trip_average() {
    let samples = round_trip_samples();
    let selection = select_samples(&samples, &TimeSelection::Range { start: 0.0, end: 3.0 }).unwrap();
    assert_eq!(selection.indices, vec![0, 1, 2, 3]);

    let bins = aggregate(&samples, &selection.indices, true, AggregationMode::Average, None).unwrap();
    assert_eq!(bins.len(), 2);
    assert!(bins.data.iter().all(|v| *v == 25.0));
    let mut rad = bins.rad.clone();
    rad.sort_by(f64::total_cmp);
    assert_eq!(rad, vec![1.0, 2.0]);
    assert_eq!(bins.dr, vec![1.0, 1.0]);

    let summed = aggregate(&samples, &selection.indices, true, AggregationMode::Sum, None).unwrap();
    assert!(summed.data.iter().all(|v| *v == 100.0));
}

#[test]
fn test_round_trip_slice() {
    let samples = round_trip_samples();
    let params = SliceParams::builder()
        .time(TimeSelection::Range { start: 0.0, end: 3.0 })
        .energy(true)
        .resolution(61)
        .build()
        .unwrap();
    let grid = slice2d(&samples, &SupportData::default(), &params).unwrap();

    assert_eq!(grid.n_samples, 4);
    assert_eq!(grid.trange, [0.0, 3.0]);
    assert_eq!(grid.rrange, [0.5, 2.5]);
    assert_eq!(grid.drange, Some([25.0, 25.0]));
    assert_relative_eq!(grid.xrange[0], -3.0);
    assert_relative_eq!(grid.xrange[1], 3.0, epsilon = 1e-12);
    assert!(grid.energy);
    assert_eq!(grid.units_name, "df_km");

    for (i, x) in grid.xgrid.iter().enumerate() {
        for (j, y) in grid.ygrid.iter().enumerate() {
            let r = x.hypot(*y);
            let v = grid.data[(i, j)];
            assert!(v.is_finite());
            if r > 0.5 + 1e-9 && r < 2.5 - 1e-9 {
                assert_eq!(v, 25.0, "r = {r}");
            } else if r < 0.5 - 1e-9 || r > 2.5 + 1e-9 {
                assert_eq!(v, 0.0, "r = {r}");
            }
        }
    }
}

#[test]
fn test_slice_is_idempotent() {
    let samples: Vec<_> = (0..3)
        .map(|k| grid_sample(3.0 * k as f64, 8, 16, 8, |e, p, t| (1 + e + p * t + k) as f64))
        .collect();
    let support = SupportData::default()
        .with_mag(SupportSeries::constant(bfield()))
        .with_vel(SupportSeries::constant(vbulk()));
    let params = SliceParams::builder()
        .rotation(RotationPreset::Bv)
        .resolution(40)
        .angle_average([-15.0, 15.0])
        .build()
        .unwrap();

    let first = slice2d(&samples, &support, &params).unwrap();
    let second = slice2d(&samples, &support, &params).unwrap();
    assert_eq!(first, second);
    assert!(first.n_planes > 1);
}

#[test]
fn test_parallel_bv_is_singular() {
    let samples = vec![grid_sample(0.0, 4, 8, 4, |_, _, _| 1.0)];
    let support = SupportData::default()
        .with_mag(SupportSeries::constant(Vector3::new(1.0, 0.0, 0.0)))
        .with_vel(SupportSeries::constant(Vector3::new(2.0, 0.0, 0.0)));
    let params = SliceParams::builder()
        .rotation(RotationPreset::Bv)
        .build()
        .unwrap();

    let err = slice2d(&samples, &support, &params).unwrap_err();
    assert!(matches!(err, SliceError::SingularRotation(_)), "{err}");
}

#[test]
fn test_missing_support_names_requirement() {
    let samples = vec![grid_sample(0.0, 4, 8, 4, |_, _, _| 1.0)];
    let support = SupportData::default().with_mag(SupportSeries::constant(bfield()));
    let params = SliceParams::builder()
        .rotation(RotationPreset::Bv)
        .build()
        .unwrap();

    let err = slice2d(&samples, &support, &params).unwrap_err();
    assert_eq!(
        err,
        SliceError::MissingSupportData {
            rotation: "bv".into(),
            required: "bulk velocity",
        }
    );
    assert_eq!(err.to_string(), "Rotation 'bv' requires bulk velocity data");

    // perp_xy only needs the magnetic field
    let params = SliceParams::builder()
        .rotation(RotationPreset::PerpXy)
        .resolution(20)
        .build()
        .unwrap();
    assert!(slice2d(&samples, &support, &params).is_ok());
}

#[test]
fn test_no_data_outside_time_range() {
    let samples = round_trip_samples();
    let params = SliceParams::builder()
        .time(TimeSelection::Window {
            time: 10.0,
            width: 2.0,
            centered: true,
        })
        .build()
        .unwrap();
    let err = slice2d(&samples, &SupportData::default(), &params).unwrap_err();
    assert!(err.is_no_data());
}

#[test]
fn test_masked_samples_are_no_data() {
    let samples = vec![grid_sample(0.0, 4, 8, 4, |_, _, _| f64::NAN)];
    let err = slice2d(&samples, &SupportData::default(), &SliceParams::default()).unwrap_err();
    assert!(err.is_no_data());
}

#[test]
fn test_range_is_resolution_invariant() {
    let samples = vec![grid_sample(0.0, 6, 8, 4, |e, _, _| (e + 1) as f64)];
    let ranges: Vec<_> = [25, 100, 151]
        .into_iter()
        .map(|n| {
            let params = SliceParams::builder().resolution(n).build().unwrap();
            let grid = slice2d(&samples, &SupportData::default(), &params).unwrap();
            assert_eq!(grid.data.shape(), (n, n));
            (grid.xrange, grid.yrange)
        })
        .collect();

    for (xrange, yrange) in &ranges[1..] {
        assert_relative_eq!(xrange[0], ranges[0].0[0], max_relative = 1e-12);
        assert_relative_eq!(xrange[1], ranges[0].0[1], max_relative = 1e-12);
        assert_relative_eq!(yrange[0], ranges[0].1[0], max_relative = 1e-12);
        assert_relative_eq!(yrange[1], ranges[0].1[1], max_relative = 1e-12);
    }
}

#[test]
fn test_nearest_samples_selection() {
    // midpoints at 1.5, 4.5, 7.5, 10.5
    let samples: Vec<_> = (0..4)
        .map(|k| grid_sample(3.0 * k as f64, 4, 8, 4, |_, _, _| 1.0))
        .collect();
    let params = SliceParams::builder()
        .time(TimeSelection::Nearest {
            time: 4.0,
            samples: 2,
        })
        .resolution(20)
        .build()
        .unwrap();
    let grid = slice2d(&samples, &SupportData::default(), &params).unwrap();
    assert_eq!(grid.n_samples, 2);
    assert_eq!(grid.trange, [0.0, 6.0]);
}

#[test]
fn test_mode_change_concatenates_bins() {
    let a = grid_sample(0.0, 4, 8, 4, |_, _, _| 1.0);
    let b = grid_sample(3.0, 5, 8, 4, |_, _, _| 2.0);
    let bins = aggregate(&[a, b], &[0, 1], false, AggregationMode::Average, None).unwrap();
    assert_eq!(bins.len(), 4 * 8 * 4 + 5 * 8 * 4);
}

#[test]
fn test_bulk_velocity_reported_in_slice_frame() {
    let samples = vec![grid_sample(0.0, 4, 8, 4, |_, _, _| 1.0)];
    let support = SupportData::default()
        .with_mag(SupportSeries::constant(bfield()))
        .with_vel(SupportSeries::constant(vbulk()));
    let params = SliceParams::builder()
        .rotation(RotationPreset::Bv)
        .resolution(20)
        .build()
        .unwrap();
    let grid = slice2d(&samples, &support, &params).unwrap();

    // bv: slice x along B, V in the xy plane
    let v = grid.bulk_velocity.unwrap();
    assert_relative_eq!(v.z, 0.0, epsilon = 1e-9);
    assert_relative_eq!(v.norm(), vbulk().norm(), epsilon = 1e-9);
    assert_relative_eq!(v.x, vbulk().dot(&bfield().normalize()), epsilon = 1e-9);
    assert_eq!(grid.rotation_name, "bv");
}

#[test]
fn test_fill_value_support_is_missing_data() {
    let samples = vec![grid_sample(0.0, 4, 8, 4, |_, _, _| 1.0)];
    let fill = SupportSeries::new(vec![0.0, 1.0, 2.0], vec![Vector3::repeat(f64::NAN); 3]).unwrap();
    let support = SupportData::default()
        .with_mag(fill)
        .with_vel(SupportSeries::constant(vbulk()));
    let params = SliceParams::builder()
        .rotation(RotationPreset::Bv)
        .build()
        .unwrap();

    let err = slice2d(&samples, &support, &params).unwrap_err();
    assert_eq!(
        err,
        SliceError::MissingSupportData {
            rotation: "bv".into(),
            required: "magnetic field",
        }
    );
}
