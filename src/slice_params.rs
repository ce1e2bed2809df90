//! # Slice configuration
//!
//! [`SliceParams`] gathers every option recognized by [`slice2d`](crate::slice::slice2d).
//! It is either taken as-is from [`SliceParams::default()`] or configured through the
//! fluent [`SliceParamsBuilder`], whose `build()` validates the combination.
//!
//! ## Defaults
//!
//! | Option | Default |
//! |---|---|
//! | `time` | every sample ([`TimeSelection::default`]) |
//! | `rotation` | [`RotationPreset::Xy`] |
//! | `custom_rotation` | none |
//! | `resolution` | [`DEFAULT_RESOLUTION`] |
//! | `energy` | `false` (radial axis is velocity, km/s) |
//! | `subtract_bulk` | `false` |
//! | `angle_integration` | none |
//! | `log_scale` | `false` |
//! | `erange` | none |
//! | `aggregation` | [`AggregationMode::Average`] |
//! | `slice_x`, `slice_norm` | none |
//! | `smooth` | none |
//!
//! All types derive `serde` traits so a host can load a configuration from any format.
//!
//! ## See also
//! ------------
//! * [`crate::slice::slice2d`] – consumes these parameters.

use std::cmp::Ordering::{Equal, Less};

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationMode;
use crate::constants::{ElectronVolt, DEFAULT_RESOLUTION};
use crate::orientation::custom::CustomRotation;
use crate::orientation::presets::RotationPreset;
use crate::orientation::AxisSpec;
use crate::rebin::{AngleIntegration, AngleMode};
use crate::selection::TimeSelection;
use crate::slice_errors::SliceError;

/// Configuration of one slice request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceParams {
    // --- Sample selection / aggregation ---
    pub time: TimeSelection,
    pub aggregation: AggregationMode,
    /// Inclusive `[min, max]` energy restriction (eV).
    pub erange: Option<[ElectronVolt; 2]>,

    // --- Orientation ---
    pub rotation: RotationPreset,
    pub custom_rotation: Option<CustomRotation>,
    pub slice_x: Option<AxisSpec>,
    pub slice_norm: Option<AxisSpec>,

    // --- Grid ---
    /// Number of grid points per axis.
    pub resolution: usize,
    /// Radial coordinate is energy (eV) instead of velocity (km/s).
    pub energy: bool,
    /// Shift the axes into the bulk-flow rest frame.
    pub subtract_bulk: bool,
    pub angle_integration: Option<AngleIntegration>,
    /// Gaussian smoothing width in pixels.
    pub smooth: Option<usize>,
    /// Restrict the reported data range to positive values.
    pub log_scale: bool,
}

impl Default for SliceParams {
    fn default() -> Self {
        SliceParams {
            time: TimeSelection::default(),
            aggregation: AggregationMode::Average,
            erange: None,
            rotation: RotationPreset::Xy,
            custom_rotation: None,
            slice_x: None,
            slice_norm: None,
            resolution: DEFAULT_RESOLUTION,
            energy: false,
            subtract_bulk: false,
            angle_integration: None,
            smooth: None,
            log_scale: false,
        }
    }
}

impl SliceParams {
    /// Equivalent to [`SliceParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent builder for custom parameters.
    ///
    /// # Example
    ///
    /// ```rust
    /// use distslice::orientation::presets::RotationPreset;
    /// use distslice::selection::TimeSelection;
    /// use distslice::slice_params::SliceParams;
    ///
    /// let params = SliceParams::builder()
    ///     .time(TimeSelection::Range { start: 0.0, end: 60.0 })
    ///     .rotation(RotationPreset::Bv)
    ///     .resolution(200)
    ///     .angle_sum([-20.0, 20.0])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.resolution, 200);
    /// ```
    pub fn builder() -> SliceParamsBuilder {
        SliceParamsBuilder::new()
    }

    /// Check the parameter combination.
    ///
    /// Return
    /// ----------
    /// * [`SliceError::InvalidSliceParameter`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), SliceError> {
        if self.resolution < 2 {
            return Err(SliceError::InvalidSliceParameter(
                "resolution must be at least 2".into(),
            ));
        }
        if let Some(width) = self.smooth {
            if width < 2 {
                return Err(SliceError::InvalidSliceParameter(
                    "smoothing width must be at least 2 pixels".into(),
                ));
            }
        }
        if let Some([lo, hi]) = self.erange {
            if !le(lo, hi) {
                return Err(SliceError::InvalidSliceParameter(
                    "erange must satisfy min <= max".into(),
                ));
            }
        }
        if let Some(angle) = &self.angle_integration {
            let [lo, hi] = angle.range;
            if !(lo.is_finite() && hi.is_finite()) || !le(lo, hi) {
                return Err(SliceError::InvalidSliceParameter(
                    "angle integration range must be finite with min <= max".into(),
                ));
            }
        }
        match self.time {
            TimeSelection::Range { start, end } if !le(start, end) => {
                return Err(SliceError::InvalidSliceParameter(
                    "time range must satisfy start <= end".into(),
                ));
            }
            TimeSelection::Window { time, width, .. } if !time.is_finite() || !ge0(width) => {
                return Err(SliceError::InvalidSliceParameter(
                    "time window needs a finite time and a non-negative width".into(),
                ));
            }
            TimeSelection::Nearest { time, samples } if !time.is_finite() || samples == 0 => {
                return Err(SliceError::InvalidSliceParameter(
                    "nearest-sample selection needs a finite time and at least one sample".into(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Return true iff x >= 0.0 and comparable (i.e., not NaN).
#[inline]
fn ge0(x: f64) -> bool {
    x >= 0.0
}

/// Return true iff a <= b and comparable (i.e., not NaN).
#[inline]
fn le(a: f64, b: f64) -> bool {
    matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
}

/// Fluent builder for [`SliceParams`].
#[derive(Debug, Clone, Default)]
pub struct SliceParamsBuilder {
    params: SliceParams,
}

impl SliceParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: SliceParams::default(),
        }
    }

    // --- Sample selection / aggregation ---
    pub fn time(mut self, v: TimeSelection) -> Self {
        self.params.time = v;
        self
    }
    pub fn aggregation(mut self, v: AggregationMode) -> Self {
        self.params.aggregation = v;
        self
    }
    pub fn erange(mut self, v: [ElectronVolt; 2]) -> Self {
        self.params.erange = Some(v);
        self
    }

    // --- Orientation ---
    pub fn rotation(mut self, v: RotationPreset) -> Self {
        self.params.rotation = v;
        self
    }
    pub fn custom_rotation(mut self, v: CustomRotation) -> Self {
        self.params.custom_rotation = Some(v);
        self
    }
    pub fn slice_x(mut self, v: AxisSpec) -> Self {
        self.params.slice_x = Some(v);
        self
    }
    pub fn slice_norm(mut self, v: AxisSpec) -> Self {
        self.params.slice_norm = Some(v);
        self
    }

    // --- Grid ---
    pub fn resolution(mut self, v: usize) -> Self {
        self.params.resolution = v;
        self
    }
    pub fn energy(mut self, v: bool) -> Self {
        self.params.energy = v;
        self
    }
    pub fn subtract_bulk(mut self, v: bool) -> Self {
        self.params.subtract_bulk = v;
        self
    }
    pub fn angle_average(mut self, range: [f64; 2]) -> Self {
        self.params.angle_integration = Some(AngleIntegration {
            range,
            mode: AngleMode::Average,
        });
        self
    }
    pub fn angle_sum(mut self, range: [f64; 2]) -> Self {
        self.params.angle_integration = Some(AngleIntegration {
            range,
            mode: AngleMode::Sum,
        });
        self
    }
    pub fn smooth(mut self, width: usize) -> Self {
        self.params.smooth = Some(width);
        self
    }
    pub fn log_scale(mut self, v: bool) -> Self {
        self.params.log_scale = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `resolution ≥ 2`, `smooth ≥ 2` when set.
    /// * `erange`, angle range and explicit time range satisfy `min ≤ max`.
    /// * Window width is non-negative, nearest-sample count is at least 1.
    ///
    /// Return
    /// ----------
    /// * The validated [`SliceParams`] or [`SliceError::InvalidSliceParameter`].
    pub fn build(self) -> Result<SliceParams, SliceError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod slice_params_test {
    use super::*;
    use crate::support::SupportKind;

    #[test]
    fn test_defaults() {
        let p = SliceParams::default();
        assert_eq!(p.resolution, DEFAULT_RESOLUTION);
        assert_eq!(p.rotation, RotationPreset::Xy);
        assert!(!p.energy && !p.subtract_bulk && !p.log_scale);
        assert!(p.validate().is_ok());
        assert_eq!(SliceParams::builder().build().unwrap(), p);
    }

    #[test]
    fn test_builder_sets_fields() {
        let p = SliceParams::builder()
            .rotation(RotationPreset::PerpXy)
            .resolution(64)
            .energy(true)
            .erange([10.0, 1000.0])
            .angle_average([-30.0, 30.0])
            .slice_norm(AxisSpec::Support(SupportKind::MagneticField))
            .smooth(3)
            .aggregation(AggregationMode::Sum)
            .build()
            .unwrap();
        assert_eq!(p.resolution, 64);
        assert_eq!(p.erange, Some([10.0, 1000.0]));
        assert_eq!(
            p.angle_integration,
            Some(AngleIntegration {
                range: [-30.0, 30.0],
                mode: AngleMode::Average
            })
        );
        assert_eq!(p.smooth, Some(3));
        assert_eq!(p.aggregation, AggregationMode::Sum);
    }

    #[test]
    fn test_invalid_parameters() {
        let invalid = [
            SliceParams::builder().resolution(1).build(),
            SliceParams::builder().smooth(1).build(),
            SliceParams::builder().erange([5.0, 1.0]).build(),
            SliceParams::builder().erange([f64::NAN, 1.0]).build(),
            SliceParams::builder().angle_sum([10.0, -10.0]).build(),
            SliceParams::builder()
                .time(TimeSelection::Range { start: 3.0, end: 1.0 })
                .build(),
            SliceParams::builder()
                .time(TimeSelection::Window {
                    time: 0.0,
                    width: -1.0,
                    centered: true,
                })
                .build(),
            SliceParams::builder()
                .time(TimeSelection::Nearest {
                    time: 0.0,
                    samples: 0,
                })
                .build(),
        ];
        for result in invalid {
            assert!(matches!(result, Err(SliceError::InvalidSliceParameter(_))));
        }
    }
}
