//! # Sample selection over a time window
//!
//! Decides which [`DistributionSample`]s contribute to a slice. A sample is selected when
//! the **midpoint** of its accumulation interval, `(start + end) / 2`, lies in the
//! (inclusive) time range derived from a [`TimeSelection`]:
//!
//! - [`TimeSelection::Range`] – an explicit `[t0, t1]`,
//! - [`TimeSelection::Window`] – a target time plus a window, either centered on the time
//!   or extending forward from it,
//! - [`TimeSelection::Nearest`] – the `N` samples whose midpoints are closest to a target
//!   time; the range becomes `[min(start), max(end)]` over those samples.
//!
//! An empty selection is reported as `None`: the caller turns it into a "no data"
//! condition, never into a fatal error.

use hifitime::Epoch;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::constants::Seconds;
use crate::distribution::DistributionSample;

/// How the aggregation interval of a slice is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSelection {
    /// Explicit `[start, end]` range.
    Range { start: Seconds, end: Seconds },
    /// `width` seconds of data around `time` (centered) or starting at `time`.
    Window {
        time: Seconds,
        width: Seconds,
        centered: bool,
    },
    /// The `samples` distributions closest to `time`.
    Nearest { time: Seconds, samples: usize },
}

impl TimeSelection {
    /// Explicit range from two absolute epochs, converted to UNIX seconds.
    pub fn from_epochs(start: Epoch, end: Epoch) -> Self {
        TimeSelection::Range {
            start: start.to_unix_seconds(),
            end: end.to_unix_seconds(),
        }
    }

    /// Centered window around an absolute epoch.
    pub fn centered_on(time: Epoch, width: Seconds) -> Self {
        TimeSelection::Window {
            time: time.to_unix_seconds(),
            width,
            centered: true,
        }
    }
}

impl Default for TimeSelection {
    fn default() -> Self {
        TimeSelection::Range {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }
}

/// Result of a successful selection: sample indices (in input order) and the time range.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSelection {
    pub indices: Vec<usize>,
    pub trange: [Seconds; 2],
}

/// Select the samples contributing to a slice.
///
/// Arguments
/// -----------------
/// * `samples`: all available distributions, in time order.
/// * `selection`: how the time range is derived.
///
/// Return
/// ----------
/// * `Some(SampleSelection)` with at least one index, or `None` when no sample midpoint
///   falls inside the computed range (or the input is empty / `N = 0`).
pub fn select_samples(
    samples: &[DistributionSample],
    selection: &TimeSelection,
) -> Option<SampleSelection> {
    let trange = match *selection {
        TimeSelection::Range { start, end } => [start.min(end), start.max(end)],
        TimeSelection::Window {
            time,
            width,
            centered,
        } => {
            if centered {
                [time - width / 2.0, time + width / 2.0]
            } else {
                [time, time + width]
            }
        }
        TimeSelection::Nearest { time, samples: n } => nearest_range(samples, time, n)?,
    };

    let indices = samples
        .iter()
        .positions(|s| {
            let mid = s.mid_time();
            mid >= trange[0] && mid <= trange[1]
        })
        .collect_vec();

    if indices.is_empty() {
        None
    } else {
        Some(SampleSelection { indices, trange })
    }
}

/// `[min(start), max(end)]` over the `n` samples whose midpoints are closest to `time`.
fn nearest_range(samples: &[DistributionSample], time: Seconds, n: usize) -> Option<[Seconds; 2]> {
    if n == 0 {
        return None;
    }

    let nearest = samples
        .iter()
        .sorted_by(|a, b| {
            (a.mid_time() - time)
                .abs()
                .total_cmp(&(b.mid_time() - time).abs())
        })
        .take(n)
        .collect_vec();

    let start = nearest.iter().map(|s| s.start_time()).reduce(f64::min)?;
    let end = nearest.iter().map(|s| s.end_time()).reduce(f64::max)?;
    Some([start, end])
}
