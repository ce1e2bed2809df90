//! Wall-clock progress reporting for long rebinning loops.
//!
//! [`ProgressReporter`] is ticked once per unit of work. At most every
//! [`PROGRESS_INTERVAL_SECS`](crate::constants::PROGRESS_INTERVAL_SECS) seconds it emits an
//! `info!` event with the completed percentage and the elapsed time. With the `progress`
//! feature it also drives an `indicatif` progress bar.
//!
//! Reporting has no effect on results: it only reads the loop counter.

use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::constants::PROGRESS_INTERVAL_SECS;

pub struct ProgressReporter {
    label: &'static str,
    total: u64,
    done: u64,
    start: Instant,
    last_report: Instant,
    interval: Duration,
    #[cfg(feature = "progress")]
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(label: &'static str, total: u64) -> Self {
        let now = Instant::now();

        #[cfg(feature = "progress")]
        let bar = {
            let pb = ProgressBar::new(total.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{msg} {bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | ETA {eta_precise}",
            ) {
                pb.set_style(style);
            }
            pb.set_message(label);
            pb
        };

        ProgressReporter {
            label,
            total,
            done: 0,
            start: now,
            last_report: now,
            interval: Duration::from_secs(PROGRESS_INTERVAL_SECS),
            #[cfg(feature = "progress")]
            bar,
        }
    }

    #[inline]
    pub fn tick(&mut self) {
        self.done += 1;

        #[cfg(feature = "progress")]
        self.bar.inc(1);

        let now = Instant::now();
        if now.duration_since(self.last_report) >= self.interval {
            self.last_report = now;
            info!(
                "{}: {:.1}% complete, elapsed {}",
                self.label,
                self.percent(),
                fmt_dur(now.duration_since(self.start))
            );
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * self.done as f64 / self.total as f64
        }
    }

    pub fn finish(self) -> Duration {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();

        self.start.elapsed()
    }
}

/// Human-readable duration: `"253µs"`, `"42ms"` or `"3.14s"` depending on the scale.
#[inline]
pub fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else {
        let ms = d.as_millis();
        if ms < 1_000 {
            format!("{ms}ms")
        } else {
            let s = d.as_secs_f32();
            format!("{s:.2}s")
        }
    }
}
