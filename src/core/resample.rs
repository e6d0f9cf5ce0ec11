//! Resampling onto a uniform time grid.
//!
//! Raw measurement feeds arrive with irregular spacing and missing hours.
//! Every analysis routine downstream assumes a fixed step, so the resampler
//! is the single place where gaps are closed.

use crate::core::TimeSeries;
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// How to fill grid points outside the range of finite observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFill {
    /// Leave leading/trailing gaps as NaN.
    None,
    /// Hold the nearest finite observation.
    Nearest,
}

/// Resample a series onto a uniform grid at the given step.
///
/// The grid spans from the earliest to the latest input timestamp. Grid
/// points that coincide with a finite observation take its value; interior
/// gaps (including NaN input values) are linearly interpolated in time
/// between the surrounding finite observations. Leading and trailing gaps
/// are governed by `edges`.
///
/// Fails when the series has fewer than two observations or the step is
/// not positive.
pub fn resample(series: &TimeSeries, step: Duration, edges: EdgeFill) -> Result<TimeSeries> {
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if series.len() < 2 {
        return Err(AnalysisError::InvalidSeries(
            "resampling needs at least two distinct timestamps".to_string(),
        ));
    }
    if step <= Duration::zero() {
        return Err(AnalysisError::InvalidParameter(
            "step must be positive".to_string(),
        ));
    }

    // Finite observations only; NaN input values are gaps to be filled.
    let observations: Vec<(DateTime<Utc>, f64)> = series
        .timestamps()
        .iter()
        .zip(series.values().iter())
        .filter(|(_, v)| v.is_finite())
        .map(|(t, v)| (*t, *v))
        .collect();

    let first = series.timestamps()[0];
    let last = series.timestamps()[series.len() - 1];

    let mut grid = Vec::new();
    let mut t = first;
    while t <= last {
        grid.push(t);
        t = t + step;
    }

    let mut values = Vec::with_capacity(grid.len());
    // Index of the last observation at or before the current grid point.
    let mut prev = None::<usize>;
    let mut next = 0usize;
    let mut interpolated = 0usize;

    for &t in &grid {
        while next < observations.len() && observations[next].0 <= t {
            prev = Some(next);
            next += 1;
        }

        let value = match prev {
            Some(p) if observations[p].0 == t => observations[p].1,
            Some(p) if next < observations.len() => {
                interpolated += 1;
                lerp_in_time(observations[p], observations[next], t)
            }
            // Trailing gap: observations exhausted.
            Some(p) => match edges {
                EdgeFill::Nearest => observations[p].1,
                EdgeFill::None => f64::NAN,
            },
            // Leading gap: no finite observation yet.
            None => match edges {
                EdgeFill::Nearest if !observations.is_empty() => observations[0].1,
                _ => f64::NAN,
            },
        };
        values.push(value);
    }

    debug!(
        grid_len = grid.len(),
        observations = observations.len(),
        interpolated,
        "resampled series onto uniform grid"
    );

    TimeSeries::new(grid, values)
}

fn lerp_in_time(a: (DateTime<Utc>, f64), b: (DateTime<Utc>, f64), t: DateTime<Utc>) -> f64 {
    let span = (b.0 - a.0).num_milliseconds() as f64;
    let offset = (t - a.0).num_milliseconds() as f64;
    a.1 + (b.1 - a.1) * (offset / span)
}
