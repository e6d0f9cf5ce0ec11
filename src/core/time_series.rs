//! TimeSeries data structure for hourly measurement data.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// A univariate time series with UTC timestamps.
///
/// Invariants enforced at construction: one value per timestamp, and
/// timestamps strictly increasing. Values may be NaN; NaN marks a missing
/// observation and is handled explicitly by the resampler.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a time series from already-sorted timestamps.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(AnalysisError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { timestamps, values })
    }

    /// Create a time series from unordered (timestamp, value) pairs.
    ///
    /// Pairs are sorted by timestamp; duplicate timestamps are rejected.
    pub fn from_pairs(mut pairs: Vec<(DateTime<Utc>, f64)>) -> Result<Self> {
        pairs.sort_by_key(|(t, _)| *t);
        for w in pairs.windows(2) {
            if w[0].0 == w[1].0 {
                return Err(AnalysisError::TimestampError(format!(
                    "duplicate timestamp: {}",
                    w[0].0
                )));
            }
        }
        let (timestamps, values) = pairs.into_iter().unzip();
        Self::new(timestamps, values)
    }

    /// Create an hourly series starting at `start`.
    pub fn hourly(start: DateTime<Utc>, values: Vec<f64>) -> Self {
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        Self { timestamps, values }
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the earliest timestamp.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    /// Get the latest timestamp.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Check if the series contains missing (NaN or infinite) values.
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Check whether timestamps lie on a uniform grid with the given step.
    pub fn is_uniform(&self, step: Duration) -> bool {
        self.timestamps.windows(2).all(|w| w[1] - w[0] == step)
    }

    /// Infer the sampling step as the modal spacing between observations.
    ///
    /// `tolerance` is the minimum fraction of spacings that must agree with
    /// the modal spacing (e.g. 0.5). Fails when no spacing is dominant
    /// enough or the series has fewer than two observations.
    pub fn infer_step(&self, tolerance: f64) -> Result<Duration> {
        if self.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        let (modal_secs, modal_count) = counts
            .iter()
            .max_by_key(|(&secs, &count)| (count, std::cmp::Reverse(secs)))
            .map(|(&secs, &count)| (secs, count))
            .ok_or_else(|| AnalysisError::TimestampError("empty spacing data".to_string()))?;

        let total: usize = counts.values().sum();
        if (modal_count as f64) / (total as f64) < tolerance {
            return Err(AnalysisError::TimestampError(
                "no dominant sampling step found".to_string(),
            ));
        }

        Ok(Duration::seconds(modal_secs))
    }
}
