//! Robust SPC (statistical process control) band detection.
//!
//! Control limits are derived from the median and the scaled median
//! absolute deviation rather than mean/standard-deviation, so the very
//! outliers being hunted cannot drag the band towards themselves (the
//! median/MAD pair has a ~50% breakdown point).

use crate::error::{AnalysisError, Result};
use crate::utils::{all_finite, median, median_absolute_deviation};

/// Makes the MAD a consistent estimator of the standard deviation under
/// Gaussian data.
const MAD_CONSISTENCY: f64 = 1.4826;

/// Lower bound on the MAD, so a (near-)constant residual cannot produce a
/// zero-width band that flags everything.
const MAD_FLOOR: f64 = 1e-9;

/// Symmetric control limits around a robust center estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlBounds {
    /// Median of the residual series.
    pub center: f64,
    /// Robust spread estimate: `1.4826 * MAD`, floored at 1e-9.
    pub spread: f64,
    /// `center - k_sigma * spread`.
    pub lower: f64,
    /// `center + k_sigma * spread`.
    pub upper: f64,
}

impl ControlBounds {
    /// Check whether a value lies strictly outside the band.
    pub fn is_outside(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Result of SPC band detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SpcResult {
    /// The control band.
    pub bounds: ControlBounds,
    /// Per-sample anomaly flags, aligned with the input series.
    pub flags: Vec<bool>,
}

impl SpcResult {
    /// Number of flagged samples.
    pub fn anomaly_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Indices of flagged samples.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Compute robust control bounds over a residual series and flag samples
/// that fall strictly outside them.
///
/// `k_sigma` is the band half-width in robust-sigma units and must be
/// finite and non-negative.
pub fn spc_bounds(residual: &[f64], k_sigma: f64) -> Result<SpcResult> {
    if residual.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if !all_finite(residual) {
        return Err(AnalysisError::InvalidSeries(
            "residual contains non-finite values".to_string(),
        ));
    }
    if !k_sigma.is_finite() || k_sigma < 0.0 {
        return Err(AnalysisError::InvalidParameter(
            "k_sigma must be finite and non-negative".to_string(),
        ));
    }

    let center = median(residual);
    let spread = MAD_CONSISTENCY * median_absolute_deviation(residual).max(MAD_FLOOR);

    let bounds = ControlBounds {
        center,
        spread,
        lower: center - k_sigma * spread,
        upper: center + k_sigma * spread,
    };

    let flags = residual.iter().map(|&v| bounds.is_outside(v)).collect();

    Ok(SpcResult { bounds, flags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flags_only_the_spike() {
        let mut residual = vec![0.0; 99];
        // Mild noise so the MAD is non-degenerate.
        for (i, r) in residual.iter_mut().enumerate() {
            *r = (i as f64 * 0.7).sin();
        }
        residual.push(50.0);

        let result = spc_bounds(&residual, 3.5).unwrap();
        assert_eq!(result.anomaly_indices(), vec![99]);
    }

    #[test]
    fn bounds_are_symmetric_around_center() {
        let residual: Vec<f64> = (0..200).map(|i| ((i * 13 % 17) as f64) - 8.0).collect();
        let result = spc_bounds(&residual, 2.5).unwrap();
        let b = result.bounds;
        assert_relative_eq!(b.center - b.lower, b.upper - b.center, epsilon = 1e-12);
    }

    #[test]
    fn wider_band_never_flags_more() {
        let residual: Vec<f64> = (0..100).map(|i| ((i * 7 % 23) as f64) - 11.0).collect();
        let narrow = spc_bounds(&residual, 1.0).unwrap();
        let wide = spc_bounds(&residual, 3.0).unwrap();
        assert!(wide.anomaly_count() <= narrow.anomaly_count());
    }

    #[test]
    fn constant_residual_flags_nothing() {
        // MAD is exactly zero; the floor keeps the band non-degenerate and
        // the samples sit on its center.
        let residual = vec![2.5; 64];
        let result = spc_bounds(&residual, 3.0).unwrap();
        assert_eq!(result.anomaly_count(), 0);
        assert_relative_eq!(result.bounds.spread, MAD_CONSISTENCY * MAD_FLOOR, epsilon = 1e-18);
    }

    #[test]
    fn zero_k_sigma_flags_everything_off_center() {
        let residual = vec![1.0, 2.0, 3.0, 2.0, 1.0];
        let result = spc_bounds(&residual, 0.0).unwrap();
        // Center is the median 2.0; only the exact-median samples survive.
        assert_eq!(result.flags, vec![true, false, true, false, true]);
    }

    #[test]
    fn boundary_values_are_not_flagged() {
        let residual = vec![0.0, 1.0, -1.0, 2.0, -2.0];
        let result = spc_bounds(&residual, 1.0).unwrap();
        let b = result.bounds;
        assert!(!b.is_outside(b.lower));
        assert!(!b.is_outside(b.upper));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            spc_bounds(&[], 3.0),
            Err(AnalysisError::EmptySeries)
        ));
        assert!(matches!(
            spc_bounds(&[1.0, f64::NAN], 3.0),
            Err(AnalysisError::InvalidSeries(_))
        ));
        assert!(matches!(
            spc_bounds(&[1.0, 2.0], -1.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            spc_bounds(&[1.0, 2.0], f64::NAN),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
