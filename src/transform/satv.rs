//! SATV (short-term anomaly value) high-pass filter.
//!
//! Transforms a series with an orthonormal DCT-II, zeroes the lowest
//! frequency coefficients (which carry trend and seasonal structure), and
//! inverts the transform. What remains is the short-term variation that
//! the SPC band detector operates on.

use crate::error::{AnalysisError, Result};
use crate::utils::all_finite;
use std::f64::consts::PI;

/// High-pass filter a series by suppressing its low-frequency DCT content.
///
/// `keep_fraction` is the fraction of the spectrum to suppress, measured
/// from the low end; `max(1, floor(n * keep_fraction))` coefficients are
/// zeroed, so at least the DC term always goes. Must lie strictly inside
/// (0, 1).
///
/// The result has the same length as the input and, because the DC
/// coefficient is removed, sums to zero up to floating-point error.
pub fn satv_filter(values: &[f64], keep_fraction: f64) -> Result<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData { needed: 2, got: n });
    }
    if !all_finite(values) {
        return Err(AnalysisError::InvalidSeries(
            "series contains non-finite values".to_string(),
        ));
    }
    if !(keep_fraction > 0.0 && keep_fraction < 1.0) {
        return Err(AnalysisError::InvalidParameter(
            "keep_fraction must be in (0, 1)".to_string(),
        ));
    }

    let cutoff = ((n as f64 * keep_fraction).floor() as usize).max(1);

    let mut coefficients = dct2_ortho(values);
    for c in coefficients.iter_mut().take(cutoff.min(n)) {
        *c = 0.0;
    }
    Ok(dct3_ortho(&coefficients))
}

/// Orthonormal DCT-II.
fn dct2_ortho(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();

    (0..n)
        .map(|k| {
            let sum: f64 = values
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n as f64)).cos())
                .sum();
            if k == 0 {
                scale0 * sum
            } else {
                scale * sum
            }
        })
        .collect()
}

/// Orthonormal DCT-III, the inverse of [`dct2_ortho`].
fn dct3_ortho(coefficients: &[f64]) -> Vec<f64> {
    let n = coefficients.len();
    let scale0 = (1.0 / n as f64).sqrt();
    let scale = (2.0 / n as f64).sqrt();

    (0..n)
        .map(|i| {
            coefficients
                .iter()
                .enumerate()
                .map(|(k, &c)| {
                    let basis = (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n as f64)).cos();
                    if k == 0 {
                        scale0 * c * basis
                    } else {
                        scale * c * basis
                    }
                })
                .sum()
        })
        .collect()
}
