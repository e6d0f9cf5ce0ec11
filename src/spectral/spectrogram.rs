//! Spectrogram computation over overlapping windowed segments.
//!
//! Splits a uniformly sampled series into Hann-windowed segments,
//! computes a one-sided power spectral density per segment (density
//! scaling, constant detrend) and assembles the per-segment spectra into
//! a time-frequency grid. Power is returned linear; [`SpectrogramResult::power_db`]
//! applies the decibel transform with a floor so log(0) never occurs.

use crate::error::{AnalysisError, Result};
use crate::utils::all_finite;
use rustfft::{num_complex::Complex64, FftPlanner};
use std::f64::consts::PI;
use tracing::trace;

/// Floor added to linear power before the decibel transform.
pub const POWER_FLOOR: f64 = 1e-12;

/// A time-localized power spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramResult {
    /// Linear power indexed by `[frequency_bin][segment]`.
    pub power: Vec<Vec<f64>>,
    /// Frequency axis (cycles per unit time), one entry per bin.
    pub frequencies: Vec<f64>,
    /// Time axis: center of each segment, in units of the sampling rate.
    pub times: Vec<f64>,
}

impl SpectrogramResult {
    /// Number of frequency bins.
    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// Number of time segments.
    pub fn num_segments(&self) -> usize {
        self.times.len()
    }

    /// Power grid on a decibel scale: `10 * log10(power + floor)`.
    pub fn power_db(&self) -> Vec<Vec<f64>> {
        self.power
            .iter()
            .map(|row| row.iter().map(|&p| 10.0 * (p + POWER_FLOOR).log10()).collect())
            .collect()
    }
}

/// Compute a spectrogram of a uniformly sampled series.
///
/// `sample_rate` is in samples per unit time (1.0 for "per hour" axes on
/// hourly data), `nperseg` the segment length, and `overlap` the fraction
/// of each segment shared with its successor, in [0, 0.95). Consecutive
/// segments share `floor(nperseg * overlap)` samples.
///
/// Fails when `nperseg` exceeds the series length or any parameter is out
/// of range.
pub fn spectrogram(
    signal: &[f64],
    sample_rate: f64,
    nperseg: usize,
    overlap: f64,
) -> Result<SpectrogramResult> {
    if signal.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if !all_finite(signal) {
        return Err(AnalysisError::InvalidSeries(
            "signal contains non-finite values".to_string(),
        ));
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(AnalysisError::InvalidParameter(
            "sample_rate must be positive".to_string(),
        ));
    }
    if nperseg < 2 {
        return Err(AnalysisError::InvalidParameter(
            "nperseg must be at least 2".to_string(),
        ));
    }
    if nperseg > signal.len() {
        return Err(AnalysisError::InvalidParameter(format!(
            "nperseg {} exceeds series length {}",
            nperseg,
            signal.len()
        )));
    }
    if !(0.0..0.95).contains(&overlap) {
        return Err(AnalysisError::InvalidParameter(
            "overlap must be in [0, 0.95)".to_string(),
        ));
    }

    let noverlap = (nperseg as f64 * overlap).floor() as usize;
    let hop = nperseg - noverlap;
    let window = hann_window(nperseg);
    let window_energy: f64 = window.iter().map(|w| w * w).sum();

    let n_bins = nperseg / 2 + 1;
    let n_segments = (signal.len() - nperseg) / hop + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);

    let mut power = vec![vec![0.0; n_segments]; n_bins];
    let mut times = Vec::with_capacity(n_segments);

    for seg in 0..n_segments {
        let start = seg * hop;
        let segment = &signal[start..start + nperseg];

        // Constant detrend, then window.
        let seg_mean = segment.iter().sum::<f64>() / nperseg as f64;
        let mut buffer: Vec<Complex64> = segment
            .iter()
            .zip(window.iter())
            .map(|(&x, &w)| Complex64::new((x - seg_mean) * w, 0.0))
            .collect();
        fft.process(&mut buffer);

        for (bin, value) in buffer.iter().take(n_bins).enumerate() {
            let mut p = value.norm_sqr() / (sample_rate * window_energy);
            // One-sided spectrum: interior bins absorb their mirror image.
            let is_nyquist = nperseg % 2 == 0 && bin == nperseg / 2;
            if bin != 0 && !is_nyquist {
                p *= 2.0;
            }
            power[bin][seg] = p;
        }

        times.push((start as f64 + nperseg as f64 / 2.0) / sample_rate);
    }

    let frequencies = (0..n_bins)
        .map(|k| k as f64 * sample_rate / nperseg as f64)
        .collect();

    trace!(
        segments = n_segments,
        bins = n_bins,
        hop,
        "spectrogram computed"
    );

    Ok(SpectrogramResult {
        power,
        frequencies,
        times,
    })
}

/// Periodic Hann window of the given length.
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}
