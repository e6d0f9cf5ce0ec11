//! STL (Seasonal-Trend decomposition using LOESS) implementation.
//!
//! Decomposes a uniformly sampled series into three additive components:
//! - Trend: the underlying long-term pattern
//! - Seasonal: the repeating cycle of the given period
//! - Residual: what remains after removing trend and seasonal
//!
//! The residual is computed by subtraction, so
//! `observed == trend + seasonal + residual` holds exactly at every sample.

use crate::error::{AnalysisError, Result};
use crate::utils::{median, variance};
use tracing::debug;

/// Absolute tolerance (relative to the series scale) for the inner-loop
/// convergence check on the trend estimate.
const CONVERGENCE_TOL: f64 = 1e-8;

/// Result of STL decomposition.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal component.
    pub seasonal: Vec<f64>,
    /// Residual component.
    pub residual: Vec<f64>,
}

impl DecompositionResult {
    /// Seasonal strength in [0, 1]; values close to 1 indicate strong
    /// seasonality.
    pub fn seasonal_strength(&self) -> f64 {
        component_strength(&self.seasonal, &self.residual)
    }

    /// Trend strength in [0, 1]; values close to 1 indicate strong trend.
    pub fn trend_strength(&self) -> f64 {
        component_strength(&self.trend, &self.residual)
    }
}

fn component_strength(component: &[f64], residual: &[f64]) -> f64 {
    let var_residual = variance(residual);
    let combined: Vec<f64> = component
        .iter()
        .zip(residual.iter())
        .map(|(c, r)| c + r)
        .collect();
    let var_combined = variance(&combined);

    if var_combined < 1e-10 {
        return 0.0;
    }
    (1.0 - var_residual / var_combined).max(0.0)
}

/// STL decomposition configuration and algorithm.
///
/// Window parameters are validated when [`STL::decompose`] runs: the
/// seasonal window must be odd and at least 7, the trend window odd and
/// at least the period. Defaults follow Cleveland et al. (1990).
#[derive(Debug, Clone)]
pub struct STL {
    /// Seasonal period in samples (e.g. 24 for daily cycles in hourly data).
    period: usize,
    /// Seasonal LOESS window length (ns).
    seasonal_window: usize,
    /// Trend LOESS window length (nt).
    trend_window: usize,
    /// Low-pass filter window length (nl).
    low_pass_window: usize,
    /// Inner iteration cap.
    inner_iterations: usize,
    /// Outer (robustness) iterations.
    outer_iterations: usize,
    /// Downweight large residuals between iterations.
    robust: bool,
}

impl STL {
    /// Create a decomposer with default windows for the given period.
    pub fn new(period: usize) -> Self {
        let ns = 7;
        let nt = (1.5 * period as f64 / (1.0 - 1.5 / ns as f64)).ceil() as usize;
        let nt = (nt | 1).max(period | 1);
        let nl = period | 1;

        Self {
            period,
            seasonal_window: ns,
            trend_window: nt,
            low_pass_window: nl,
            inner_iterations: 2,
            outer_iterations: 0,
            robust: false,
        }
    }

    /// Set the seasonal window length (odd, >= 7).
    pub fn with_seasonal_window(mut self, ns: usize) -> Self {
        self.seasonal_window = ns;
        self
    }

    /// Set the trend window length (odd, >= period).
    pub fn with_trend_window(mut self, nt: usize) -> Self {
        self.trend_window = nt;
        self
    }

    /// Enable robust fitting with the customary six outer iterations.
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self.outer_iterations = 6;
        self
    }

    /// Set the number of outer (robustness) iterations.
    pub fn with_outer_iterations(mut self, n: usize) -> Self {
        self.outer_iterations = n;
        if n > 0 {
            self.robust = true;
        }
        self
    }

    /// Set the inner iteration cap.
    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n.max(1);
        self
    }

    /// Decompose the series into trend, seasonal, and residual components.
    ///
    /// Requires at least two full periods of data.
    pub fn decompose(&self, series: &[f64]) -> Result<DecompositionResult> {
        self.validate()?;

        let n = series.len();
        if n < 2 * self.period {
            return Err(AnalysisError::InsufficientData {
                needed: 2 * self.period,
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidSeries(
                "series contains non-finite values".to_string(),
            ));
        }

        let scale = series.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let tol = CONVERGENCE_TOL * (scale + 1.0);

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        let outer_iters = if self.robust {
            self.outer_iterations.max(1)
        } else {
            1
        };

        for outer in 0..outer_iters {
            for inner in 0..self.inner_iterations {
                // Step 1: detrend.
                let detrended: Vec<f64> =
                    series.iter().zip(trend.iter()).map(|(y, t)| y - t).collect();

                // Step 2: cycle-subseries smoothing.
                let cycle_subseries = self.smooth_cycle_subseries(&detrended, &weights);

                // Step 3: low-pass the smoothed cycle-subseries.
                let low_pass = self.low_pass_filter(&cycle_subseries);

                // Step 4: remove trend leakage from the seasonal estimate.
                for i in 0..n {
                    seasonal[i] = cycle_subseries[i] - low_pass[i];
                }

                // Step 5: deseasonalize.
                let deseasonalized: Vec<f64> = series
                    .iter()
                    .zip(seasonal.iter())
                    .map(|(y, s)| y - s)
                    .collect();

                // Step 6: re-estimate trend.
                let new_trend = loess_smooth(&deseasonalized, self.trend_window, &weights);
                let max_change = trend
                    .iter()
                    .zip(new_trend.iter())
                    .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
                trend = new_trend;

                if max_change < tol {
                    debug!(outer, inner, "STL inner loop converged");
                    break;
                }
            }

            if self.robust {
                let residual: Vec<f64> = series
                    .iter()
                    .zip(seasonal.iter())
                    .zip(trend.iter())
                    .map(|((y, s), t)| y - s - t)
                    .collect();
                weights = robustness_weights(&residual);
            }
        }

        let residual: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .zip(trend.iter())
            .map(|((y, s), t)| y - s - t)
            .collect();

        Ok(DecompositionResult {
            trend,
            seasonal,
            residual,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.period < 2 {
            return Err(AnalysisError::InvalidParameter(
                "period must be at least 2".to_string(),
            ));
        }
        if self.seasonal_window < 7 || self.seasonal_window % 2 == 0 {
            return Err(AnalysisError::InvalidParameter(
                "seasonal window must be an odd integer >= 7".to_string(),
            ));
        }
        if self.trend_window < self.period || self.trend_window % 2 == 0 {
            return Err(AnalysisError::InvalidParameter(
                "trend window must be an odd integer >= period".to_string(),
            ));
        }
        Ok(())
    }

    /// Smooth each cycle-subseries (one per position in the seasonal cycle)
    /// independently.
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let period = self.period;
        let mut result = vec![0.0; n];

        for cycle_pos in 0..period {
            let mut subseries_values = Vec::new();
            let mut subseries_weights = Vec::new();
            let mut subseries_indices = Vec::new();

            for (i, (&val, &w)) in detrended.iter().zip(weights.iter()).enumerate() {
                if i % period == cycle_pos {
                    subseries_values.push(val);
                    subseries_weights.push(w);
                    subseries_indices.push(i);
                }
            }

            let smoothed =
                loess_smooth(&subseries_values, self.seasonal_window, &subseries_weights);

            for (&idx, &smooth_val) in subseries_indices.iter().zip(smoothed.iter()) {
                result[idx] = smooth_val;
            }
        }

        result
    }

    /// Low-pass filter: three moving averages followed by a LOESS pass.
    fn low_pass_filter(&self, series: &[f64]) -> Vec<f64> {
        let n = series.len();
        let ma1 = moving_average(series, self.period);
        let ma2 = moving_average(&ma1, self.period);
        let ma3 = moving_average(&ma2, 3);

        let weights = vec![1.0; n];
        loess_smooth(&ma3, self.low_pass_window, &weights)
    }
}

/// Decompose with explicit window parameters, the flat entry point used by
/// the presentation layer.
pub fn stl_decompose(
    series: &[f64],
    period: usize,
    seasonal_window: usize,
    trend_window: usize,
    robust: bool,
) -> Result<DecompositionResult> {
    let mut stl = STL::new(period)
        .with_seasonal_window(seasonal_window)
        .with_trend_window(trend_window);
    if robust {
        stl = stl.robust();
    }
    stl.decompose(series)
}

/// Simple centered moving average with shrinking windows at the edges.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    let mut result = vec![0.0; n];

    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let sum: f64 = series[start..end].iter().sum();
        result[i] = sum / (end - start) as f64;
    }

    result
}

/// Tricube-weighted local smoothing (LOESS simplified to a weighted local
/// mean, as in the cycle-subseries and trend steps).
fn loess_smooth(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let half_span = span / 2;
    let mut result = vec![0.0; n];

    for i in 0..n {
        let start = i.saturating_sub(half_span);
        let end = (i + half_span + 1).min(n);

        let mut sum_weights = 0.0;
        let mut sum_values = 0.0;

        for j in start..end {
            let dist = (i as f64 - j as f64).abs();
            let max_dist = half_span as f64 + 1.0;
            let u = dist / max_dist;
            let tricube = if u < 1.0 {
                (1.0 - u.powi(3)).powi(3)
            } else {
                0.0
            };
            let w = tricube * weights[j];
            sum_weights += w;
            sum_values += w * values[j];
        }

        result[i] = if sum_weights > 0.0 {
            sum_values / sum_weights
        } else {
            values[i]
        };
    }

    result
}

/// Bisquare robustness weights from the residual, following Cleveland's
/// h = 6 * median(|r|) tuning.
fn robustness_weights(residual: &[f64]) -> Vec<f64> {
    let abs_residual: Vec<f64> = residual.iter().map(|r| r.abs()).collect();
    let h = 6.0 * median(&abs_residual);

    residual
        .iter()
        .map(|r| {
            if h < 1e-10 {
                return 1.0;
            }
            let u = r.abs() / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}
