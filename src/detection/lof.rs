//! Local Outlier Factor (LOF) anomaly detection.
//!
//! Scores each point by the ratio of its neighbors' local reachability
//! density to its own: points in sparser neighborhoods than their
//! neighbors score well above 1 and are candidate anomalies. The caller
//! fixes the anomaly proportion up front; exactly that fraction of points
//! (highest scores first) is flagged.

use crate::error::{AnalysisError, Result};
use tracing::debug;

/// Smallest admissible neighbor count.
const MIN_NEIGHBORS: usize = 5;

/// Guards the reachability-density division when a point coincides with
/// all of its neighbors.
const DENSITY_EPSILON: f64 = 1e-10;

/// Result of LOF detection.
#[derive(Debug, Clone, PartialEq)]
pub struct LofResult {
    /// LOF score per sample; ~1 for inliers, substantially above 1 for
    /// points in locally sparse regions.
    pub scores: Vec<f64>,
    /// Per-sample anomaly flags, aligned with the input.
    pub flags: Vec<bool>,
    /// Neighbor count actually used, after clamping to `[5, n - 1]`.
    pub neighbors: usize,
}

impl LofResult {
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

/// Detect anomalies in a feature series via Local Outlier Factor.
///
/// `k` is the requested neighbor count, clamped to `[5, n - 1]`;
/// `contamination` in (0, 0.5] is the fraction of points to flag. Exactly
/// `round(contamination * n)` points with the highest scores are marked,
/// ties broken by score and then by original index, ascending. The input
/// is never mutated and the result is deterministic.
///
/// Fails when fewer than 6 samples are supplied (the minimum neighbor
/// count cannot be satisfied), when rows have inconsistent dimensions, or
/// when a parameter is out of range.
pub fn lof_detect(features: &[Vec<f64>], k: usize, contamination: f64) -> Result<LofResult> {
    let n = features.len();
    if n < MIN_NEIGHBORS + 1 {
        return Err(AnalysisError::InvalidParameter(format!(
            "LOF needs at least {} samples, got {}",
            MIN_NEIGHBORS + 1,
            n
        )));
    }
    if !(contamination > 0.0 && contamination <= 0.5) {
        return Err(AnalysisError::InvalidParameter(
            "contamination must be in (0, 0.5]".to_string(),
        ));
    }
    let dims = features[0].len();
    if dims == 0 {
        return Err(AnalysisError::InvalidSeries(
            "feature vectors must be non-empty".to_string(),
        ));
    }
    for row in features {
        if row.len() != dims {
            return Err(AnalysisError::DimensionMismatch {
                expected: dims,
                got: row.len(),
            });
        }
        if !row.iter().all(|v| v.is_finite()) {
            return Err(AnalysisError::InvalidSeries(
                "features contain non-finite values".to_string(),
            ));
        }
    }

    let k_eff = k.clamp(MIN_NEIGHBORS, n - 1);

    // k nearest neighbors per point with their distances; ties resolved by
    // original index so repeated runs agree.
    let mut neighbors: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut candidates: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, euclidean(&features[i], &features[j])))
            .collect();
        candidates.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        candidates.truncate(k_eff);
        neighbors.push(candidates);
    }

    // k-distance of each point: distance to its k-th nearest neighbor.
    let k_distance: Vec<f64> = neighbors
        .iter()
        .map(|nb| nb.last().map(|&(_, d)| d).unwrap_or(0.0))
        .collect();

    // Local reachability density.
    let lrd: Vec<f64> = neighbors
        .iter()
        .map(|nb| {
            let reach_sum: f64 = nb.iter().map(|&(j, d)| d.max(k_distance[j])).sum();
            1.0 / (reach_sum / k_eff as f64 + DENSITY_EPSILON)
        })
        .collect();

    let scores: Vec<f64> = neighbors
        .iter()
        .enumerate()
        .map(|(i, nb)| {
            let neighbor_lrd_sum: f64 = nb.iter().map(|&(j, _)| lrd[j]).sum();
            neighbor_lrd_sum / (k_eff as f64 * lrd[i])
        })
        .collect();

    let flag_count = ((contamination * n as f64).round() as usize).min(n);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut flags = vec![false; n];
    for &idx in order.iter().take(flag_count) {
        flags[idx] = true;
    }

    debug!(
        samples = n,
        neighbors = k_eff,
        flagged = flag_count,
        "LOF detection complete"
    );

    Ok(LofResult {
        scores,
        flags,
        neighbors: k_eff,
    })
}

/// Convenience wrapper for a univariate series: each sample becomes a
/// one-dimensional feature vector.
pub fn lof_detect_series(values: &[f64], k: usize, contamination: f64) -> Result<LofResult> {
    let features: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
    lof_detect(&features, k, contamination)
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_the_isolated_point() {
        // Nine identical points and one far away.
        let values = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0];
        let result = lof_detect_series(&values, 5, 0.1).unwrap();

        assert_eq!(result.anomaly_count(), 1);
        assert_eq!(result.anomaly_indices(), vec![9]);
        assert_eq!(result.neighbors, 5);
    }

    #[test]
    fn inliers_score_near_one() {
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let result = lof_detect_series(&values, 5, 0.1).unwrap();

        // A uniform grid has no density contrast in its interior.
        for &s in &result.scores[10..40] {
            assert!((s - 1.0).abs() < 0.5, "interior score {} far from 1", s);
        }
    }

    #[test]
    fn flag_count_matches_contamination() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 31 % 17) as f64) * 0.5).collect();
        for contamination in [0.05, 0.1, 0.25, 0.5] {
            let result = lof_detect_series(&values, 10, contamination).unwrap();
            let expected = (contamination * 40.0).round() as usize;
            assert_eq!(result.anomaly_count(), expected);
        }
    }

    #[test]
    fn neighbor_count_is_clamped() {
        let values: Vec<f64> = (0..8).map(|i| i as f64).collect();
        // Requested k exceeds n - 1.
        let result = lof_detect_series(&values, 100, 0.25).unwrap();
        assert_eq!(result.neighbors, 7);

        // Requested k below the minimum.
        let result = lof_detect_series(&values, 1, 0.25).unwrap();
        assert_eq!(result.neighbors, 5);
    }

    #[test]
    fn multivariate_features_are_supported() {
        let mut features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![(i % 5) as f64, (i / 5) as f64])
            .collect();
        features.push(vec![100.0, 100.0]);

        let result = lof_detect(&features, 5, 0.05).unwrap();
        assert_eq!(result.anomaly_indices(), vec![20]);
    }

    #[test]
    fn deterministic_across_runs() {
        let values: Vec<f64> = (0..30).map(|i| ((i * 13 % 7) as f64).powi(2)).collect();
        let a = lof_detect_series(&values, 6, 0.2).unwrap();
        let b = lof_detect_series(&values, 6, 0.2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_points_do_not_poison_the_scores() {
        // All-duplicate neighborhoods have unbounded density; the epsilon
        // guard keeps scores finite.
        let values = vec![3.0; 12];
        let result = lof_detect_series(&values, 5, 0.25).unwrap();
        assert!(result.scores.iter().all(|s| s.is_finite()));
        assert_eq!(result.anomaly_count(), 3);
    }

    #[test]
    fn rejects_too_few_samples() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(matches!(
            lof_detect_series(&values, 5, 0.1),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_bad_contamination() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        for bad in [0.0, -0.1, 0.6, f64::NAN] {
            assert!(matches!(
                lof_detect_series(&values, 5, bad),
                Err(AnalysisError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn rejects_ragged_and_non_finite_features() {
        let ragged = vec![vec![1.0], vec![2.0], vec![3.0, 4.0], vec![5.0], vec![6.0], vec![7.0]];
        assert!(matches!(
            lof_detect(&ragged, 5, 0.1),
            Err(AnalysisError::DimensionMismatch { expected: 1, got: 2 })
        ));

        let bad = vec![vec![1.0], vec![f64::NAN], vec![3.0], vec![4.0], vec![5.0], vec![6.0]];
        assert!(matches!(
            lof_detect(&bad, 5, 0.1),
            Err(AnalysisError::InvalidSeries(_))
        ));
    }
}
