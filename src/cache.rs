//! Explicit memoization for analysis results.
//!
//! The computations themselves never cache internally; callers that
//! re-run the same analysis per interaction (one cache per UI tab, say)
//! key results on a content fingerprint of the input series plus the
//! parameter tuple. Invalidation is by fingerprint: new data, new key.

use crate::core::TimeSeries;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};

/// Content fingerprint of a value slice: hash of length and bit patterns.
pub fn fingerprint(values: &[f64]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    values.len().hash(&mut hasher);
    for v in values {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Content fingerprint of a time series, covering timestamps and values.
pub fn fingerprint_series(series: &TimeSeries) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    series.len().hash(&mut hasher);
    for t in series.timestamps() {
        t.timestamp_millis().hash(&mut hasher);
    }
    for v in series.values() {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Concurrent result cache keyed by `(series fingerprint, parameters)`.
///
/// Safe to share between threads; a race on a cold key may compute the
/// value twice, which is harmless because every analysis is pure.
#[derive(Debug)]
pub struct AnalysisCache<P, T>
where
    P: Eq + Hash,
{
    entries: DashMap<(u64, P), T>,
}

impl<P, T> AnalysisCache<P, T>
where
    P: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a cached result.
    pub fn get(&self, fingerprint: u64, params: &P) -> Option<T> {
        self.entries
            .get(&(fingerprint, params.clone()))
            .map(|entry| entry.value().clone())
    }

    /// Return the cached result or compute, store, and return it.
    pub fn get_or_compute<F>(&self, fingerprint: u64, params: P, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        let key = (fingerprint, params);
        if let Some(entry) = self.entries.get(&key) {
            return entry.value().clone();
        }
        let value = compute();
        self.entries.insert(key, value.clone());
        value
    }

    /// Drop every entry derived from the given series fingerprint.
    pub fn invalidate(&self, fingerprint: u64) {
        self.entries.retain(|(fp, _), _| *fp != fingerprint);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<P, T> Default for AnalysisCache<P, T>
where
    P: Eq + Hash + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fingerprint_is_content_sensitive() {
        let a = fingerprint(&[1.0, 2.0, 3.0]);
        let b = fingerprint(&[1.0, 2.0, 3.0]);
        let c = fingerprint(&[1.0, 2.0, 4.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(fingerprint(&[1.0]), fingerprint(&[1.0, 1.0]));
    }

    #[test]
    fn series_fingerprint_covers_timestamps() {
        let start_a = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let start_b = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        let values = vec![1.0, 2.0, 3.0];

        let a = fingerprint_series(&TimeSeries::hourly(start_a, values.clone()));
        let b = fingerprint_series(&TimeSeries::hourly(start_b, values));
        assert_ne!(a, b);
    }

    #[test]
    fn get_or_compute_runs_once_per_key() {
        let cache: AnalysisCache<(u64, u64), Vec<f64>> = AnalysisCache::new();
        let calls = AtomicUsize::new(0);
        let fp = fingerprint(&[1.0, 2.0]);
        let params = (3, 50); // e.g. (k_sigma in tenths, keep_fraction in thousandths)

        for _ in 0..3 {
            let result = cache.get_or_compute(fp, params, || {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![1.0, 2.0]
            });
            assert_eq!(result, vec![1.0, 2.0]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_parameters_miss() {
        let cache: AnalysisCache<u32, usize> = AnalysisCache::new();
        let fp = fingerprint(&[5.0; 10]);

        cache.get_or_compute(fp, 1, || 100);
        cache.get_or_compute(fp, 2, || 200);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(fp, &1), Some(100));
        assert_eq!(cache.get(fp, &2), Some(200));
        assert_eq!(cache.get(fp, &3), None);
    }

    #[test]
    fn invalidate_drops_only_one_series() {
        let cache: AnalysisCache<u32, usize> = AnalysisCache::new();
        let fp_a = fingerprint(&[1.0]);
        let fp_b = fingerprint(&[2.0]);

        cache.get_or_compute(fp_a, 0, || 1);
        cache.get_or_compute(fp_a, 1, || 2);
        cache.get_or_compute(fp_b, 0, || 3);

        cache.invalidate(fp_a);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(fp_b, &0), Some(3));
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache: AnalysisCache<u32, usize> = AnalysisCache::new();
        cache.get_or_compute(1, 1, || 1);
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
