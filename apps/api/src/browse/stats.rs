//! Aggregate compensation statistics, computed in Rust over fetched rows.
//!
//! Groups smaller than the configured minimum report a count but no stats,
//! so that small groups cannot leak individual figures.

use serde::{Deserialize, Serialize};

/// One submission's compensation figures, as sampled for aggregation.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub base: i64,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
}

impl Sample {
    pub fn total(&self) -> i64 {
        self.base + self.bonus.unwrap_or(0) + self.stock.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompStats {
    pub count: usize,
    pub median_total: Option<i64>,
    pub p25_total: Option<i64>,
    pub p75_total: Option<i64>,
    pub p90_total: Option<i64>,
    pub mean_base: Option<i64>,
}

impl CompStats {
    pub fn empty() -> Self {
        CompStats {
            count: 0,
            median_total: None,
            p25_total: None,
            p75_total: None,
            p90_total: None,
            mean_base: None,
        }
    }
}

/// Computes aggregate stats over a group of samples.
/// Groups with fewer than `min_group_size` samples return count only.
pub fn compute_stats(samples: &[Sample], min_group_size: usize) -> CompStats {
    if samples.is_empty() || samples.len() < min_group_size {
        return CompStats {
            count: samples.len(),
            ..CompStats::empty()
        };
    }

    let mut totals: Vec<i64> = samples.iter().map(Sample::total).collect();
    totals.sort_unstable();

    let base_sum: i64 = samples.iter().map(|s| s.base).sum();
    let mean_base = (base_sum as f64 / samples.len() as f64).round() as i64;

    CompStats {
        count: samples.len(),
        median_total: Some(percentile(&totals, 50.0)),
        p25_total: Some(percentile(&totals, 25.0)),
        p75_total: Some(percentile(&totals, 75.0)),
        p90_total: Some(percentile(&totals, 90.0)),
        mean_base: Some(mean_base),
    }
}

/// Percentile by linear interpolation between closest ranks.
/// `sorted` must be non-empty and ascending.
fn percentile(sorted: &[i64], p: f64) -> i64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    (sorted[lo] as f64 + frac * (sorted[hi] - sorted[lo]) as f64).round() as i64
}

/// The 1st–99th percentile band of totals, used for outlier advisories on
/// new submissions. None when the group is too small to judge.
pub fn outlier_band(samples: &[Sample], min_group_size: usize) -> Option<(i64, i64)> {
    if samples.len() < min_group_size {
        return None;
    }
    let mut totals: Vec<i64> = samples.iter().map(Sample::total).collect();
    totals.sort_unstable();
    Some((percentile(&totals, 1.0), percentile(&totals, 99.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(b: i64) -> Sample {
        Sample {
            base: b,
            bonus: None,
            stock: None,
        }
    }

    #[test]
    fn test_total_includes_bonus_and_stock() {
        let s = Sample {
            base: 100,
            bonus: Some(20),
            stock: Some(30),
        };
        assert_eq!(s.total(), 150);
    }

    #[test]
    fn test_empty_group() {
        let stats = compute_stats(&[], 3);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.median_total, None);
        assert_eq!(stats.mean_base, None);
    }

    #[test]
    fn test_small_group_reports_count_only() {
        let stats = compute_stats(&[base(100), base(200)], 3);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.median_total, None);
        assert_eq!(stats.p90_total, None);
    }

    #[test]
    fn test_median_odd() {
        let stats = compute_stats(&[base(100), base(300), base(200)], 3);
        assert_eq!(stats.median_total, Some(200));
    }

    #[test]
    fn test_median_even_interpolates() {
        let stats = compute_stats(&[base(100), base(200), base(300), base(400)], 3);
        assert_eq!(stats.median_total, Some(250));
    }

    #[test]
    fn test_quartiles_on_known_set() {
        let samples: Vec<Sample> = (1..=5).map(|i| base(i * 100)).collect();
        let stats = compute_stats(&samples, 3);
        assert_eq!(stats.p25_total, Some(200));
        assert_eq!(stats.median_total, Some(300));
        assert_eq!(stats.p75_total, Some(400));
        assert_eq!(stats.p90_total, Some(460));
    }

    #[test]
    fn test_mean_base_ignores_bonus() {
        let samples = [
            Sample {
                base: 100,
                bonus: Some(1000),
                stock: None,
            },
            base(200),
            base(300),
        ];
        let stats = compute_stats(&samples, 3);
        assert_eq!(stats.mean_base, Some(200));
    }

    #[test]
    fn test_single_sample_percentiles() {
        let stats = compute_stats(&[base(150)], 1);
        assert_eq!(stats.median_total, Some(150));
        assert_eq!(stats.p90_total, Some(150));
    }

    #[test]
    fn test_outlier_band_requires_minimum() {
        assert_eq!(outlier_band(&[base(100)], 3), None);
        let samples: Vec<Sample> = (1..=10).map(|i| base(i * 10)).collect();
        let (lo, hi) = outlier_band(&samples, 3).unwrap();
        assert!(lo >= 10 && hi <= 100);
        assert!(lo < hi);
    }
}
