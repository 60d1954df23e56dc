//! Robust statistics helpers for the detection heuristics.
//!
//! Ratings are heavy-tailed and small samples are the norm, so the
//! aggregators lean on median/MAD rather than mean/stddev.

/// Arithmetic mean. `None` on empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median. `None` on empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation around the median. `None` on empty input.
///
/// Not scaled to stddev units; callers compare deviations in raw MAD units.
pub fn mad(values: &[f64]) -> Option<f64> {
    let med = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

/// Fraction of `values` strictly below `x`, in 0..1. `None` on empty input.
pub fn percentile_rank(values: &[f64], x: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let below = values.iter().filter(|&&v| v < x).count();
    Some(below as f64 / values.len() as f64)
}

/// Mean after clamping both tails to the given quantile (0..0.5).
pub fn winsorized_mean(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let k = ((sorted.len() as f64) * quantile).floor() as usize;
    let lo = sorted[k];
    let hi = sorted[sorted.len() - 1 - k];
    let clamped: Vec<f64> = sorted.iter().map(|&v| v.clamp(lo, hi)).collect();
    mean(&clamped)
}
