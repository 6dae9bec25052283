//! Descriptive statistics used by the risk simulator.
//!
//! Conventions are fixed so summaries are comparable across runs:
//!   - occupancy dispersion uses the sample (n - 1) standard deviation,
//!   - profit dispersion uses the population (n) standard deviation,
//!   - percentiles interpolate linearly between order statistics
//!     at rank p/100 * (n - 1).

use crate::types::Days;

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Bessel-corrected standard deviation. `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some((sum_sq_dev(values) / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation. Returns 0.0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (sum_sq_dev(values) / values.len() as f64).sqrt()
}

/// Linear-interpolated percentile of an ascending slice.
/// `p` is in percent and is clamped to [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let w = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * w
}

/// Normal fit of a subgroup's annual occupancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyModel {
    pub mean: Days,
    pub std_dev: Days,
    pub observations: usize,
}

impl OccupancyModel {
    /// Fit mean and sample std. `None` when fewer than two observations,
    /// since the dispersion would be undefined.
    pub fn fit(occupancies: &[Days]) -> Option<Self> {
        let std_dev = sample_std(occupancies)?;
        Some(Self {
            mean: mean(occupancies),
            std_dev,
            observations: occupancies.len(),
        })
    }
}
