// src/stats/distribution.rs
use serde::Serialize;
use statrs::distribution::ContinuousCDF;

use super::{
    describe::{mean, sample_variance},
    standard_normal, StatsError,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width bins spanning [min, max]; the last bin is closed on the right.
/// A constant sample gets the range [v - 0.5, v + 0.5].
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// `points` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Gaussian kernel density estimate evaluated at `grid`, with Scott's rule
/// bandwidth `σ · n^(-1/5)`. `None` when the sample has no spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    let sd = sample_variance(values).sqrt();
    if n < 2 || !(sd > 0.0) {
        return None;
    }
    let bw = sd * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|&x| {
                norm * values
                    .iter()
                    .map(|&v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                    .sum::<f64>()
            })
            .collect(),
    )
}

/// Points of a normal probability plot plus its standardized reference line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QqPlotData {
    /// (theoretical quantile, sample quantile), ascending.
    pub points: Vec<(f64, f64)>,
    pub intercept: f64,
    pub slope: f64,
}

/// Sorted sample against standard normal quantiles at plotting positions
/// `i / (n + 1)`. The reference line is `mean + std · q` with the population
/// standard deviation.
pub fn normal_qq(values: &[f64]) -> Result<QqPlotData, StatsError> {
    let n = values.len();
    if n == 0 {
        return Err(StatsError::TooFewObservations { needed: 1, got: 0 });
    }
    let normal = standard_normal()?;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let points = sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let p = (i + 1) as f64 / (n + 1) as f64;
            (normal.inverse_cdf(p), v)
        })
        .collect();

    let m = mean(&sorted);
    let pop_sd = (sorted.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64).sqrt();
    Ok(QqPlotData {
        points,
        intercept: m,
        slope: pop_sd,
    })
}
