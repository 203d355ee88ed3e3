//! Shapiro-Wilk W test, following Royston's approximation (AS R94) for the
//! coefficients and the normalizing transform of W. Valid for 3 ≤ n ≤ 5000.

use serde::Serialize;
use statrs::distribution::ContinuousCDF;
use tracing::warn;

use super::{describe::mean, standard_normal, StatsError};

const MAX_EXACT_N: usize = 5000;

// Polynomial coefficients (lowest order first).
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ShapiroWilk {
    pub n: usize,
    pub statistic: f64,
    pub p_value: f64,
}

impl ShapiroWilk {
    /// Normality is not rejected when `p > alpha`.
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

fn poly(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk, StatsError> {
    let n = values.len();
    if n < 3 {
        return Err(StatsError::TooFewObservations { needed: 3, got: n });
    }
    if n > MAX_EXACT_N {
        warn!(n, "shapiro-wilk p-value may be inaccurate above 5000 observations");
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let range = x[n - 1] - x[0];
    if !(range > f64::EPSILON * x[n - 1].abs().max(1.0)) {
        return Err(StatsError::ZeroRange);
    }

    let a = coefficients(n)?;

    // W = (Σ a_i (x_(n+1-i) - x_(i)))² / Σ (x - x̄)²
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum::<f64>()
        .powi(2);
    let m = mean(&x);
    let ss: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
    let w = (numerator / ss).min(1.0);

    let p_value = p_value(w, n)?;
    Ok(ShapiroWilk {
        n,
        statistic: w,
        p_value,
    })
}

/// Upper-half coefficients a_1 ≥ a_2 ≥ … ≥ a_{n/2}, applied to the
/// difference between the i-th largest and i-th smallest observation.
fn coefficients(n: usize) -> Result<Vec<f64>, StatsError> {
    let half = n / 2;
    if n == 3 {
        return Ok(vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    let normal = standard_normal()?;
    let an = n as f64;
    // lower-tail expected normal order statistics, negative
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let mut a = vec![0.0; half];
    a[0] = poly(&C1, rsn) - m[0] / ssumm2;

    let (first_scaled, fac) = if n > 5 {
        a[1] = poly(&C2, rsn) - m[1] / ssumm2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a[0].powi(2) - 2.0 * a[1].powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a[0].powi(2))).sqrt();
        (1, fac)
    };
    for i in first_scaled..half {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

fn p_value(w: f64, n: usize) -> Result<f64, StatsError> {
    if n == 3 {
        // exact distribution of W for three observations
        let pi6 = 6.0 / std::f64::consts::PI;
        let stqr = std::f64::consts::FRAC_PI_3;
        return Ok((pi6 * (w.sqrt().asin() - stqr)).clamp(0.0, 1.0));
    }
    if w >= 1.0 {
        return Ok(1.0);
    }

    let an = n as f64;
    let mut w1 = (1.0 - w).ln();
    let (mu, sigma) = if n <= 11 {
        let gamma = poly(&G, an);
        if w1 >= gamma {
            return Ok(1e-99);
        }
        w1 = -(gamma - w1).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    let normal = standard_normal()?;
    Ok(normal.sf((w1 - mu) / sigma))
}
