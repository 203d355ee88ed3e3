use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{
    describe::{mean, sample_variance},
    StatsError,
};

/// Two-sided Welch's t-test (unequal variances).
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct WelchTTest {
    pub statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    pub p_value: f64,
    pub mean_a: f64,
    pub mean_b: f64,
}

impl WelchTTest {
    /// Equal means are rejected when `p < alpha`.
    pub fn rejects_equal_means(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<WelchTTest, StatsError> {
    for s in [a, b] {
        if s.len() < 2 {
            return Err(StatsError::TooFewObservations {
                needed: 2,
                got: s.len(),
            });
        }
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (mean_a, mean_b) = (mean(a), mean(b));
    let (va, vb) = (sample_variance(a) / na, sample_variance(b) / nb);
    let se2 = va + vb;
    let diff = mean_a - mean_b;

    // both samples constant: the difference is either certain or absent
    if se2 == 0.0 {
        let (statistic, p_value) = if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        };
        return Ok(WelchTTest {
            statistic,
            df: na + nb - 2.0,
            p_value,
            mean_a,
            mean_b,
        });
    }

    let statistic = diff / se2.sqrt();
    let df = se2.powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));
    let t = StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = (2.0 * t.sf(statistic.abs())).min(1.0);

    Ok(WelchTTest {
        statistic,
        df,
        p_value,
        mean_a,
        mean_b,
    })
}
