//! Welch's unequal-variance two-sample t-test.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::AnalyzerResult;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Fewer observations than this leave the sample variance undefined.
pub const MIN_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

impl WelchTest {
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

/// Mean and Bessel-corrected variance.
pub fn mean_and_variance(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let variance = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

/// Tests `first` against `second`; a positive statistic means `first` has the
/// larger mean. Returns `None` when either sample is too small.
pub fn welch_t_test(first: &[f64], second: &[f64]) -> AnalyzerResult<Option<WelchTest>> {
    if first.len() < MIN_OBSERVATIONS || second.len() < MIN_OBSERVATIONS {
        return Ok(None);
    }

    let (first_mean, first_var) = mean_and_variance(first);
    let (second_mean, second_var) = mean_and_variance(second);
    let first_se = first_var / first.len() as f64;
    let second_se = second_var / second.len() as f64;
    let combined_se = first_se + second_se;
    let difference = first_mean - second_mean;

    if combined_se == 0.0 {
        // Both samples are constant.
        let test = if difference == 0.0 {
            WelchTest {
                t_statistic: f64::NAN,
                degrees_of_freedom: f64::NAN,
                p_value: f64::NAN,
            }
        } else {
            WelchTest {
                t_statistic: f64::INFINITY.copysign(difference),
                degrees_of_freedom: f64::NAN,
                p_value: 0.0,
            }
        };
        return Ok(Some(test));
    }

    let t_statistic = difference / combined_se.sqrt();
    let degrees_of_freedom = combined_se.powi(2)
        / (first_se.powi(2) / (first.len() as f64 - 1.0)
            + second_se.powi(2) / (second.len() as f64 - 1.0));

    let distribution = StudentsT::new(0.0, 1.0, degrees_of_freedom)?;
    let p_value = (2.0 * distribution.cdf(-t_statistic.abs())).min(1.0);

    Ok(Some(WelchTest {
        t_statistic,
        degrees_of_freedom,
        p_value,
    }))
}
