//! Numeric helpers for frequency-mode scoring.

use std::f64::consts::SQRT_2;

use crate::constants::FLAT_FREQUENCY_SCORE;

// Abramowitz & Stegun 7.1.26, absolute error below 1.5e-7
const ERF_P: f64 = 0.327_591_1;
const ERF_A1: f64 = 0.254_829_592;
const ERF_A2: f64 = -0.284_496_736;
const ERF_A3: f64 = 1.421_413_741;
const ERF_A4: f64 = -1.453_152_027;
const ERF_A5: f64 = 1.061_405_429;

/// Spread below which a score set is treated as constant.
const MIN_STD: f64 = 1e-12;

/// Error function.
#[must_use]
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + ERF_P * x);
    let poly = ((((ERF_A5 * t + ERF_A4) * t + ERF_A3) * t + ERF_A2) * t + ERF_A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Cumulative distribution function of the standard normal distribution.
#[must_use]
pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[must_use]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Z-scores every value against the whole set and maps it through the
/// standard normal CDF.
///
/// A set without spread maps every value to `0.5`.
#[must_use]
pub fn normalized_ranks(values: &[f64]) -> Vec<f64> {
    let std = population_std(values);
    if std < MIN_STD {
        return vec![FLAT_FREQUENCY_SCORE; values.len()];
    }
    let mean = mean(values);
    values
        .iter()
        .map(|v| standard_normal_cdf((v - mean) / std))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_reference_points() {
        assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((standard_normal_cdf(1.0) - 0.841_344_7).abs() < 1e-6);
        assert!((standard_normal_cdf(-1.0) - 0.158_655_3).abs() < 1e-6);
        assert!((standard_normal_cdf(1.96) - 0.975_002_1).abs() < 1e-6);
    }

    #[test]
    fn test_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((population_std(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_ranks() {
        let ranks = normalized_ranks(&[0.75, 0.25]);
        // z-scores are +1 and -1
        assert!((ranks[0] - 0.841_344_7).abs() < 1e-6);
        assert!((ranks[1] - 0.158_655_3).abs() < 1e-6);
    }

    #[test]
    fn test_flat_scores() {
        assert_eq!(normalized_ranks(&[0.1, 0.1, 0.1]), vec![0.5, 0.5, 0.5]);
        assert!(normalized_ranks(&[]).is_empty());
    }
}
