//! Mean and standard-error aggregation
//!
//! Every aggregate in the crate uses the sample standard deviation (n - 1
//! divisor). With fewer than two samples the standard error is zero.

use serde::{Deserialize, Serialize};

/// Mean and standard error of a set of scalar samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    pub mean: f64,
    pub stderr: f64,
    /// Number of samples behind the estimate
    pub count: usize,
}

impl Observable {
    /// Aggregate `samples`; `None` when there are none.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mean = mean(samples)?;
        let stderr = standard_error(samples).unwrap_or(0.0);
        Some(Self {
            mean,
            stderr,
            count: samples.len(),
        })
    }

    /// `(mean, stderr)`, or `(0.0, 0.0)` for no data.
    pub fn or_zero(observable: Option<Self>) -> (f64, f64) {
        observable.map_or((0.0, 0.0), |o| (o.mean, o.stderr))
    }
}

/// Arithmetic mean
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation, `None` below two samples
pub fn sample_std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let m = mean(samples)?;
    let sum_sq: f64 = samples.iter().map(|&v| (v - m) * (v - m)).sum();
    Some((sum_sq / (samples.len() - 1) as f64).sqrt())
}

/// Standard error of the mean, `None` below two samples
pub fn standard_error(samples: &[f64]) -> Option<f64> {
    sample_std_dev(samples).map(|sd| sd / (samples.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_sample_has_zero_stderr() {
        let o = Observable::from_samples(&[2.0]).unwrap();
        assert_eq!(o.mean, 2.0);
        assert_eq!(o.stderr, 0.0);
        assert_eq!(o.count, 1);
    }

    #[test]
    fn test_sample_divisor() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        // variance with n-1: 5/3
        let sd = sample_std_dev(&samples).unwrap();
        assert_relative_eq!(sd, (5.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        let o = Observable::from_samples(&samples).unwrap();
        assert_relative_eq!(o.mean, 2.5);
        assert_relative_eq!(o.stderr, sd / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(Observable::from_samples(&[]).is_none());
        assert_eq!(Observable::or_zero(None), (0.0, 0.0));
    }
}
