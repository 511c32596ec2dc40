//! Displacement-based velocity estimator
//!
//! Velocities come from finite differences of `x` over a fixed lag `dt`.
//! A sample exists only when a particle was observed both at `t0` and at
//! exactly `round(t0 + dt, 6)`; gaps are never interpolated.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::record::{LineMode, ParticleId, TimeKey};
use crate::series::SeriesSet;
use crate::stats::Observable;
use crate::QflowError;

/// Lag and time window of the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagWindow {
    /// Finite-difference lag [s]
    pub dt: f64,
    /// Earliest admissible `t0` [s]
    pub t_start: f64,
    /// Window end [s]; `None` leaves it open
    pub t_end: Option<f64>,
}

impl Default for LagWindow {
    fn default() -> Self {
        Self {
            dt: 1.0,
            t_start: 0.0,
            t_end: None,
        }
    }
}

impl LagWindow {
    pub fn new(dt: f64, t_start: f64, t_end: Option<f64>) -> Self {
        Self { dt, t_start, t_end }
    }

    pub fn validate(&self) -> Result<(), QflowError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(QflowError::InvalidConfig(
                "dt must be finite and greater than zero".to_string(),
            ));
        }
        if !self.t_start.is_finite() {
            return Err(QflowError::InvalidConfig(
                "t_start must be finite".to_string(),
            ));
        }
        if let Some(t_end) = self.t_end {
            if t_end.is_nan() || t_end < self.t_start {
                return Err(QflowError::InvalidConfig(
                    "t_end must be greater than or equal to t_start".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// `t_start <= t0 <= t_end - dt`
    pub fn admits(&self, t0: f64) -> bool {
        if t0 < self.t_start {
            return false;
        }
        match self.t_end {
            Some(t_end) => t0 <= t_end - self.dt,
            None => true,
        }
    }
}

/// One finite-difference velocity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagSample {
    pub particle: ParticleId,
    pub t0: TimeKey,
    pub t1: TimeKey,
    /// `|x(t1) - x(t0)| / dt`
    pub v: f64,
}

/// Every lagged sample of every particle, particles in id order and times
/// ascending within a particle.
///
/// Fails with [`QflowError::InvalidConfig`] when `window` does not validate.
pub fn lag_samples(
    series: &SeriesSet,
    window: &LagWindow,
) -> Result<Vec<LagSample>, QflowError> {
    window.validate()?;
    let mut samples = Vec::new();

    for (&particle, track) in series.iter() {
        for (t0, x0) in track.iter() {
            if !window.admits(t0.seconds()) {
                continue;
            }
            let Some(t1) = t0.offset(window.dt) else {
                continue;
            };
            if let Some(x1) = track.get(t1) {
                samples.push(LagSample {
                    particle,
                    t0,
                    t1,
                    v: ((x1 - x0) / window.dt).abs(),
                });
            }
        }
    }

    Ok(samples)
}

/// Pooled mean and standard error of `|vx|` over all particles.
///
/// `None` when no particle has a pair of samples inside the window.
pub fn pooled_abs_vx(
    series: &SeriesSet,
    window: &LagWindow,
) -> Result<Option<Observable>, QflowError> {
    let speeds: Vec<f64> = lag_samples(series, window)?.iter().map(|s| s.v).collect();
    Ok(Observable::from_samples(&speeds))
}

/// Load `path` and estimate its pooled `|vx|`.
pub fn mean_abs_vx(
    path: &Path,
    window: &LagWindow,
    mode: LineMode,
) -> Result<Option<Observable>, QflowError> {
    window.validate()?;
    let series = SeriesSet::load(path, mode)?;
    pooled_abs_vx(&series, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_records;

    fn series_from(text: &str) -> SeriesSet {
        let records = parse_records(text.as_bytes(), LineMode::Lenient).unwrap();
        SeriesSet::from_records(&records).unwrap()
    }

    #[test]
    fn test_two_particle_example() {
        // particle 2 never has a lagged partner
        let series = series_from(
            "0 1 0.0 1.0 1 0 0.2\n\
             1 1 2.0 1.0 1 0 0.2\n\
             0 2 8.0 2.0 -1 0 0.2\n\
             0.5 2 7.5 2.0 -1 0 0.2\n",
        );
        let window = LagWindow::default();
        let samples = lag_samples(&series, &window).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].particle, 1);
        assert_eq!(samples[0].v, 2.0);

        let o = pooled_abs_vx(&series, &window).unwrap().unwrap();
        assert_eq!(o.mean, 2.0);
        assert_eq!(o.stderr, 0.0);
    }

    #[test]
    fn test_backward_motion_is_absolute() {
        let series = series_from("0 1 4.0 0 -2 0 0.2\n0.5 1 3.0 0 -2 0 0.2\n");
        let window = LagWindow::new(0.5, 0.0, None);
        let o = pooled_abs_vx(&series, &window).unwrap().unwrap();
        assert_eq!(o.mean, 2.0);
    }

    #[test]
    fn test_jittered_times_still_pair() {
        let series = series_from("0.30000000000000004 1 0.0 0 1 0 0.2\n1.3 1 1.5 0 1 0 0.2\n");
        let samples = lag_samples(&series, &LagWindow::default()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].v, 1.5);
    }

    #[test]
    fn test_window_bounds() {
        let series = series_from(
            "0 1 0 0 1 0 0.2\n1 1 1 0 1 0 0.2\n2 1 3 0 1 0 0.2\n3 1 6 0 1 0 0.2\n",
        );
        // t0 in [1, 3 - 1]
        let window = LagWindow::new(1.0, 1.0, Some(3.0));
        let speeds: Vec<f64> = lag_samples(&series, &window)
            .unwrap()
            .iter()
            .map(|s| s.v)
            .collect();
        assert_eq!(speeds, vec![2.0, 3.0]);
    }

    #[test]
    fn test_missing_lagged_sample_is_skipped() {
        let series = series_from("0 1 0 0 1 0 0.2\n2 1 5 0 1 0 0.2\n");
        assert!(pooled_abs_vx(&series, &LagWindow::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalid_windows() {
        assert!(LagWindow::new(0.0, 0.0, None).validate().is_err());
        assert!(LagWindow::new(1.0, f64::NAN, None).validate().is_err());
        assert!(LagWindow::new(1.0, 5.0, Some(1.0)).validate().is_err());
        assert!(LagWindow::new(1.0, 10.0, Some(40.0)).validate().is_ok());
    }

    #[test]
    fn test_zero_lag_is_rejected_before_sampling() {
        let series = series_from("0 1 0 0 1 0 0.2
1 1 1 0 1 0 0.2
");
        let window = LagWindow::new(0.0, 0.0, None);
        assert!(matches!(
            lag_samples(&series, &window),
            Err(QflowError::InvalidConfig(_))
        ));
        assert!(pooled_abs_vx(&series, &window).is_err());
    }
}
