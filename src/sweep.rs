//! Parameter-sweep aggregation across `Qin` values and repeated runs

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::estimator::{mean_abs_vx, LagWindow};
use crate::final_time::last_simulation_time;
use crate::naming::{qin_from_file_name, qin_from_prefix, run_path};
use crate::record::LineMode;
use crate::series::SeriesSet;
use crate::stats::Observable;
use crate::timestep::{TimestepAccumulator, TimestepStat};
use crate::QflowError;

/// Where the runs of one `Qin` value live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepSource {
    /// Run files `{prefix}{run}.txt`
    Prefix(String),
    /// A single run file
    File(PathBuf),
}

impl SweepSource {
    pub fn qin(&self) -> Option<f64> {
        match self {
            Self::Prefix(prefix) => qin_from_prefix(prefix),
            Self::File(path) => qin_from_file_name(path),
        }
    }

    /// Candidate run files of this source.
    pub fn run_files(&self, runs: &RangeInclusive<u32>) -> Vec<PathBuf> {
        match self {
            Self::Prefix(prefix) => runs.clone().map(|run| run_path(prefix, run)).collect(),
            Self::File(path) => vec![path.clone()],
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Prefix(prefix) => prefix.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Per-run scalar that is averaged across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMetric {
    /// Pooled displacement-based `<|vx|>` of the run
    MeanAbsVx(LagWindow),
    /// Last simulation time of the run
    FinalTime,
}

impl SweepMetric {
    /// Scalar of one run file, `None` when the file holds no usable data.
    pub fn measure(&self, path: &Path, mode: LineMode) -> Result<Option<f64>, QflowError> {
        match self {
            Self::MeanAbsVx(window) => Ok(mean_abs_vx(path, window, mode)?.map(|o| o.mean)),
            Self::FinalTime => last_simulation_time(path),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MeanAbsVx(_) => "mean_abs_vx",
            Self::FinalTime => "final_time",
        }
    }
}

/// What to do with an existing run file that yields no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyRunPolicy {
    /// Count the run as `0.0` in its group's mean
    #[default]
    Zero,
    /// Leave the run out of its group
    Skip,
}

/// What to do with a `Qin` value none of whose runs produced data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyGroupPolicy {
    /// Keep the point and report it as `(Qin, 0, 0)`
    #[default]
    Zero,
    /// Drop the point
    Omit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOptions {
    pub runs: RangeInclusive<u32>,
    pub line_mode: LineMode,
    pub empty_runs: EmptyRunPolicy,
    pub empty_groups: EmptyGroupPolicy,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            runs: 1..=10,
            line_mode: LineMode::Lenient,
            empty_runs: EmptyRunPolicy::Zero,
            empty_groups: EmptyGroupPolicy::Zero,
        }
    }
}

impl SweepOptions {
    /// Empty-data handling suited to `metric`.
    ///
    /// A run without a final time has no meaningful numeric stand-in, so
    /// final-time sweeps skip such runs and drop empty groups.
    pub fn for_metric(metric: &SweepMetric) -> Self {
        match metric {
            SweepMetric::MeanAbsVx(_) => Self::default(),
            SweepMetric::FinalTime => Self {
                empty_runs: EmptyRunPolicy::Skip,
                empty_groups: EmptyGroupPolicy::Omit,
                ..Self::default()
            },
        }
    }
}

/// Aggregate of one `Qin` value across its runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub qin: f64,
    /// `None` when no run produced data
    pub observable: Option<Observable>,
}

impl SweepPoint {
    /// `(mean, stderr)` with no-data points at zero.
    pub fn values(&self) -> (f64, f64) {
        Observable::or_zero(self.observable)
    }

    /// Number of runs behind the point.
    pub fn runs(&self) -> usize {
        self.observable.map_or(0, |o| o.count)
    }
}

/// Run every source through `metric` and aggregate per `Qin`.
///
/// Missing run files and unparseable `Qin` values are logged and skipped.
/// Runs that exist but yield no value follow `options.empty_runs`. Sources
/// sharing a `Qin` value are pooled. The result is strictly
/// ascending in `Qin`.
pub fn aggregate(
    sources: &[SweepSource],
    metric: &SweepMetric,
    options: &SweepOptions,
) -> Result<Vec<SweepPoint>, QflowError> {
    if let SweepMetric::MeanAbsVx(window) = metric {
        window.validate()?;
    }

    let mut groups: Vec<(f64, Vec<f64>)> = Vec::with_capacity(sources.len());

    for source in sources {
        let Some(qin) = source.qin() else {
            tracing::warn!(source = %source.label(), "could not extract Qin, skipping");
            continue;
        };

        let mut values = Vec::new();
        for path in source.run_files(&options.runs) {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "missing file, skipping");
                continue;
            }
            match metric.measure(&path, options.line_mode)? {
                Some(value) => values.push(value),
                None => match options.empty_runs {
                    EmptyRunPolicy::Zero => {
                        tracing::warn!(
                            path = %path.display(),
                            metric = metric.name(),
                            "no data in run, counted as zero"
                        );
                        values.push(0.0);
                    }
                    EmptyRunPolicy::Skip => {
                        tracing::warn!(
                            path = %path.display(),
                            metric = metric.name(),
                            "no data in run, skipped"
                        );
                    }
                },
            }
        }
        groups.push((qin, values));
    }

    groups.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, Vec<f64>)> = Vec::with_capacity(groups.len());
    for (qin, values) in groups {
        match merged.last_mut() {
            Some((last_qin, last_values)) if *last_qin == qin => last_values.extend(values),
            _ => merged.push((qin, values)),
        }
    }

    let mut points = Vec::with_capacity(merged.len());
    for (qin, values) in merged {
        let observable = Observable::from_samples(&values);
        if observable.is_none() {
            tracing::warn!(qin, "no data for Qin");
            if options.empty_groups == EmptyGroupPolicy::Omit {
                continue;
            }
        }
        points.push(SweepPoint { qin, observable });
    }

    Ok(points)
}

/// Per-timestep `|vx|` pooled over every existing run file of `prefix`.
pub fn timestep_ensemble(
    prefix: &str,
    runs: &RangeInclusive<u32>,
    window: &LagWindow,
    mode: LineMode,
) -> Result<Vec<TimestepStat>, QflowError> {
    window.validate()?;
    let mut acc = TimestepAccumulator::new();

    for run in runs.clone() {
        let path = run_path(prefix, run);
        if !path.exists() {
            tracing::warn!(path = %path.display(), "missing file, skipping");
            continue;
        }
        let series = SeriesSet::load(&path, mode)?;
        acc.add_series(&series, window)?;
    }

    Ok(acc.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    fn prefix(dir: &Path, qin: &str) -> SweepSource {
        SweepSource::Prefix(format!("{}/output_Qin_{qin}_", dir.display()))
    }

    #[test]
    fn test_final_time_sweep_averages_runs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "output_Qin_2.00_1.txt", "0 1 0 0 0 0 0\n10 1 0 0 0 0 0\n");
        write(dir.path(), "output_Qin_2.00_2.txt", "0 1 0 0 0 0 0\n14 1 0 0 0 0 0\n");
        write(dir.path(), "output_Qin_1.00_1.txt", "0 1 0 0 0 0 0\n30 1 0 0 0 0 0\n");

        let sources = vec![prefix(dir.path(), "2.00"), prefix(dir.path(), "1.00")];
        let options = SweepOptions {
            runs: 1..=3,
            ..SweepOptions::default()
        };
        let points = aggregate(&sources, &SweepMetric::FinalTime, &options).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].qin, 1.0);
        assert_eq!(points[0].values(), (30.0, 0.0));
        assert_eq!(points[1].qin, 2.0);
        let (mean, stderr) = points[1].values();
        assert_eq!(mean, 12.0);
        // sd(n-1) of {10, 14} is 2*sqrt(2), over sqrt(2)
        assert!((stderr - 2.0).abs() < 1e-12);
        assert_eq!(points[1].runs(), 2);
    }

    #[test]
    fn test_empty_group_policy() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "output_Qin_1.00_1.txt", "0 1 0 0 1 0 0\n1 1 1 0 1 0 0\n");
        let sources = vec![prefix(dir.path(), "1.00"), prefix(dir.path(), "5.00")];
        let metric = SweepMetric::MeanAbsVx(LagWindow::default());

        let zero = aggregate(&sources, &metric, &SweepOptions::default()).unwrap();
        assert_eq!(zero.len(), 2);
        assert_eq!(zero[1].qin, 5.0);
        assert!(zero[1].observable.is_none());
        assert_eq!(zero[1].values(), (0.0, 0.0));

        let options = SweepOptions {
            empty_groups: EmptyGroupPolicy::Omit,
            ..SweepOptions::default()
        };
        let omitted = aggregate(&sources, &metric, &options).unwrap();
        assert_eq!(omitted.len(), 1);
        assert_eq!(omitted[0].values(), (1.0, 0.0));
    }

    #[test]
    fn test_bad_qin_is_skipped_and_duplicates_merge() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a_Qin_3.txt");
        let b = dir.path().join("b_Qin_3.txt");
        fs::write(&a, "5 1 0 0 0 0 0\n").unwrap();
        fs::write(&b, "7 1 0 0 0 0 0\n").unwrap();

        let sources = vec![
            SweepSource::File(a),
            SweepSource::Prefix("no_qin_here".to_string()),
            SweepSource::File(b),
        ];
        let points =
            aggregate(&sources, &SweepMetric::FinalTime, &SweepOptions::default()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].qin, 3.0);
        assert_eq!(points[0].runs(), 2);
        assert_eq!(points[0].values().0, 6.0);
    }

    #[test]
    fn test_timestep_ensemble_skips_missing_runs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "output_Qin_4.00_1.txt", "0 1 0 0 1 0 0\n1 1 2 0 1 0 0\n");
        write(dir.path(), "output_Qin_4.00_3.txt", "0 1 0 0 1 0 0\n1 1 4 0 1 0 0\n");
        let prefix = format!("{}/output_Qin_4.00_", dir.path().display());

        let stats =
            timestep_ensemble(&prefix, &(1..=3), &LagWindow::default(), LineMode::Lenient)
                .unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].t, 1.0);
        assert_eq!(stats[0].observable.count, 2);
        assert_eq!(stats[0].observable.mean, 3.0);
    }

    #[test]
    fn test_empty_runs_count_as_zero_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "output_Qin_1.00_1.txt", "0 1 0 0 2 0 0\n1 1 2 0 2 0 0\n");
        // a single row, so no lagged pair
        write(dir.path(), "output_Qin_1.00_2.txt", "0 1 0 0 2 0 0\n");
        let sources = vec![prefix(dir.path(), "1.00")];
        let metric = SweepMetric::MeanAbsVx(LagWindow::default());
        let options = SweepOptions {
            runs: 1..=2,
            ..SweepOptions::default()
        };

        let points = aggregate(&sources, &metric, &options).unwrap();
        assert_eq!(points[0].runs(), 2);
        let (mean, stderr) = points[0].values();
        assert_eq!(mean, 1.0);
        // sd(n-1) of {2, 0} is sqrt(2), over sqrt(2)
        assert!((stderr - 1.0).abs() < 1e-12);

        let skipping = SweepOptions {
            empty_runs: EmptyRunPolicy::Skip,
            ..options
        };
        let points = aggregate(&sources, &metric, &skipping).unwrap();
        assert_eq!(points[0].runs(), 1);
        assert_eq!(points[0].values(), (2.0, 0.0));
    }

    #[test]
    fn test_final_time_options_skip_and_omit() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "output_Qin_1.00_1.txt", "0 1 0 0 0 0 0\n8 1 0 0 0 0 0\n");
        write(dir.path(), "output_Qin_1.00_2.txt", "header only\n");
        write(dir.path(), "output_Qin_3.00_1.txt", "no times here\n");
        let sources = vec![prefix(dir.path(), "1.00"), prefix(dir.path(), "3.00")];
        let options = SweepOptions {
            runs: 1..=2,
            ..SweepOptions::for_metric(&SweepMetric::FinalTime)
        };

        let points = aggregate(&sources, &SweepMetric::FinalTime, &options).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].qin, 1.0);
        assert_eq!(points[0].runs(), 1);
        assert_eq!(points[0].values(), (8.0, 0.0));
    }
}
