//! Per-timestep velocity aggregation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::estimator::{lag_samples, LagSample, LagWindow};
use crate::record::TimeKey;
use crate::series::SeriesSet;
use crate::stats::Observable;
use crate::QflowError;

/// `|vx|` statistics of the samples landing on one `t1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestepStat {
    pub t: f64,
    pub key: TimeKey,
    pub observable: Observable,
}

/// Collects lagged samples grouped by their end time `t1`.
///
/// Feeding several files into one accumulator gives the ensemble average
/// over repeated runs.
#[derive(Debug, Clone, Default)]
pub struct TimestepAccumulator {
    by_time: BTreeMap<TimeKey, Vec<f64>>,
}

impl TimestepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: &LagSample) {
        self.by_time.entry(sample.t1).or_default().push(sample.v);
    }

    pub fn extend<'a, I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = &'a LagSample>,
    {
        for sample in samples {
            self.push(sample);
        }
    }

    /// Add every lagged sample of one file.
    pub fn add_series(
        &mut self,
        series: &SeriesSet,
        window: &LagWindow,
    ) -> Result<(), QflowError> {
        self.extend(&lag_samples(series, window)?);
        Ok(())
    }

    /// Number of samples collected so far.
    pub fn sample_count(&self) -> usize {
        self.by_time.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_time.is_empty()
    }

    /// Raw samples of one timestep.
    pub fn samples_at(&self, key: TimeKey) -> Option<&[f64]> {
        self.by_time.get(&key).map(Vec::as_slice)
    }

    /// Statistics per timestep in ascending time order.
    pub fn finish(&self) -> Vec<TimestepStat> {
        self.by_time
            .iter()
            .filter_map(|(key, speeds)| {
                Observable::from_samples(speeds).map(|observable| TimestepStat {
                    t: key.seconds(),
                    key: *key,
                    observable,
                })
            })
            .collect()
    }
}

/// Per-timestep statistics of a single file.
pub fn per_timestep(
    series: &SeriesSet,
    window: &LagWindow,
) -> Result<Vec<TimestepStat>, QflowError> {
    let mut acc = TimestepAccumulator::new();
    acc.add_series(series, window)?;
    Ok(acc.finish())
}
