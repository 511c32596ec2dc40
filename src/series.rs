//! Per-particle position series

use std::collections::btree_map::{self, BTreeMap};
use std::path::Path;

use crate::record::{read_records, LineMode, ParticleId, TimeKey, TrajectoryRecord};
use crate::QflowError;

/// `x` positions of one particle keyed by rounded time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSeries {
    samples: BTreeMap<TimeKey, f64>,
}

impl ParticleSeries {
    /// Insert a sample; a later sample at the same key replaces the earlier one.
    pub fn insert(&mut self, t: TimeKey, x: f64) {
        self.samples.insert(t, x);
    }

    pub fn get(&self, t: TimeKey) -> Option<f64> {
        self.samples.get(&t).copied()
    }

    /// Samples in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeKey, f64)> + '_ {
        self.samples.iter().map(|(t, x)| (*t, *x))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// All particle series of one trajectory file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    particles: BTreeMap<ParticleId, ParticleSeries>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group records by particle id.
    ///
    /// Records without a finite time are dropped. A non-finite particle id
    /// is an error.
    pub fn from_records(records: &[TrajectoryRecord]) -> Result<Self, QflowError> {
        let mut set = Self::new();
        for record in records {
            set.push(record)?;
        }
        Ok(set)
    }

    /// Read a trajectory file and group it.
    pub fn load(path: &Path, mode: LineMode) -> Result<Self, QflowError> {
        let records = read_records(path, mode)?;
        Self::from_records(&records)
    }

    pub fn push(&mut self, record: &TrajectoryRecord) -> Result<(), QflowError> {
        let id = record
            .particle_id()
            .ok_or(QflowError::InvalidParticleId { line: record.line })?;
        if let Some(t) = record.time_key() {
            self.particles.entry(id).or_default().insert(t, record.x);
        }
        Ok(())
    }

    pub fn get(&self, id: ParticleId) -> Option<&ParticleSeries> {
        self.particles.get(&id)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ParticleId, ParticleSeries> {
        self.particles.iter()
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Total number of samples across all particles.
    pub fn sample_count(&self) -> usize {
        self.particles.values().map(ParticleSeries::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_records;

    #[test]
    fn test_groups_by_particle() {
        let text = "0 1 0.0 0 1 0 0.1\n0 2 5.0 0 -1 0 0.1\n1 1 1.0 0 1 0 0.1\n";
        let records = parse_records(text.as_bytes(), LineMode::Lenient).unwrap();
        let set = SeriesSet::from_records(&records).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sample_count(), 3);
        assert_eq!(set.get(1).unwrap().len(), 2);
        assert_eq!(set.get(2).unwrap().get(TimeKey::from_micros(0)), Some(5.0));
    }

    #[test]
    fn test_duplicate_time_keeps_last() {
        let text = "1.0000001 7 1.0 0 1 0 0.1\n1.0 7 2.0 0 1 0 0.1\n";
        let records = parse_records(text.as_bytes(), LineMode::Lenient).unwrap();
        let set = SeriesSet::from_records(&records).unwrap();
        let series = set.get(7).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(TimeKey::from_micros(1_000_000)), Some(2.0));
    }

    #[test]
    fn test_non_finite_id_is_rejected() {
        let text = "0 1 0 0 1 0 0.1\n0 inf 0 0 1 0 0.1\n";
        let records = parse_records(text.as_bytes(), LineMode::Lenient).unwrap();
        let err = SeriesSet::from_records(&records).unwrap_err();
        assert!(matches!(err, QflowError::InvalidParticleId { line: 2 }));
    }
}
