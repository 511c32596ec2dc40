use std::collections::BTreeMap;

use qflow::{TimeKey, TrajectoryRecord};

/// Rows sharing one time value.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position in the sorted sequence of distinct times
    pub index: usize,
    pub time: TimeKey,
    /// Rows in file order
    pub rows: Vec<TrajectoryRecord>,
}

/// Bucket `records` by time. Rows with a non-finite time are dropped.
pub fn group_frames(records: Vec<TrajectoryRecord>) -> Vec<Frame> {
    let mut buckets: BTreeMap<TimeKey, Vec<TrajectoryRecord>> = BTreeMap::new();
    for record in records {
        match record.time_key() {
            Some(key) => buckets.entry(key).or_default().push(record),
            None => tracing::warn!(line = record.line, "non-finite time, row dropped"),
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(index, (time, rows))| Frame { index, time, rows })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, t: f64, id: f64) -> TrajectoryRecord {
        TrajectoryRecord {
            line,
            t,
            id,
            x: 1.0,
            y: 1.0,
            vx: 1.0,
            vy: 0.0,
            radius: 0.2,
        }
    }

    #[test]
    fn frames_follow_sorted_unique_times() {
        let frames = group_frames(vec![
            row(1, 0.2, 1.0),
            row(2, 0.1, 1.0),
            row(3, 0.2, 2.0),
            row(4, f64::NAN, 3.0),
            row(5, 0.1000000001, 2.0),
        ]);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].index, 0);
        assert_eq!(frames[0].time, TimeKey::from_micros(100_000));
        assert_eq!(
            frames[0].rows.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![2, 5]
        );
        assert_eq!(frames[1].index, 1);
        assert_eq!(
            frames[1].rows.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn no_records_no_frames() {
        assert!(group_frames(Vec::new()).is_empty());
    }
}
