//! Final simulation time of a trajectory file

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::QflowError;

/// Largest parseable first-column value in `reader`.
///
/// Only the first field of a line matters; the seven-field rule does not
/// apply here. `NaN` values never win.
pub fn last_time_in<R: BufRead>(reader: R) -> Result<Option<f64>, QflowError> {
    let mut max_t: Option<f64> = None;

    for line in reader.lines() {
        let line = line?;
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        let Ok(t) = first.parse::<f64>() else {
            continue;
        };
        if t.is_nan() {
            continue;
        }
        max_t = Some(max_t.map_or(t, |m| m.max(t)));
    }

    Ok(max_t)
}

/// Last simulation time of the file at `path`, `None` when no line carries
/// a parseable time.
pub fn last_simulation_time(path: &Path) -> Result<Option<f64>, QflowError> {
    let file = File::open(path)?;
    last_time_in(BufReader::new(file))
}
