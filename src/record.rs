//! Trajectory record format
//!
//! One line is one (time, particle) observation with exactly seven
//! whitespace-separated numeric fields: `t id x y vx vy radius`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::QflowError;

/// Field order of a trajectory line.
pub const FIELDS: [&str; 7] = ["t", "id", "x", "y", "vx", "vy", "radius"];

pub type ParticleId = i64;

/// One observation of one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// 1-based line number in the source
    pub line: usize,
    /// Time [s]
    pub t: f64,
    /// Particle id, float-encoded in the source format
    pub id: f64,
    /// Position [m]
    pub x: f64,
    pub y: f64,
    /// Simulator-reported velocity [m/s]
    pub vx: f64,
    pub vy: f64,
    /// Current interaction radius [m]
    pub radius: f64,
}

impl TrajectoryRecord {
    /// Integer particle id, or `None` when the encoded id is not finite.
    pub fn particle_id(&self) -> Option<ParticleId> {
        self.id.is_finite().then(|| self.id as ParticleId)
    }

    pub fn time_key(&self) -> Option<TimeKey> {
        TimeKey::from_seconds(self.t)
    }
}

/// A time rounded to microsecond precision.
///
/// Simulator time stepping accumulates float jitter, so lookups by time go
/// through this key instead of raw `f64` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeKey(i64);

impl TimeKey {
    /// Keys per second.
    pub const RESOLUTION: f64 = 1.0e6;

    pub fn from_seconds(t: f64) -> Option<Self> {
        if !t.is_finite() {
            return None;
        }
        Some(Self((t * Self::RESOLUTION).round() as i64))
    }

    pub fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub fn micros(self) -> i64 {
        self.0
    }

    pub fn seconds(self) -> f64 {
        self.0 as f64 / Self::RESOLUTION
    }

    /// `round(t + dt, 6)` as a key.
    pub fn offset(self, dt: f64) -> Option<Self> {
        Self::from_seconds(self.seconds() + dt)
    }
}

/// How lines with the wrong number of fields are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    /// Skip without a trace
    #[default]
    Lenient,
    /// Skip and log the line number
    Diagnose,
    /// Fail the read
    Strict,
}

/// Parses one line.
///
/// Blank lines and lines with a field count other than seven give
/// `Ok(None)`; callers apply their [`LineMode`]. A seven-field line with a
/// non-numeric token is always an error.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<TrajectoryRecord>, QflowError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != FIELDS.len() {
        return Ok(None);
    }

    let mut values = [0.0_f64; 7];
    for (idx, token) in tokens.iter().enumerate() {
        values[idx] = token.parse::<f64>().map_err(|_| QflowError::BadField {
            line: line_no,
            field: FIELDS[idx],
            token: (*token).to_string(),
        })?;
    }

    let [t, id, x, y, vx, vy, radius] = values;
    Ok(Some(TrajectoryRecord {
        line: line_no,
        t,
        id,
        x,
        y,
        vx,
        vy,
        radius,
    }))
}

/// Reads every well-formed record from `reader`.
pub fn parse_records<R: BufRead>(
    reader: R,
    mode: LineMode,
) -> Result<Vec<TrajectoryRecord>, QflowError> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;

        if let Some(record) = parse_line(&line, line_no)? {
            records.push(record);
            continue;
        }

        let found = line.split_whitespace().count();
        if found == 0 {
            continue;
        }

        match mode {
            LineMode::Lenient => {}
            LineMode::Diagnose => {
                tracing::warn!(line = line_no, found, "skipping malformed trajectory line");
            }
            LineMode::Strict => {
                return Err(QflowError::FieldCount {
                    line: line_no,
                    found,
                });
            }
        }
        skipped += 1;
    }

    if skipped > 0 {
        tracing::debug!(skipped, kept = records.len(), "finished reading trajectory");
    }

    Ok(records)
}

/// Reads a trajectory file from disk.
pub fn read_records(path: &Path, mode: LineMode) -> Result<Vec<TrajectoryRecord>, QflowError> {
    let file = File::open(path)?;
    parse_records(BufReader::new(file), mode)
}
