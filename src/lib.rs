//! qflow - corridor particle-flow observables
//!
//! Reads trajectory logs (`t id x y vx vy radius`, one observation per line)
//! and turns them into aggregate observables: the displacement-based mean
//! absolute drift velocity, the simulation duration, and how both evolve
//! across the inflow parameter `Qin` and across time.

pub mod estimator;
pub mod final_time;
pub mod naming;
pub mod record;
pub mod series;
pub mod stats;
pub mod sweep;
pub mod synth;
pub mod timestep;

use thiserror::Error;

// Re-export main types
pub use estimator::{lag_samples, mean_abs_vx, pooled_abs_vx, LagSample, LagWindow};
pub use final_time::last_simulation_time;
pub use record::{read_records, LineMode, ParticleId, TimeKey, TrajectoryRecord};
pub use series::SeriesSet;
pub use stats::Observable;
pub use sweep::{
    aggregate, timestep_ensemble, EmptyGroupPolicy, EmptyRunPolicy, SweepMetric, SweepOptions,
    SweepPoint, SweepSource,
};
pub use timestep::{per_timestep, TimestepAccumulator, TimestepStat};

#[derive(Debug, Error)]
pub enum QflowError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: field `{field}` is not a number: {token:?}")]
    BadField {
        line: usize,
        field: &'static str,
        token: String,
    },
    #[error("line {line}: expected 7 fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: particle id is not a finite number")]
    InvalidParticleId { line: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
