//! Synthetic corridor trajectories
//!
//! Generates seeded trajectory logs in the simulator's text format, with
//! randomly dropped samples, for demos and tests.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::record::TrajectoryRecord;
use crate::QflowError;

/// Synthetic corridor configuration
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Sampling step [s]
    pub dt: f64,
    /// Total simulated time [s]
    pub duration: f64,
    /// Particles injected per second
    pub inflow: f64,
    /// Corridor length [m]
    pub length: f64,
    /// Corridor width [m]
    pub width: f64,
    /// Mean desired speed [m/s]
    pub speed: f64,
    /// Speed spread [m/s]
    pub sigma_speed: f64,
    /// Probability that one observation is missing from the log
    pub drop_probability: f64,
    pub r_min: f64,
    pub r_max: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 33.0,
            duration: 20.0,
            inflow: 2.0,
            length: 16.0,
            width: 3.6,
            speed: 1.5,
            sigma_speed: 0.2,
            drop_probability: 0.05,
            r_min: 0.1,
            r_max: 0.35,
            seed: 42,
        }
    }
}

struct Walker {
    id: u32,
    start: f64,
    direction: f64,
    speed: f64,
    lane: f64,
}

/// Generate a trajectory log.
///
/// Particles enter alternately from the left and the right and walk straight
/// to the opposite end; a particle leaves the log once it crosses the end.
pub fn generate(config: &SynthConfig) -> Result<Vec<TrajectoryRecord>, QflowError> {
    if !(config.dt > 0.0 && config.inflow > 0.0 && config.width > 0.0) {
        return Err(QflowError::InvalidConfig(
            "dt, inflow and width must be positive".to_string(),
        ));
    }
    if !(config.r_min <= config.r_max) {
        return Err(QflowError::InvalidConfig(
            "r_min must not exceed r_max".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.drop_probability) {
        return Err(QflowError::InvalidConfig(format!(
            "drop_probability must lie in [0, 1], got {}",
            config.drop_probability
        )));
    }
    let mut rng = StdRng::seed_from_u64(config.seed);
    let speed_dist = Normal::new(config.speed, config.sigma_speed)
        .map_err(|e| QflowError::InvalidConfig(format!("speed distribution: {e}")))?;

    let count = (config.duration * config.inflow).floor().max(0.0) as u32;
    let walkers: Vec<Walker> = (0..count)
        .map(|id| Walker {
            id: id + 1,
            start: id as f64 / config.inflow,
            direction: if id % 2 == 0 { 1.0 } else { -1.0 },
            speed: speed_dist.sample(&mut rng).abs().max(0.1),
            lane: rng.gen_range(0.1 * config.width..0.9 * config.width),
        })
        .collect();

    let steps = (config.duration / config.dt).ceil() as usize;
    let mut records = Vec::new();

    for step in 0..=steps {
        let t = step as f64 * config.dt;
        for walker in &walkers {
            if t < walker.start {
                continue;
            }
            let travelled = walker.speed * (t - walker.start);
            if travelled > config.length {
                continue;
            }
            if rng.gen_bool(config.drop_probability) {
                continue;
            }
            let x = if walker.direction > 0.0 {
                travelled
            } else {
                config.length - travelled
            };
            records.push(TrajectoryRecord {
                line: records.len() + 1,
                t,
                id: walker.id as f64,
                x,
                y: walker.lane,
                vx: walker.direction * walker.speed,
                vy: 0.0,
                radius: rng.gen_range(config.r_min..=config.r_max),
            });
        }
    }

    Ok(records)
}

/// Write records in the `t id x y vx vy radius` text format.
pub fn write_trajectory(path: &Path, records: &[TrajectoryRecord]) -> Result<(), QflowError> {
    let mut out = BufWriter::new(File::create(path)?);
    for r in records {
        writeln!(
            out,
            "{} {} {} {} {} {} {}",
            r.t, r.id, r.x, r.y, r.vx, r.vy, r.radius
        )?;
    }
    out.flush()?;
    Ok(())
}
