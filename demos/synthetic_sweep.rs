//! Synthetic Sweep Example
//!
//! Writes seeded corridor trajectories for a few inflow rates and runs the
//! velocity and duration sweeps over them.

use std::fs;
use std::path::Path;

use qflow::synth::{generate, write_trajectory, SynthConfig};
use qflow::{aggregate, LagWindow, QflowError, SweepMetric, SweepOptions, SweepSource};

fn main() -> Result<(), QflowError> {
    println!("Running qflow synthetic sweep...\n");

    let out = Path::new("out");
    fs::create_dir_all(out)?;

    let qins = [1.0, 2.0, 4.0];
    let runs = 1..=3_u32;
    let mut sources = Vec::new();

    for (q_idx, &qin) in qins.iter().enumerate() {
        let prefix = format!("{}/output_Qin_{qin:.2}_", out.display());
        for run in runs.clone() {
            let config = SynthConfig {
                inflow: qin,
                duration: 40.0,
                seed: 1_000 * q_idx as u64 + run as u64,
                ..SynthConfig::default()
            };
            let path = format!("{prefix}{run}.txt");
            write_trajectory(Path::new(&path), &generate(&config)?)?;
        }
        sources.push(SweepSource::Prefix(prefix));
    }

    let options = SweepOptions {
        runs,
        ..SweepOptions::default()
    };
    let window = LagWindow::new(1.0, 10.0, Some(40.0));

    let velocity = aggregate(&sources, &SweepMetric::MeanAbsVx(window), &options)?;
    for point in &velocity {
        let (m, e) = point.values();
        println!("Qin = {:.3} -> <|vx|> = {m:.4} ± {e:.4}", point.qin);
    }
    println!();

    let options = SweepOptions {
        runs: options.runs,
        ..SweepOptions::for_metric(&SweepMetric::FinalTime)
    };
    let durations = aggregate(&sources, &SweepMetric::FinalTime, &options)?;
    for point in &durations {
        let (m, e) = point.values();
        println!("Qin = {:.3} -> t_max = {m:.4} ± {e:.4} s", point.qin);
    }

    Ok(())
}
