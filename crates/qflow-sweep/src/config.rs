use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::Context;
use qflow::{EmptyGroupPolicy, EmptyRunPolicy, LagWindow, LineMode, SweepOptions, SweepSource};
use serde::{Deserialize, Serialize};

/// Empty-data handling of one `Qin` sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePolicy {
    /// Runs that exist but yield no value
    pub empty_runs: EmptyRunPolicy,
    /// `Qin` values without any data
    pub empty_groups: EmptyGroupPolicy,
}

impl Default for StagePolicy {
    fn default() -> Self {
        Self {
            empty_runs: EmptyRunPolicy::Zero,
            empty_groups: EmptyGroupPolicy::Zero,
        }
    }
}

impl StagePolicy {
    pub fn final_time() -> Self {
        Self {
            empty_runs: EmptyRunPolicy::Skip,
            empty_groups: EmptyGroupPolicy::Omit,
        }
    }
}

/// Runtime configuration of a `Qin` sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Run-file prefixes, e.g. `output_Qin_8.00_`
    pub prefixes: Vec<String>,
    /// Single-run files, e.g. `output_Qin_8.00.txt`
    pub files: Vec<PathBuf>,
    /// First run id appended to each prefix
    pub run_first: u32,
    /// Last run id (inclusive)
    pub run_last: u32,
    /// Window of the `<|vx|>`-vs-`Qin` sweep
    pub velocity_window: LagWindow,
    /// Window of the `<|vx|>`-vs-time curves
    pub timestep_window: LagWindow,
    pub line_mode: LineMode,
    pub velocity_policy: StagePolicy,
    pub final_time_policy: StagePolicy,
    pub enable_velocity: bool,
    pub enable_final_time: bool,
    pub enable_timestep: bool,
    /// Write PNG plots next to the CSV sidecars
    pub render_plots: bool,
    pub outdir: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            prefixes: (1..=10)
                .map(|q| format!("output_Qin_{:.2}_", q as f64))
                .collect(),
            files: Vec::new(),
            run_first: 1,
            run_last: 10,
            velocity_window: LagWindow::new(1.0, 10.0, Some(40.0)),
            timestep_window: LagWindow::new(1.0, 0.0, None),
            line_mode: LineMode::Lenient,
            velocity_policy: StagePolicy::default(),
            final_time_policy: StagePolicy::final_time(),
            enable_velocity: true,
            enable_final_time: true,
            enable_timestep: true,
            render_plots: true,
            outdir: PathBuf::from("."),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.run_first <= self.run_last,
            "run_first must be less than or equal to run_last"
        );
        anyhow::ensure!(
            !(self.prefixes.is_empty() && self.files.is_empty()),
            "at least one prefix or file is required"
        );
        anyhow::ensure!(
            self.enable_velocity || self.enable_final_time || self.enable_timestep,
            "at least one sweep must be enabled"
        );
        self.velocity_window
            .validate()
            .context("velocity_window")?;
        self.timestep_window
            .validate()
            .context("timestep_window")?;
        Ok(())
    }

    pub fn runs(&self) -> RangeInclusive<u32> {
        self.run_first..=self.run_last
    }

    /// Prefix sources first, then single files.
    pub fn sources(&self) -> Vec<SweepSource> {
        self.prefixes
            .iter()
            .cloned()
            .map(SweepSource::Prefix)
            .chain(self.files.iter().cloned().map(SweepSource::File))
            .collect()
    }

    pub fn options(&self, policy: &StagePolicy) -> SweepOptions {
        SweepOptions {
            runs: self.runs(),
            line_mode: self.line_mode,
            empty_runs: policy.empty_runs,
            empty_groups: policy.empty_groups,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}
