use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use qflow::{EmptyGroupPolicy, EmptyRunPolicy, LineMode};
use qflow_sweep::{run_sweep, SweepConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LineModeArg {
    Lenient,
    Diagnose,
    Strict,
}

impl From<LineModeArg> for LineMode {
    fn from(value: LineModeArg) -> Self {
        match value {
            LineModeArg::Lenient => LineMode::Lenient,
            LineModeArg::Diagnose => LineMode::Diagnose,
            LineModeArg::Strict => LineMode::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmptyGroupsArg {
    Zero,
    Omit,
}

impl From<EmptyGroupsArg> for EmptyGroupPolicy {
    fn from(value: EmptyGroupsArg) -> Self {
        match value {
            EmptyGroupsArg::Zero => EmptyGroupPolicy::Zero,
            EmptyGroupsArg::Omit => EmptyGroupPolicy::Omit,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmptyRunsArg {
    Zero,
    Skip,
}

impl From<EmptyRunsArg> for EmptyRunPolicy {
    fn from(value: EmptyRunsArg) -> Self {
        match value {
            EmptyRunsArg::Zero => EmptyRunPolicy::Zero,
            EmptyRunsArg::Skip => EmptyRunPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunRange {
    first: u32,
    last: u32,
}

/// Accepts `A..=B`, `A-B` or a single run id.
fn parse_runs(raw: &str) -> Result<RunRange, String> {
    let raw = raw.trim();
    let (first, last) = raw
        .split_once("..=")
        .or_else(|| raw.split_once('-'))
        .unwrap_or((raw, raw));
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid run id {s:?}: {e}"))
    };
    let range = RunRange {
        first: parse(first)?,
        last: parse(last)?,
    };
    if range.first > range.last {
        return Err(format!("empty run range {raw:?}"));
    }
    Ok(range)
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Drift velocity and simulation duration against inflow rate Qin"
)]
struct Cli {
    /// JSON config; `sweep.json` in the working directory is used if present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for CSV, PNG and summary files
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Run-file prefix such as `output_Qin_8.00_` (repeatable)
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Single-run file such as `output_Qin_8.00.txt` (repeatable)
    #[arg(long = "file")]
    files: Vec<PathBuf>,

    /// Run ids appended to each prefix, e.g. `1..=10`
    #[arg(long, value_parser = parse_runs)]
    runs: Option<RunRange>,

    /// Finite-difference lag in seconds (both windows)
    #[arg(long)]
    dt: Option<f64>,

    /// Start of the velocity window in seconds
    #[arg(long)]
    t_start: Option<f64>,

    /// End of the velocity window in seconds
    #[arg(long)]
    t_end: Option<f64>,

    #[arg(long, value_enum)]
    line_mode: Option<LineModeArg>,

    /// Empty-run handling of both `Qin` sweeps
    #[arg(long, value_enum)]
    empty_runs: Option<EmptyRunsArg>,

    /// Empty-group handling of both `Qin` sweeps
    #[arg(long, value_enum)]
    empty_groups: Option<EmptyGroupsArg>,

    /// Run the <|vx|>-vs-Qin sweep
    #[arg(long)]
    velocity: bool,

    /// Run the t_max-vs-Qin sweep
    #[arg(long)]
    final_time: bool,

    /// Run the <|vx|>-vs-time analysis
    #[arg(long)]
    timestep: bool,

    /// Skip PNG rendering
    #[arg(long)]
    no_plots: bool,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SweepConfig> {
    if let Some(path) = path {
        return SweepConfig::load(path);
    }

    let cwd_config = PathBuf::from("sweep.json");
    if cwd_config.exists() {
        return SweepConfig::load(&cwd_config);
    }

    Ok(SweepConfig::default())
}

fn apply_overrides(cfg: &mut SweepConfig, cli: Cli) {
    if let Some(v) = cli.outdir {
        cfg.outdir = v;
    }
    if !cli.prefixes.is_empty() || !cli.files.is_empty() {
        cfg.prefixes = cli.prefixes;
        cfg.files = cli.files;
    }
    if let Some(v) = cli.runs {
        cfg.run_first = v.first;
        cfg.run_last = v.last;
    }
    if let Some(v) = cli.dt {
        cfg.velocity_window.dt = v;
        cfg.timestep_window.dt = v;
    }
    if let Some(v) = cli.t_start {
        cfg.velocity_window.t_start = v;
    }
    if let Some(v) = cli.t_end {
        cfg.velocity_window.t_end = Some(v);
    }
    if let Some(v) = cli.line_mode {
        cfg.line_mode = v.into();
    }
    if let Some(v) = cli.empty_runs {
        cfg.velocity_policy.empty_runs = v.into();
        cfg.final_time_policy.empty_runs = v.into();
    }
    if let Some(v) = cli.empty_groups {
        cfg.velocity_policy.empty_groups = v.into();
        cfg.final_time_policy.empty_groups = v.into();
    }
    if cli.velocity || cli.final_time || cli.timestep {
        cfg.enable_velocity = cli.velocity;
        cfg.enable_final_time = cli.final_time;
        cfg.enable_timestep = cli.timestep;
    }
    if cli.no_plots {
        cfg.render_plots = false;
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref())?;
    apply_overrides(&mut cfg, cli);
    cfg.validate().context("invalid sweep configuration")?;

    let summary = run_sweep(&cfg)?;

    println!("Output directory: {}", cfg.outdir.display());
    for path in &summary.outputs {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
