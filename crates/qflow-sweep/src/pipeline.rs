use std::path::PathBuf;

use anyhow::Context;
use qflow::naming::qin_label;
use qflow::{
    aggregate, per_timestep, timestep_ensemble, SeriesSet, SweepMetric, SweepPoint, SweepSource,
    TimestepStat,
};

use crate::config::{StagePolicy, SweepConfig};
use crate::output::{
    ensure_outdir, final_time_report_line, velocity_report_line, write_points_csv, write_summary,
    write_timestep_csv, SweepSummary, TimestepSummary,
};
use crate::plot::{plot_evolution, plot_sweep};

struct Stage {
    metric: SweepMetric,
    policy: StagePolicy,
    stem: &'static str,
    y_desc: &'static str,
    report: fn(&SweepPoint) -> String,
}

/// Run every enabled sweep of `config` and write its outputs.
///
/// Report lines go to stdout; files land in `config.outdir` and are listed
/// in the returned summary, which is also written as `sweep_summary.json`.
pub fn run_sweep(config: &SweepConfig) -> anyhow::Result<SweepSummary> {
    config.validate()?;
    ensure_outdir(&config.outdir)?;

    let mut summary = SweepSummary::new(config);

    if config.enable_velocity {
        let stage = Stage {
            metric: SweepMetric::MeanAbsVx(config.velocity_window),
            policy: config.velocity_policy,
            stem: "vx_vs_qin",
            y_desc: "<|vx|> (m/s)",
            report: velocity_report_line,
        };
        summary.velocity = Some(run_stage(config, &stage, &mut summary.outputs)?);
    }

    if config.enable_final_time {
        let stage = Stage {
            metric: SweepMetric::FinalTime,
            policy: config.final_time_policy,
            stem: "tmax_vs_qin",
            y_desc: "t_max (s)",
            report: final_time_report_line,
        };
        summary.final_time = Some(run_stage(config, &stage, &mut summary.outputs)?);
    }

    if config.enable_timestep {
        for source in config.sources() {
            if let Some(entry) = run_timestep(config, &source, &mut summary.outputs)? {
                summary.timestep.push(entry);
            }
        }
    }

    let summary_path = config.outdir.join("sweep_summary.json");
    summary.outputs.push(summary_path.clone());
    write_summary(&summary_path, &summary)?;

    Ok(summary)
}

fn run_stage(
    config: &SweepConfig,
    stage: &Stage,
    outputs: &mut Vec<PathBuf>,
) -> anyhow::Result<Vec<SweepPoint>> {
    let name = stage.metric.name();
    tracing::info!(metric = name, "running sweep");

    let options = config.options(&stage.policy);
    let points = aggregate(&config.sources(), &stage.metric, &options)
        .with_context(|| format!("{name} sweep failed"))?;
    for point in &points {
        println!("{}", (stage.report)(point));
    }

    let csv_path = config.outdir.join(format!("{}.csv", stage.stem));
    write_points_csv(&csv_path, name, &points)?;
    outputs.push(csv_path);

    if config.render_plots {
        if points.is_empty() {
            tracing::warn!(metric = name, "no sweep points, skipping plot");
        } else {
            let png_path = config.outdir.join(format!("{}.png", stage.stem));
            plot_sweep(&png_path, &points, stage.y_desc)
                .with_context(|| format!("failed to plot {}", png_path.display()))?;
            outputs.push(png_path);
        }
    }

    Ok(points)
}

fn source_timesteps(
    config: &SweepConfig,
    source: &SweepSource,
) -> anyhow::Result<Vec<TimestepStat>> {
    let window = &config.timestep_window;
    match source {
        SweepSource::Prefix(prefix) => {
            Ok(timestep_ensemble(prefix, &config.runs(), window, config.line_mode)?)
        }
        SweepSource::File(path) => {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "missing file, skipping");
                return Ok(Vec::new());
            }
            let series = SeriesSet::load(path, config.line_mode)?;
            Ok(per_timestep(&series, window)?)
        }
    }
}

fn run_timestep(
    config: &SweepConfig,
    source: &SweepSource,
    outputs: &mut Vec<PathBuf>,
) -> anyhow::Result<Option<TimestepSummary>> {
    let Some(qin) = source.qin() else {
        tracing::warn!(source = %source.label(), "could not extract Qin, skipping");
        return Ok(None);
    };

    let stats = source_timesteps(config, source)
        .with_context(|| format!("timestep analysis of {} failed", source.label()))?;
    let label = qin_label(qin);

    let csv_path = config
        .outdir
        .join(format!("mean_vx_vs_time_for_qin_{label}.csv"));
    write_timestep_csv(&csv_path, &stats)?;
    outputs.push(csv_path);

    if stats.is_empty() {
        tracing::warn!(qin, "no timestep data, skipping plot");
    } else if config.render_plots {
        let png_path = config
            .outdir
            .join(format!("mean_vx_vs_time_for_qin_{label}.png"));
        plot_evolution(&png_path, &stats)
            .with_context(|| format!("failed to plot {}", png_path.display()))?;
        outputs.push(png_path);
    }

    Ok(Some(TimestepSummary {
        qin,
        source: source.label(),
        timesteps: stats.len(),
        samples: stats.iter().map(|s| s.observable.count).sum(),
    }))
}
