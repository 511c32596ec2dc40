use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use csv::Writer;
use qflow::{SweepPoint, TimestepStat};
use serde::Serialize;

use crate::config::SweepConfig;

#[derive(Debug, Clone, Serialize)]
pub struct TimestepSummary {
    pub qin: f64,
    pub source: String,
    pub timesteps: usize,
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub generated_at: String,
    pub config: SweepConfig,
    pub velocity: Option<Vec<SweepPoint>>,
    pub final_time: Option<Vec<SweepPoint>>,
    pub timestep: Vec<TimestepSummary>,
    pub outputs: Vec<PathBuf>,
}

impl SweepSummary {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            config: config.clone(),
            velocity: None,
            final_time: None,
            timestep: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

pub fn velocity_report_line(point: &SweepPoint) -> String {
    let (m, e) = point.values();
    format!("Qin = {:.3} -> <|vx|> = {m:.4} ± {e:.4}", point.qin)
}

pub fn final_time_report_line(point: &SweepPoint) -> String {
    let (m, e) = point.values();
    format!("Qin = {:.3} -> t_max = {m:.4} ± {e:.4} s", point.qin)
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.10}")
}

pub fn ensure_outdir(outdir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("failed to create output directory: {}", outdir.display()))
}

/// One row per `Qin`; `has_data` separates measured zeros from empty groups.
pub fn write_points_csv(path: &Path, value_name: &str, points: &[SweepPoint]) -> anyhow::Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to open CSV path {}", path.display()))?;
    writer.write_record([
        "qin",
        value_name,
        "stderr",
        "runs",
        "has_data",
    ])?;

    for point in points {
        let (mean, stderr) = point.values();
        writer.write_record([
            fmt_f64(point.qin),
            fmt_f64(mean),
            fmt_f64(stderr),
            point.runs().to_string(),
            point.observable.is_some().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_timestep_csv(path: &Path, stats: &[TimestepStat]) -> anyhow::Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to open CSV path {}", path.display()))?;
    writer.write_record(["t", "mean_abs_vx", "stderr", "samples"])?;

    for stat in stats {
        writer.write_record([
            fmt_f64(stat.t),
            fmt_f64(stat.observable.mean),
            fmt_f64(stat.observable.stderr),
            stat.observable.count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &SweepSummary) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    fs::write(path, data).with_context(|| format!("failed to write summary {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflow::Observable;

    fn point(qin: f64, mean: f64, stderr: f64) -> SweepPoint {
        SweepPoint {
            qin,
            observable: Some(Observable {
                mean,
                stderr,
                count: 3,
            }),
        }
    }

    #[test]
    fn report_lines_match_console_format() {
        let p = point(2.0, 1.23456, 0.01234);
        assert_eq!(velocity_report_line(&p), "Qin = 2.000 -> <|vx|> = 1.2346 ± 0.0123");
        assert_eq!(final_time_report_line(&p), "Qin = 2.000 -> t_max = 1.2346 ± 0.0123 s");
    }

    #[test]
    fn empty_points_report_zero() {
        let p = SweepPoint {
            qin: 7.5,
            observable: None,
        };
        assert_eq!(velocity_report_line(&p), "Qin = 7.500 -> <|vx|> = 0.0000 ± 0.0000");
    }

    #[test]
    fn points_csv_flags_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vx_vs_qin.csv");
        let points = vec![
            point(1.0, 1.5, 0.1),
            SweepPoint {
                qin: 2.0,
                observable: None,
            },
        ];
        write_points_csv(&path, "mean_abs_vx", &points).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "qin,mean_abs_vx,stderr,runs,has_data");
        assert!(lines[1].ends_with(",3,true"));
        assert!(lines[2].ends_with(",0,false"));
    }
}
