use std::fs;
use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use qflow::{SweepPoint, TimestepStat};

/// Fixed look of one error-bar chart.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub size: (u32, u32),
    pub x_desc: String,
    pub y_desc: String,
    pub desc_font: u32,
    pub label_font: u32,
    pub line_color: RGBColor,
    pub bar_color: RGBAColor,
    pub line_width: u32,
    pub marker_size: u32,
    pub cap_width: u32,
}

impl ChartStyle {
    /// Observable against `Qin`.
    pub fn sweep(y_desc: &str) -> Self {
        Self {
            size: (1000, 600),
            x_desc: "Qin (1/s)".to_string(),
            y_desc: y_desc.to_string(),
            desc_font: 28,
            label_font: 28,
            line_color: RGBColor(31, 119, 180),
            bar_color: BLACK.mix(1.0),
            line_width: 2,
            marker_size: 5,
            cap_width: 10,
        }
    }

    /// `<|vx|>` against time for one `Qin`.
    pub fn evolution() -> Self {
        Self {
            size: (2000, 800),
            x_desc: "Time (s)".to_string(),
            y_desc: "<|vx|> (m/s)".to_string(),
            desc_font: 28,
            label_font: 25,
            line_color: RGBColor(31, 119, 180),
            bar_color: RGBAColor(128, 128, 128, 0.6),
            line_width: 2,
            marker_size: 3,
            cap_width: 4,
        }
    }
}

/// Padded axis range covering `values`; degenerate spans are widened.
pub fn axis_range<I>(values: I) -> Range<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }

    let span = hi - lo;
    let pad = if span > 0.0 {
        0.05 * span
    } else {
        (0.05 * lo.abs()).max(0.5)
    };
    (lo - pad)..(hi + pad)
}

/// Draw `(x, mean, stderr)` triples as a line with markers and vertical
/// error bars.
pub fn draw_errorbar_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    points: &[(f64, f64, f64)],
    style: &ChartStyle,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_range = axis_range(points.iter().map(|p| p.0));
    let y_range = axis_range(points.iter().flat_map(|&(_, m, e)| [m - e, m + e]));

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(3 * style.desc_font)
        .y_label_area_size(4 * style.desc_font)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(style.x_desc.as_str())
        .y_desc(style.y_desc.as_str())
        .axis_desc_style(("sans-serif", style.desc_font))
        .label_style(("sans-serif", style.label_font))
        .light_line_style(BLACK.mix(0.05).stroke_width(1))
        .bold_line_style(BLACK.mix(0.2).stroke_width(1))
        .draw()?;

    chart.draw_series(points.iter().map(|&(x, m, e)| {
        ErrorBar::new_vertical(x, m - e, m, m + e, style.bar_color.filled(), style.cap_width)
    }))?;
    chart.draw_series(LineSeries::new(
        points.iter().map(|&(x, m, _)| (x, m)),
        style.line_color.stroke_width(style.line_width),
    ))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, m, _)| Circle::new((x, m), style.marker_size, style.line_color.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn render_png(path: &Path, points: &[(f64, f64, f64)], style: &ChartStyle) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let root = BitMapBackend::new(path, style.size).into_drawing_area();
    draw_errorbar_chart(&root, points, style)
}

/// Sweep points as `(Qin, mean, stderr)`, with empty groups at zero.
pub fn sweep_triples(points: &[SweepPoint]) -> Vec<(f64, f64, f64)> {
    points
        .iter()
        .map(|p| {
            let (m, e) = p.values();
            (p.qin, m, e)
        })
        .collect()
}

pub fn timestep_triples(stats: &[TimestepStat]) -> Vec<(f64, f64, f64)> {
    stats
        .iter()
        .map(|s| (s.t, s.observable.mean, s.observable.stderr))
        .collect()
}

pub fn plot_sweep(path: &Path, points: &[SweepPoint], y_desc: &str) -> anyhow::Result<()> {
    render_png(path, &sweep_triples(points), &ChartStyle::sweep(y_desc))
}

pub fn plot_evolution(path: &Path, stats: &[TimestepStat]) -> anyhow::Result<()> {
    render_png(path, &timestep_triples(stats), &ChartStyle::evolution())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflow::Observable;

    #[test]
    fn axis_range_pads_the_span() {
        let r = axis_range([1.0, 3.0]);
        assert!((r.start - 0.9).abs() < 1e-12);
        assert!((r.end - 3.1).abs() < 1e-12);
    }

    #[test]
    fn axis_range_widens_single_values() {
        let r = axis_range([2.0]);
        assert!(r.start < 2.0 && r.end > 2.0);
        assert_eq!(axis_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(axis_range([f64::NAN]), 0.0..1.0);
    }

    #[test]
    fn empty_groups_plot_at_zero() {
        let points = [
            SweepPoint {
                qin: 1.0,
                observable: Some(Observable {
                    mean: 1.4,
                    stderr: 0.1,
                    count: 4,
                }),
            },
            SweepPoint {
                qin: 2.0,
                observable: None,
            },
        ];
        assert_eq!(sweep_triples(&points), vec![(1.0, 1.4, 0.1), (2.0, 0.0, 0.0)]);
    }
}
