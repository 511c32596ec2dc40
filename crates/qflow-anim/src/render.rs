use std::f64::consts::TAU;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::AnimationConfig;
use crate::corridor::{CorridorState, Tint};

/// Pixel geometry and marker style of rendered frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameStyle {
    /// Even pixel dimensions, as required by yuv420p
    pub size: (u32, u32),
    pub scale: f64,
    pub body_radius: f64,
    pub halo_alpha: f64,
}

impl FrameStyle {
    pub fn from_config(config: &AnimationConfig) -> Self {
        let even = |meters: f64| {
            let px = (meters * config.scale as f64).round().max(2.0) as u32;
            px + px % 2
        };
        Self {
            size: (even(config.geometry.length), even(config.geometry.width)),
            scale: config.scale as f64,
            body_radius: config.body_radius,
            halo_alpha: config.halo_alpha,
        }
    }

    fn pixels(&self, meters: f64) -> f64 {
        (meters * self.scale).max(1.0)
    }
}

/// Arc length of one dash, and of one gap, in pixels.
const DASH_PX: f64 = 6.0;
/// Polyline points per dash.
const DASH_STEPS: usize = 4;

/// Dashes of a ring of `radius` meters around `center`.
///
/// The ring is cut into an even number of equal arcs of about [`DASH_PX`]
/// pixels each and every other arc is kept, so dashes and gaps alternate
/// all the way round.
pub fn halo_dashes(center: (f64, f64), radius: f64, radius_px: f64) -> Vec<Vec<(f64, f64)>> {
    let arcs = ((TAU * radius_px / (2.0 * DASH_PX)).ceil() as usize).max(4) * 2;
    let step = TAU / arcs as f64;
    (0..arcs)
        .step_by(2)
        .map(|arc| {
            let start = arc as f64 * step;
            (0..=DASH_STEPS)
                .map(|i| {
                    let angle = start + step * i as f64 / DASH_STEPS as f64;
                    (
                        center.0 + radius * angle.cos(),
                        center.1 + radius * angle.sin(),
                    )
                })
                .collect()
        })
        .collect()
}

pub fn tint_color(tint: Tint) -> RGBColor {
    match tint {
        Tint::Positive => BLUE,
        Tint::Negative => RED,
        Tint::Zero => BLACK,
    }
}

/// Draw the visible particles of `state` over a blank corridor.
pub fn draw_frame<DB>(
    root: &DrawingArea<DB, Shift>,
    state: &CorridorState,
    style: &FrameStyle,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let geometry = state.geometry();
    let mut chart = ChartBuilder::on(root)
        .margin(0)
        .build_cartesian_2d(0.0..geometry.length, 0.0..geometry.width)?;

    let markers: Vec<_> = state
        .visible()
        .filter(|(_, _, m)| m.x.is_finite() && m.y.is_finite())
        .collect();

    // unfilled dashed ring at the particle's radius
    chart.draw_series(
        markers
            .iter()
            .filter(|(_, _, m)| m.radius > 0.0)
            .flat_map(|&(_, tint, m)| {
                let color = tint_color(tint).mix(style.halo_alpha).stroke_width(2);
                halo_dashes((m.x, m.y), m.radius, style.pixels(m.radius))
                    .into_iter()
                    .map(move |dash| PathElement::new(dash, color))
            }),
    )?;
    chart.draw_series(markers.iter().map(|&(_, tint, m)| {
        Circle::new(
            (m.x, m.y),
            style.pixels(style.body_radius),
            tint_color(tint).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

pub fn render_png(path: &Path, state: &CorridorState, style: &FrameStyle) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, style.size).into_drawing_area();
    draw_frame(&root, state, style)
}
