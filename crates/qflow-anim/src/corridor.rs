//! Per-particle corridor state across animation frames
//!
//! A particle is unseen until its first row, active while inside the
//! corridor, and done once it crosses an exit. Done is terminal: later rows
//! of that particle are ignored even when they place it back inside.

use std::collections::BTreeMap;

use qflow::{ParticleId, TrajectoryRecord};
use serde::{Deserialize, Serialize};

use crate::frames::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorGeometry {
    /// Extent along x [m]
    pub length: f64,
    /// Extent along y [m]
    pub width: f64,
    /// Distance inside each end at which a particle counts as gone [m]
    pub soft_margin: f64,
}

impl Default for CorridorGeometry {
    fn default() -> Self {
        Self {
            length: 16.0,
            width: 3.6,
            soft_margin: 0.25,
        }
    }
}

impl CorridorGeometry {
    pub fn soft_exit(&self, direction: Direction, x: f64) -> bool {
        match direction {
            Direction::Forward => x >= self.length - self.soft_margin,
            Direction::Backward => x <= self.soft_margin,
        }
    }

    pub fn hard_exit(&self, direction: Direction, x: f64) -> bool {
        match direction {
            Direction::Forward => x >= self.length,
            Direction::Backward => x <= 0.0,
        }
    }
}

/// Heading captured at first sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn from_vx(vx: f64) -> Self {
        if vx > 0.0 {
            Self::Forward
        } else {
            Self::Backward
        }
    }
}

/// Marker color, from the sign of `vx` at first sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Positive,
    Negative,
    Zero,
}

impl Tint {
    pub fn from_vx(vx: f64) -> Self {
        if vx > 0.0 {
            Self::Positive
        } else if vx < 0.0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }
}

/// Last drawn position and halo radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Marker {
    fn at(record: &TrajectoryRecord) -> Self {
        Self {
            x: record.x,
            y: record.y,
            radius: record.radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Crossed the soft margin on a later row
    Soft,
    /// Crossed the corridor end
    Hard,
}

/// Phase of a seen particle. Unseen particles have no entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticlePhase {
    Active {
        direction: Direction,
        color: Tint,
        marker: Marker,
    },
    Done(ExitKind),
}

/// State store threaded through the frame sequence of one run.
#[derive(Debug, Clone, Default)]
pub struct CorridorState {
    geometry: CorridorGeometry,
    particles: BTreeMap<ParticleId, ParticlePhase>,
}

impl CorridorState {
    pub fn new(geometry: CorridorGeometry) -> Self {
        Self {
            geometry,
            particles: BTreeMap::new(),
        }
    }

    pub fn geometry(&self) -> &CorridorGeometry {
        &self.geometry
    }

    /// `None` while the particle is unseen.
    pub fn phase(&self, id: ParticleId) -> Option<&ParticlePhase> {
        self.particles.get(&id)
    }

    /// Apply every row of `frame` in file order.
    pub fn step(&mut self, frame: &Frame) {
        for record in &frame.rows {
            self.observe(record);
        }
    }

    pub fn observe(&mut self, record: &TrajectoryRecord) {
        let Some(id) = record.particle_id() else {
            tracing::warn!(line = record.line, "non-finite particle id, row ignored");
            return;
        };

        let next = match self.particles.get(&id) {
            Some(ParticlePhase::Done(_)) => return,
            Some(&ParticlePhase::Active {
                direction, color, ..
            }) => {
                if self.geometry.soft_exit(direction, record.x) {
                    ParticlePhase::Done(ExitKind::Soft)
                } else if self.geometry.hard_exit(direction, record.x) {
                    ParticlePhase::Done(ExitKind::Hard)
                } else {
                    ParticlePhase::Active {
                        direction,
                        color,
                        marker: Marker::at(record),
                    }
                }
            }
            None => {
                let direction = Direction::from_vx(record.vx);
                if self.geometry.hard_exit(direction, record.x) {
                    ParticlePhase::Done(ExitKind::Hard)
                } else {
                    ParticlePhase::Active {
                        direction,
                        color: Tint::from_vx(record.vx),
                        marker: Marker::at(record),
                    }
                }
            }
        };

        if let ParticlePhase::Done(kind) = next {
            tracing::debug!(id, ?kind, "particle left the corridor");
        }
        self.particles.insert(id, next);
    }

    /// Markers to draw: every active particle at its last position.
    pub fn visible(&self) -> impl Iterator<Item = (ParticleId, Tint, Marker)> + '_ {
        self.particles.iter().filter_map(|(&id, phase)| match *phase {
            ParticlePhase::Active { color, marker, .. } => Some((id, color, marker)),
            ParticlePhase::Done(_) => None,
        })
    }

    pub fn active_count(&self) -> usize {
        self.visible().count()
    }

    /// Size of the completed set.
    pub fn done_count(&self) -> usize {
        self.particles.len() - self.active_count()
    }
}
