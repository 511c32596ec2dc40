//! Corridor trajectory animation
//!
//! Groups a trajectory log into frames by time, tracks each particle
//! through the corridor until it exits, draws every frame as a PNG and
//! encodes the sequence with `ffmpeg`.

pub mod config;
pub mod corridor;
pub mod encode;
pub mod frames;
pub mod pipeline;
pub mod render;

pub use config::AnimationConfig;
pub use corridor::{CorridorGeometry, CorridorState, ExitKind, ParticlePhase};
pub use frames::{group_frames, Frame};
pub use pipeline::{render_frames, run_animation, AnimationSummary};
