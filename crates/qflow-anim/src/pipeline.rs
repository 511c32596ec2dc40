use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use qflow::read_records;

use crate::config::AnimationConfig;
use crate::corridor::CorridorState;
use crate::encode::{clear_frames, encode, frame_path};
use crate::frames::group_frames;
use crate::render::{render_png, FrameStyle};

#[derive(Debug, Clone)]
pub struct AnimationSummary {
    pub frames: usize,
    /// Particles that left the corridor by the last frame
    pub completed: usize,
    pub frames_dir: PathBuf,
    pub output: PathBuf,
}

/// Render one PNG per distinct time of `input` into the frames directory.
///
/// Frames left in the directory by an earlier render are removed first.
/// Returns the final state store with the number of frames written.
pub fn render_frames(
    input: &Path,
    config: &AnimationConfig,
    frames_dir: &Path,
) -> anyhow::Result<(CorridorState, usize)> {
    let records = read_records(input, config.line_mode)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let frames = group_frames(records);
    anyhow::ensure!(!frames.is_empty(), "{} holds no records", input.display());

    fs::create_dir_all(frames_dir)
        .with_context(|| format!("failed to create {}", frames_dir.display()))?;
    clear_frames(frames_dir)?;

    let style = FrameStyle::from_config(config);
    let mut state = CorridorState::new(config.geometry);

    for frame in &frames {
        state.step(frame);
        let path = frame_path(frames_dir, frame.index);
        render_png(&path, &state, &style)
            .with_context(|| format!("failed to render {}", path.display()))?;
        if frame.index % 100 == 0 {
            tracing::debug!(
                frame = frame.index,
                t = frame.time.seconds(),
                active = state.active_count(),
                "rendered frame"
            );
        }
    }

    Ok((state, frames.len()))
}

/// Animate one trajectory file into `config.output`.
pub fn run_animation(input: &Path, config: &AnimationConfig) -> anyhow::Result<AnimationSummary> {
    config.validate()?;
    let frames_dir = config.frames_dir();
    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let (state, frames) = render_frames(input, config, &frames_dir)?;
    tracing::info!(frames, completed = state.done_count(), "frames rendered");

    encode(&config.ffmpeg, &frames_dir, config.fps, frames, &config.output)?;

    if !config.keep_frames {
        fs::remove_dir_all(&frames_dir)
            .with_context(|| format!("failed to remove {}", frames_dir.display()))?;
    }

    Ok(AnimationSummary {
        frames,
        completed: state.done_count(),
        frames_dir,
        output: config.output.clone(),
    })
}
