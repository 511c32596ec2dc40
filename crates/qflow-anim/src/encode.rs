use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

/// Frame file `index` inside `dir`, matching the `frame_%06d.png` pattern.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:06}.png"))
}

fn is_frame_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("frame_") && n.ends_with(".png"))
}

/// Remove `frame_*.png` files left in `dir` by an earlier render. Other
/// files are kept. Returns the number of frames removed.
pub fn clear_frames(dir: &Path) -> anyhow::Result<usize> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::debug!(dir = %dir.display(), removed, "cleared stale frames");
    }
    Ok(removed)
}

/// ffmpeg arguments turning the first `frames` frames of `frames_dir` into
/// an H.264 MP4.
pub fn ffmpeg_args(frames_dir: &Path, fps: u32, frames: usize, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-framerate",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(fps.to_string().into());
    args.push("-i".into());
    args.push(frames_dir.join("frame_%06d.png").into_os_string());
    args.push("-frames:v".into());
    args.push(frames.to_string().into());
    for arg in ["-c:v", "libx264", "-pix_fmt", "yuv420p"] {
        args.push(arg.into());
    }
    args.push(output.as_os_str().to_owned());
    args
}

/// Encode the frames with `ffmpeg`. A missing binary or a non-zero exit is
/// an error.
pub fn encode(
    ffmpeg: &str,
    frames_dir: &Path,
    fps: u32,
    frames: usize,
    output: &Path,
) -> anyhow::Result<()> {
    tracing::info!(output = %output.display(), fps, frames, "encoding MP4");
    let status = Command::new(ffmpeg)
        .args(ffmpeg_args(frames_dir, fps, frames, output))
        .status()
        .with_context(|| format!("failed to run {ffmpeg}"))?;

    anyhow::ensure!(
        status.success(),
        "{ffmpeg} exited with {status} while encoding {}",
        output.display()
    );
    Ok(())
}
