use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use qflow::LineMode;
use serde::{Deserialize, Serialize};

use crate::corridor::CorridorGeometry;

/// Runtime configuration of one animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub geometry: CorridorGeometry,
    pub fps: u32,
    /// Pixels per meter of corridor
    pub scale: u32,
    /// Body disc radius [m]
    pub body_radius: f64,
    /// Opacity of the halo ring
    pub halo_alpha: f64,
    pub line_mode: LineMode,
    pub output: PathBuf,
    /// Where PNG frames go; defaults to `<output stem>_frames` next to the MP4
    pub frames_dir: Option<PathBuf>,
    pub keep_frames: bool,
    pub ffmpeg: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            geometry: CorridorGeometry::default(),
            fps: 30,
            scale: 60,
            body_radius: 0.1,
            halo_alpha: 0.4,
            line_mode: LineMode::Lenient,
            output: PathBuf::from("animation.mp4"),
            frames_dir: None,
            keep_frames: false,
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let g = &self.geometry;
        anyhow::ensure!(
            g.length.is_finite() && g.length > 0.0 && g.width.is_finite() && g.width > 0.0,
            "corridor length and width must be positive"
        );
        anyhow::ensure!(
            g.soft_margin >= 0.0 && 2.0 * g.soft_margin < g.length,
            "soft_margin must lie in [0, length / 2)"
        );
        anyhow::ensure!(self.fps > 0, "fps must be greater than zero");
        anyhow::ensure!(self.scale > 0, "scale must be greater than zero");
        anyhow::ensure!(
            self.body_radius > 0.0,
            "body_radius must be greater than zero"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.halo_alpha),
            "halo_alpha must lie in [0, 1]"
        );
        Ok(())
    }

    pub fn frames_dir(&self) -> PathBuf {
        if let Some(dir) = &self.frames_dir {
            return dir.clone();
        }
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "animation".to_string());
        self.output.with_file_name(format!("{stem}_frames"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}
