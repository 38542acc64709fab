//! Tunable pipeline configuration.
//!
//! The thresholds here have no derivation beyond "what looked right"; they are exposed so callers
//! can tune them per image source instead of treating them as fixed constants.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::color::TextColor;
use crate::foundation::error::{OccludeError, OccludeResult};

/// Which foreground-detection path a session uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Full Sobel gradient mask followed by dilation.
    #[default]
    Standard,
    /// Stride-2 difference mask with built-in pre-dilation.
    Fast,
    /// Alpha threshold over an external segmentation cutout.
    Segmentation,
}

/// Thresholds and iteration counts for one gradient-edge run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeParams {
    /// Use the stride-2 fast variant.
    pub fast: bool,
    /// Sobel magnitude threshold (standard) or summed channel difference threshold (fast).
    pub threshold: f32,
    /// Dilation iterations applied after generation.
    pub dilate_iterations: u32,
}

/// Pipeline configuration surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum processing dimension (long edge) in pixels.
    pub max_dimension: u32,
    /// Foreground-detection path.
    pub mode: DetectionMode,
    /// Sobel magnitude threshold for standard mode.
    pub edge_threshold: f32,
    /// Channel-difference threshold for fast mode.
    pub fast_edge_threshold: u32,
    /// Dilation iterations for standard mode.
    pub dilate_iterations: u32,
    /// Dilation iterations for fast mode.
    pub fast_dilate_iterations: u32,
    /// Alpha cutoff for the segmentation path (pixel is foreground when alpha exceeds it).
    pub alpha_threshold: u8,
    /// Line height as a multiple of font size.
    pub line_height_factor: f32,
    /// Delay between load phases so the host can repaint progress.
    pub phase_delay_ms: u64,
    /// Debounce window for recomposition while dragging.
    pub drag_debounce_ms: u64,
    /// Partition the Sobel and dilation passes by row range across the rayon pool.
    pub parallel: bool,
    /// Color used for foreground pixels in the debug overlay.
    pub overlay_color: TextColor,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            mode: DetectionMode::Standard,
            edge_threshold: 50.0,
            fast_edge_threshold: 30,
            dilate_iterations: 2,
            fast_dilate_iterations: 1,
            alpha_threshold: 128,
            line_height_factor: 1.2,
            phase_delay_ms: 50,
            drag_debounce_ms: 16,
            parallel: false,
            overlay_color: TextColor::rgba(255, 0, 255, 128),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> OccludeResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| OccludeError::validation(format!("config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: &Path) -> OccludeResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Reject values no pass can work with.
    pub fn validate(&self) -> OccludeResult<()> {
        if self.max_dimension == 0 {
            return Err(OccludeError::validation("max_dimension must be > 0"));
        }
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(OccludeError::validation(
                "edge_threshold must be finite and >= 0",
            ));
        }
        if !self.line_height_factor.is_finite() || self.line_height_factor <= 0.0 {
            return Err(OccludeError::validation(
                "line_height_factor must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Edge parameters for the configured mode.
    ///
    /// Segmentation mode never runs the gradient passes; it reports standard parameters so a
    /// caller falling back to edges gets sensible values.
    pub fn edge_params(&self) -> EdgeParams {
        match self.mode {
            DetectionMode::Fast => EdgeParams {
                fast: true,
                threshold: self.fast_edge_threshold as f32,
                dilate_iterations: self.fast_dilate_iterations,
            },
            DetectionMode::Standard | DetectionMode::Segmentation => EdgeParams {
                fast: false,
                threshold: self.edge_threshold,
                dilate_iterations: self.dilate_iterations,
            },
        }
    }

    /// Phase delay as a [`Duration`].
    pub fn phase_delay(&self) -> Duration {
        Duration::from_millis(self.phase_delay_ms)
    }

    /// Drag debounce window as a [`Duration`].
    pub fn drag_debounce(&self) -> Duration {
        Duration::from_millis(self.drag_debounce_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
