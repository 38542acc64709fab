//! Foreground/background masks: generation strategies, dilation and the debug overlay.
//!
//! A [`Mask`] is one byte per pixel, each exactly `0` (background) or `255` (foreground). It
//! carries a [`MaskOrigin`] tag so the compositor can pick the matching strategy instead of
//! trusting callers to keep the polarity straight.
//!
//! Generation never panics on bad input. The low-level passes ([`edge::sobel_mask`],
//! [`edge::fast_edge_mask`]) signal [`OccludeError::InvalidDimensions`]; [`MaskGenerator`]
//! absorbs that into an empty mask, which callers treat as "detection unavailable".

use std::sync::Arc;

use crate::config::{DetectionMode, EdgeParams, PipelineConfig};
use crate::foundation::core::{ImageBuffer, RgbaView};
use crate::foundation::error::{OccludeError, OccludeResult};

/// Alpha-threshold mask derivation.
pub mod alpha;
/// Morphological growth of foreground regions.
pub mod dilate;
/// Gradient-edge mask derivation (Sobel and stride-2 fast variant).
pub mod edge;
/// Debug rendering of a mask over an image.
pub mod overlay;

/// Foreground classification value.
pub const FOREGROUND: u8 = 255;
/// Background classification value.
pub const BACKGROUND: u8 = 0;

/// Which strategy produced a mask.
#[derive(Clone, Debug)]
pub enum MaskOrigin {
    /// Mask classifies the original image directly; there is no separate cutout.
    GradientEdge,
    /// Mask was thresholded from an external cutout, which is also the occluding layer.
    AlphaThreshold {
        /// The segmentation cutout at canvas size, drawn over text during compositing.
        cutout: Arc<ImageBuffer>,
    },
}

impl MaskOrigin {
    /// Short stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GradientEdge => "gradient_edge",
            Self::AlphaThreshold { .. } => "alpha_threshold",
        }
    }
}

/// Binary per-pixel foreground/background classification.
#[derive(Clone, Debug)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
    origin: MaskOrigin,
}

impl Mask {
    /// Zero-length mask meaning "detection unavailable".
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
            origin: MaskOrigin::GradientEdge,
        }
    }

    /// Wrap classification bytes, validating length and that every entry is 0 or 255.
    pub fn from_binary(
        width: u32,
        height: u32,
        data: Vec<u8>,
        origin: MaskOrigin,
    ) -> OccludeResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| OccludeError::invalid_dimensions("mask size overflows"))?;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(OccludeError::invalid_dimensions(format!(
                "{width}x{height} mask expects {expected} entries, got {}",
                data.len()
            )));
        }
        if let Some(v) = data.iter().find(|&&v| v != FOREGROUND && v != BACKGROUND) {
            return Err(OccludeError::validation(format!(
                "mask entries must be 0 or 255, found {v}"
            )));
        }
        if let MaskOrigin::AlphaThreshold { cutout } = &origin {
            if cutout.width() != width || cutout.height() != height {
                return Err(OccludeError::invalid_dimensions(
                    "cutout dimensions must match the mask",
                ));
            }
        }
        Ok(Self::from_parts(width, height, data, origin))
    }

    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>, origin: MaskOrigin) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            data,
            origin,
        }
    }

    /// Whether the mask has no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Width in pixels (0 when empty).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (0 when empty).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of entries (`width * height`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Classification bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Provenance of this mask.
    pub fn origin(&self) -> &MaskOrigin {
        &self.origin
    }

    /// Whether pixel index `i` is foreground.
    pub fn is_foreground(&self, i: usize) -> bool {
        self.data.get(i).is_some_and(|&v| v == FOREGROUND)
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == FOREGROUND).count()
    }

    /// Whether every foreground pixel of `other` is foreground here too.
    pub fn is_superset_of(&self, other: &Mask) -> bool {
        self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(&a, &b)| b != FOREGROUND || a == FOREGROUND)
    }

    /// Whether this mask matches the given canvas size.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.width == width && self.height == height
    }
}

/// Mask generation configured from a [`PipelineConfig`].
#[derive(Clone, Debug)]
pub struct MaskGenerator {
    edge: EdgeParams,
    alpha_threshold: u8,
    parallel: bool,
}

impl MaskGenerator {
    /// Capture the relevant configuration values.
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            edge: cfg.edge_params(),
            alpha_threshold: cfg.alpha_threshold,
            parallel: cfg.parallel,
        }
    }

    /// Generator for an explicit mode, overriding the config's mode.
    pub fn for_mode(cfg: &PipelineConfig, mode: DetectionMode) -> Self {
        let cfg = PipelineConfig {
            mode,
            ..cfg.clone()
        };
        Self::from_config(&cfg)
    }

    /// Edge parameters in effect.
    pub fn edge_params(&self) -> EdgeParams {
        self.edge
    }

    /// Gradient-edge mask followed by dilation.
    ///
    /// Invalid input yields an empty mask; the failure is logged, not propagated.
    #[tracing::instrument(skip(self, view), fields(w = view.width, h = view.height, fast = self.edge.fast))]
    pub fn detect_edges(&self, view: RgbaView<'_>) -> Mask {
        let raw = if self.edge.fast {
            edge::fast_edge_mask(view, self.edge.threshold.max(0.0) as u32)
        } else {
            edge::sobel_mask(view, self.edge.threshold, self.parallel)
        };
        match raw {
            Ok(mask) => dilate::dilate(&mask, self.edge.dilate_iterations, self.parallel),
            Err(e) => {
                tracing::warn!(error = %e, "edge detection unavailable");
                Mask::empty()
            }
        }
    }

    /// Alpha-threshold mask from a segmentation cutout. Never runs the gradient passes.
    pub fn detect_from_cutout(&self, cutout: Arc<ImageBuffer>) -> Mask {
        alpha::alpha_mask(cutout, self.alpha_threshold)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/mask.rs"]
mod tests;
