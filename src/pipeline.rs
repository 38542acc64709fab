//! One-shot composition of a still image.
//!
//! [`compose_still`] runs every stage synchronously: resize, mask detection, text
//! rasterization, composite. The interactive [`Session`](crate::session::Session) runs the same
//! stages spread across ticks and reuses the helpers here.

use std::sync::Arc;

use crate::assets::color::TextColor;
use crate::config::{DetectionMode, PipelineConfig};
use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{OccludeError, OccludeResult};
use crate::mask::overlay::debug_overlay;
use crate::mask::{Mask, MaskGenerator};
use crate::render::composite::{CompositeResult, composite};
use crate::render::resize::{resize_exact, resize_to_fit};
use crate::render::text::{TextRasterizer, TextSpec};

/// Bring a segmentation cutout onto a `width` x `height` canvas.
pub fn prepare_cutout(
    cutout: &ImageBuffer,
    width: u32,
    height: u32,
) -> OccludeResult<Arc<ImageBuffer>> {
    if (cutout.width(), cutout.height()) != (width, height) {
        tracing::debug!(
            from_w = cutout.width(),
            from_h = cutout.height(),
            width,
            height,
            "resizing cutout to canvas"
        );
    }
    Ok(Arc::new(resize_exact(cutout, width, height)?))
}

/// Mask for `canvas` according to `config.mode`.
///
/// Segmentation mode requires `cutout`; the gradient modes ignore it.
pub fn detect_mask(
    canvas: &ImageBuffer,
    cutout: Option<&ImageBuffer>,
    config: &PipelineConfig,
) -> OccludeResult<Mask> {
    let generator = MaskGenerator::from_config(config);
    match config.mode {
        DetectionMode::Segmentation => {
            let cutout = cutout.ok_or_else(|| {
                OccludeError::segmentation("segmentation mode needs a cutout image")
            })?;
            let cutout = prepare_cutout(cutout, canvas.width(), canvas.height())?;
            Ok(generator.detect_from_cutout(cutout))
        }
        DetectionMode::Standard | DetectionMode::Fast => {
            if cutout.is_some() {
                tracing::warn!(mode = ?config.mode, "cutout ignored outside segmentation mode");
            }
            Ok(generator.detect_edges(canvas.view()))
        }
    }
}

/// Everything produced by [`compose_still`].
#[derive(Clone, Debug)]
pub struct StillOutput {
    /// Source resized to the processing size.
    pub canvas: ImageBuffer,
    /// Text layer at canvas size; `None` when rasterization was unavailable.
    pub text_layer: Option<ImageBuffer>,
    pub frame: CompositeResult,
}

impl StillOutput {
    pub fn image(&self) -> Option<&ImageBuffer> {
        self.frame.image()
    }

    pub fn mask(&self) -> &Arc<Mask> {
        self.frame.mask()
    }

    /// Canvas with the mask's foreground tinted by `color`.
    pub fn debug_overlay(&self, color: TextColor) -> OccludeResult<ImageBuffer> {
        debug_overlay(&self.canvas, self.mask(), color)
    }
}

/// Resize `source`, detect its mask, draw `text` and composite.
///
/// Recoverable failures (an empty mask, an unavailable text surface) produce an empty frame;
/// decode-level and segmentation problems are returned as errors.
#[tracing::instrument(skip_all, fields(w = source.width(), h = source.height(), mode = ?config.mode))]
pub fn compose_still(
    source: &ImageBuffer,
    cutout: Option<&ImageBuffer>,
    text: &TextSpec,
    config: &PipelineConfig,
    rasterizer: &mut TextRasterizer,
) -> OccludeResult<StillOutput> {
    config.validate()?;
    text.validate()?;

    let canvas = resize_to_fit(source, config.max_dimension)?;
    let mask = Arc::new(detect_mask(&canvas, cutout, config)?);
    tracing::debug!(
        foreground = mask.foreground_count(),
        origin = mask.origin().name(),
        "mask ready"
    );

    let text_layer = match rasterizer.rasterize(text, canvas.width(), canvas.height()) {
        Ok(layer) => Some(layer),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "text layer unavailable");
            None
        }
        Err(e) => return Err(e),
    };

    let frame = match text_layer.as_ref() {
        Some(layer) => composite(&canvas, &mask, layer),
        None => CompositeResult::empty(Arc::clone(&mask)),
    };
    Ok(StillOutput {
        canvas,
        text_layer,
        frame,
    })
}
