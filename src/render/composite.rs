use std::sync::Arc;

use crate::foundation::core::{ImageBuffer, Rgba8};
use crate::foundation::error::{OccludeError, OccludeResult};
use crate::foundation::math::{mul_div255_u8, premultiply, unpremultiply};
use crate::mask::{FOREGROUND, Mask, MaskOrigin};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);
    std::array::from_fn(|i| src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv)))
}

/// Source-over for straight-alpha pixels.
pub fn over_straight(dst: Rgba8, src: Rgba8) -> Rgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        _ => unpremultiply(over(premultiply(dst), premultiply(src))),
    }
}

/// One recomposed frame plus the mask it was built with.
///
/// An empty result (no image) means "nothing to render yet"; hosts keep showing whatever they
/// had before.
#[derive(Clone, Debug)]
pub struct CompositeResult {
    image: Option<ImageBuffer>,
    mask: Arc<Mask>,
}

impl CompositeResult {
    /// Result carrying no frame.
    pub fn empty(mask: Arc<Mask>) -> Self {
        Self { image: None, mask }
    }

    /// Whether there is no frame.
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }

    /// Rendered frame, if any.
    pub fn image(&self) -> Option<&ImageBuffer> {
        self.image.as_ref()
    }

    /// Mask used for this frame (kept for the debug overlay).
    pub fn mask(&self) -> &Arc<Mask> {
        &self.mask
    }
}

/// Merge `original`, `text` and the mask's occluding content into one frame.
///
/// Dispatches on [`MaskOrigin`]: gradient-edge masks keep original pixels where foreground and
/// let text through elsewhere; alpha-threshold masks paint text on background pixels and then
/// draw the cutout over everything. Size mismatches and empty masks are absorbed into an empty
/// result.
#[tracing::instrument(skip_all, fields(origin = mask.origin().name(), w = original.width(), h = original.height()))]
pub fn composite(original: &ImageBuffer, mask: &Arc<Mask>, text: &ImageBuffer) -> CompositeResult {
    match try_composite(original, mask, text) {
        Ok(image) => CompositeResult {
            image: Some(image),
            mask: Arc::clone(mask),
        },
        Err(e) => {
            tracing::warn!(error = %e, "composite skipped");
            CompositeResult::empty(Arc::clone(mask))
        }
    }
}

/// Like [`composite`], but reports why a frame could not be produced.
pub fn try_composite(
    original: &ImageBuffer,
    mask: &Mask,
    text: &ImageBuffer,
) -> OccludeResult<ImageBuffer> {
    let (w, h) = (original.width(), original.height());
    if !mask.matches(w, h) {
        return Err(OccludeError::invalid_dimensions(format!(
            "mask {}x{} does not match image {w}x{h}",
            mask.width(),
            mask.height()
        )));
    }
    if text.width() != w || text.height() != h {
        return Err(OccludeError::invalid_dimensions(format!(
            "text layer {}x{} does not match image {w}x{h}",
            text.width(),
            text.height()
        )));
    }

    let pixels = match mask.origin() {
        MaskOrigin::GradientEdge => text_on_background(original, mask, text),
        MaskOrigin::AlphaThreshold { cutout } => {
            if cutout.width() != w || cutout.height() != h {
                return Err(OccludeError::invalid_dimensions(
                    "cutout does not match image size",
                ));
            }
            let mut out = text_on_background(original, mask, text);
            draw_over(&mut out, cutout.pixels());
            out
        }
    };
    ImageBuffer::new(w, h, pixels)
}

/// Copy `original`, replacing background-classified pixels with visible text pixels.
fn text_on_background(original: &ImageBuffer, mask: &Mask, text: &ImageBuffer) -> Vec<u8> {
    let mut out = original.pixels().to_vec();
    for ((dst, src), &m) in out
        .chunks_exact_mut(4)
        .zip(text.pixels().chunks_exact(4))
        .zip(mask.data())
    {
        if m != FOREGROUND && src[3] > 0 {
            dst.copy_from_slice(src);
        }
    }
    out
}

/// Straight-alpha source-over of `layer` onto `dst`, pixel for pixel.
fn draw_over(dst: &mut [u8], layer: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        let out = over_straight([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
