use std::sync::Arc;

use crate::foundation::core::ImageBuffer;
use crate::mask::{BACKGROUND, FOREGROUND, Mask, MaskOrigin};

/// Binarize a segmentation cutout's alpha channel: `alpha > threshold` is foreground.
///
/// The cutout is trusted as-is; no gradient pass runs on this path. The returned mask keeps a
/// handle to the cutout, which the compositor later draws as the occluding layer.
#[tracing::instrument(skip(cutout), fields(w = cutout.width(), h = cutout.height()))]
pub fn alpha_mask(cutout: Arc<ImageBuffer>, threshold: u8) -> Mask {
    let data: Vec<u8> = cutout
        .pixels()
        .chunks_exact(4)
        .map(|p| {
            if p[3] > threshold {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
        .collect();
    Mask::from_parts(
        cutout.width(),
        cutout.height(),
        data,
        MaskOrigin::AlphaThreshold { cutout },
    )
}
