use rayon::prelude::*;

use crate::foundation::core::RgbaView;
use crate::foundation::error::OccludeResult;
use crate::foundation::math::luminance;
use crate::mask::{FOREGROUND, Mask, MaskOrigin};

/// Sampling stride of the fast variant.
pub const FAST_STRIDE: usize = 2;

/// Sobel gradient mask.
///
/// Luminance is the unweighted RGB average. Interior pixels whose clamped gradient magnitude
/// exceeds `threshold` become foreground; the 1-pixel border stays background.
#[tracing::instrument(skip(view), fields(w = view.width, h = view.height))]
pub fn sobel_mask(view: RgbaView<'_>, threshold: f32, parallel: bool) -> OccludeResult<Mask> {
    view.validate()?;
    let w = view.width as usize;
    let h = view.height as usize;

    let lum: Vec<f32> = view
        .pixels
        .chunks_exact(4)
        .map(|p| luminance(p[0], p[1], p[2]))
        .collect();

    let mut data = vec![0u8; w * h];
    if w >= 3 && h >= 3 {
        if parallel {
            data.par_chunks_mut(w)
                .enumerate()
                .for_each(|(y, row)| sobel_row(&lum, w, h, y, threshold, row));
        } else {
            data.chunks_mut(w)
                .enumerate()
                .for_each(|(y, row)| sobel_row(&lum, w, h, y, threshold, row));
        }
    }

    Ok(Mask::from_parts(
        view.width,
        view.height,
        data,
        MaskOrigin::GradientEdge,
    ))
}

fn sobel_row(lum: &[f32], w: usize, h: usize, y: usize, threshold: f32, row: &mut [u8]) {
    if y == 0 || y + 1 >= h {
        return;
    }
    let up = (y - 1) * w;
    let mid = y * w;
    let down = (y + 1) * w;
    for x in 1..w - 1 {
        let tl = lum[up + x - 1];
        let tc = lum[up + x];
        let tr = lum[up + x + 1];
        let ml = lum[mid + x - 1];
        let mr = lum[mid + x + 1];
        let bl = lum[down + x - 1];
        let bc = lum[down + x];
        let br = lum[down + x + 1];

        // -1 0 +1 / -2 0 +2 / -1 0 +1
        let gx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
        // -1 -2 -1 / 0 0 0 / +1 +2 +1
        let gy = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);

        let magnitude = (gx * gx + gy * gy).sqrt().min(255.0);
        if magnitude > threshold {
            row[x] = FOREGROUND;
        }
    }
}

/// Coarse stride-2 edge mask.
///
/// Each sampled pixel compares itself with the pixel [`FAST_STRIDE`] to the right and below,
/// summing absolute R/G/B differences per direction. When the larger sum exceeds `threshold`
/// the sampled pixel's whole 3x3 neighborhood becomes foreground, which pre-dilates the
/// sparser sampling.
#[tracing::instrument(skip(view), fields(w = view.width, h = view.height))]
pub fn fast_edge_mask(view: RgbaView<'_>, threshold: u32) -> OccludeResult<Mask> {
    view.validate()?;
    let w = view.width as usize;
    let h = view.height as usize;
    let px = view.pixels;
    let mut data = vec![0u8; w * h];

    let channel_diff = |a: usize, b: usize| -> u32 {
        (0..3)
            .map(|c| u32::from(px[a * 4 + c].abs_diff(px[b * 4 + c])))
            .sum()
    };

    for y in (FAST_STRIDE..h.saturating_sub(FAST_STRIDE)).step_by(FAST_STRIDE) {
        for x in (FAST_STRIDE..w.saturating_sub(FAST_STRIDE)).step_by(FAST_STRIDE) {
            let i = y * w + x;
            let horizontal = channel_diff(i, i + FAST_STRIDE);
            let vertical = channel_diff(i, i + FAST_STRIDE * w);
            if horizontal.max(vertical) <= threshold {
                continue;
            }
            for ny in y - 1..=y + 1 {
                let row = ny * w;
                data[row + x - 1..=row + x + 1].fill(FOREGROUND);
            }
        }
    }

    Ok(Mask::from_parts(
        view.width,
        view.height,
        data,
        MaskOrigin::GradientEdge,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/mask/edge.rs"]
mod tests;
