use image::imageops::FilterType;

use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{OccludeError, OccludeResult};

/// Output size bounded by `max_dimension` on the long edge, keeping the aspect ratio.
///
/// Images already within the bound keep their size. Both output dimensions are at least 1.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> OccludeResult<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(OccludeError::invalid_dimensions(format!(
            "cannot resize {width}x{height}"
        )));
    }
    if max_dimension == 0 {
        return Err(OccludeError::invalid_dimensions("max dimension must be > 0"));
    }
    if width <= max_dimension && height <= max_dimension {
        return Ok((width, height));
    }

    let scale = f64::from(max_dimension) / f64::from(width.max(height));
    let fit = |v: u32| -> u32 {
        ((f64::from(v) * scale).round() as u32).clamp(1, max_dimension)
    };
    Ok((fit(width), fit(height)))
}

/// Resample `img` so its long edge is at most `max_dimension`.
#[tracing::instrument(skip(img), fields(w = img.width(), h = img.height()))]
pub fn resize_to_fit(img: &ImageBuffer, max_dimension: u32) -> OccludeResult<ImageBuffer> {
    let (w, h) = fit_within(img.width(), img.height(), max_dimension)?;
    resize_exact(img, w, h)
}

/// Resample `img` to exactly `width` x `height` (used to bring cutouts onto the canvas).
pub fn resize_exact(img: &ImageBuffer, width: u32, height: u32) -> OccludeResult<ImageBuffer> {
    if width == 0 || height == 0 {
        return Err(OccludeError::invalid_dimensions(format!(
            "cannot resize to {width}x{height}"
        )));
    }
    if (width, height) == (img.width(), img.height()) {
        return Ok(img.clone());
    }
    let resized = image::imageops::resize(&img.to_rgba_image(), width, height, FilterType::Triangle);
    ImageBuffer::from_rgba_image(resized)
}

#[cfg(test)]
#[path = "../../tests/unit/render/resize.rs"]
mod tests;
