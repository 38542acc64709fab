use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{OccludeError, OccludeResult};
use crate::mask::Mask;

/// Decode encoded image bytes into straight-alpha RGBA8.
///
/// Any decoder failure (unknown format, truncated data, zero-sized image) maps to
/// [`OccludeError::DecodeFailed`], which is terminal for that upload.
pub fn decode_image(bytes: &[u8]) -> OccludeResult<ImageBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| OccludeError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    ImageBuffer::from_rgba_image(rgba).map_err(|e| OccludeError::decode(e.to_string()))
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> OccludeResult<ImageBuffer> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Encode as PNG bytes.
pub fn encode_png(img: &ImageBuffer) -> OccludeResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.to_rgba_image())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Encode and write a PNG file, creating parent directories.
pub fn save_png(img: &ImageBuffer, path: &Path) -> OccludeResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        img.pixels(),
        img.width(),
        img.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// Write a mask as an 8-bit grayscale PNG (255 = foreground).
pub fn save_mask_png(mask: &Mask, path: &Path) -> OccludeResult<()> {
    if mask.is_empty() {
        return Err(OccludeError::invalid_dimensions("cannot write an empty mask"));
    }
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        mask.data(),
        mask.width(),
        mask.height(),
        image::ColorType::L8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write mask png '{}'", path.display()))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> OccludeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
