use crate::foundation::error::{OccludeError, OccludeResult};

pub use kurbo::Point;

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Byte length of a tightly packed RGBA8 buffer, rejecting zero dimensions and overflow.
pub fn rgba_len(width: u32, height: u32) -> OccludeResult<usize> {
    if width == 0 || height == 0 {
        return Err(OccludeError::invalid_dimensions(format!(
            "{width}x{height} has a zero dimension"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| OccludeError::invalid_dimensions(format!("{width}x{height} overflows")))
}

/// Normalized pixel storage: straight-alpha RGBA8, row-major, tightly packed.
///
/// The buffer length always equals `width * height * 4` and both dimensions are positive;
/// every constructor enforces this. Buffers are never mutated in place once built, so a
/// new upload always produces a new `ImageBuffer`.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap pixel bytes, validating dimensions and length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> OccludeResult<Self> {
        let expected = rgba_len(width, height)?;
        if pixels.len() != expected {
            return Err(OccludeError::invalid_dimensions(format!(
                "{width}x{height} expects {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: Rgba8) -> OccludeResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: rgba.repeat(len / 4),
        })
    }

    /// Fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> OccludeResult<Self> {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Take ownership of an `image` crate RGBA buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> OccludeResult<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `image` crate RGBA buffer.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        // Length is guaranteed by construction, so `from_raw` cannot fail here.
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / 4
    }

    /// Raw RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume and return the raw RGBA8 bytes.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel at `(x, y)`; `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Borrow as an unvalidated view.
    pub fn view(&self) -> RgbaView<'_> {
        RgbaView {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Borrowed RGBA8 pixels with claimed dimensions.
///
/// Unlike [`ImageBuffer`], a view is not validated on construction: it is how raw decoder or
/// host output (possibly zero-sized) reaches the mask passes.
#[derive(Clone, Copy, Debug)]
pub struct RgbaView<'a> {
    /// Claimed width in pixels.
    pub width: u32,
    /// Claimed height in pixels.
    pub height: u32,
    /// RGBA8 bytes, row-major.
    pub pixels: &'a [u8],
}

impl<'a> RgbaView<'a> {
    /// Build a view over raw bytes.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Check that dimensions are positive and match the byte length.
    pub fn validate(&self) -> OccludeResult<()> {
        let expected = rgba_len(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(OccludeError::invalid_dimensions(format!(
                "{}x{} view expects {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
