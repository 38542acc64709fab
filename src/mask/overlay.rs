use crate::assets::color::TextColor;
use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{OccludeError, OccludeResult};
use crate::mask::Mask;
use crate::render::composite::over_straight;

/// Draw `color` over every foreground pixel of `base`, for inspecting a raw mask.
///
/// The overlay color's alpha controls how much of the underlying image shows through.
pub fn debug_overlay(base: &ImageBuffer, mask: &Mask, color: TextColor) -> OccludeResult<ImageBuffer> {
    if !mask.matches(base.width(), base.height()) {
        return Err(OccludeError::invalid_dimensions(format!(
            "overlay mask {}x{} does not match image {}x{}",
            mask.width(),
            mask.height(),
            base.width(),
            base.height()
        )));
    }
    let tint = color.to_array();
    let mut out = base.pixels().to_vec();
    for (px, &m) in out.chunks_exact_mut(4).zip(mask.data()) {
        if m != crate::mask::FOREGROUND {
            continue;
        }
        let blended = over_straight([px[0], px[1], px[2], px[3]], tint);
        px.copy_from_slice(&blended);
    }
    ImageBuffer::new(base.width(), base.height(), out)
}
