//! Pixel production: resampling, text layers and the final composite.

/// 5x7 fallback face.
pub mod bitmap_font;
/// Mask-aware merging of original, text and cutout.
pub mod composite;
/// Bounded resampling.
pub mod resize;
/// Text specs and rasterization.
pub mod text;
