//! Image decode/encode, font registry and color parsing.

/// Text and overlay colors.
pub mod color;
/// Image decoding and PNG output.
pub mod decode;
/// Font registry.
pub mod fonts;
