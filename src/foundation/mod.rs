//! Core pixel types, the error taxonomy, and fixed-point helpers.

/// Pixel buffers and views.
pub mod core;
/// Error taxonomy and result alias.
pub mod error;
pub(crate) mod math;
