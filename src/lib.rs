//! Occlude places text behind the foreground subject of a photo.
//!
//! A source image is resized to a bounded canvas, a binary foreground mask is derived from it
//! (Sobel gradient edges, a stride-2 fast variant, or the alpha of an external segmentation
//! cutout), and text is composited only where the mask says "background". The entry points are:
//!
//! - [`compose_still`] for one synchronous composition
//! - [`Session`] for interactive editing with phased loading and debounced recomposition
#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod mask;
pub mod pipeline;
pub mod render;
pub mod session;

pub use crate::assets::color::TextColor;
pub use crate::assets::decode::{decode_image, encode_png, load_image, save_mask_png, save_png};
pub use crate::assets::fonts::FontBook;
pub use crate::config::{DetectionMode, PipelineConfig};
pub use crate::foundation::core::{ImageBuffer, Point, Rgba8, RgbaView};
pub use crate::foundation::error::{OccludeError, OccludeResult};
pub use crate::mask::{Mask, MaskGenerator, MaskOrigin};
pub use crate::pipeline::{StillOutput, compose_still, detect_mask};
pub use crate::render::composite::{CompositeResult, composite};
pub use crate::render::text::{TextRasterizer, TextSpec};
pub use crate::session::segment::{CutoutFileSegmenter, Segmenter};
pub use crate::session::{Session, SessionStatus};
