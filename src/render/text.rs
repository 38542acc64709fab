use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::color::TextColor;
use crate::assets::fonts::{FontBook, FontFace};
use crate::foundation::core::{ImageBuffer, Point, Rgba8, rgba_len};
use crate::foundation::error::{OccludeError, OccludeResult};
use crate::foundation::math::unpremultiply;
use crate::render::bitmap_font::{
    ADVANCE_DOTS, DOTS_PER_EM, GLYPH_COLS, GLYPH_ROWS, glyph, line_width_dots,
};

/// What to draw and where.
///
/// `x` and `y` are percentages of the canvas width and height locating the anchor point. The
/// block of lines is centered on the anchor both horizontally and vertically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextSpec {
    /// Text content; lines are separated by `\n`.
    pub content: String,
    /// Requested font family. Families missing from the [`FontBook`] use the bitmap face.
    pub font_family: String,
    /// Font size in pixels.
    pub size: f32,
    /// Fill color including opacity.
    pub color: TextColor,
    /// Anchor x as a percentage of canvas width.
    pub x: f32,
    /// Anchor y as a percentage of canvas height.
    pub y: f32,
}

impl Default for TextSpec {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "sans-serif".to_owned(),
            size: 48.0,
            color: TextColor::default(),
            x: 50.0,
            y: 50.0,
        }
    }
}

impl TextSpec {
    /// Default styling centered on the canvas.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> OccludeResult<Self> {
        let spec: Self = serde_json::from_str(s)
            .map_err(|e| OccludeError::validation(format!("text spec json: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read, parse and validate a JSON text spec file.
    pub fn from_path(path: &Path) -> OccludeResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read text spec '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> OccludeResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(OccludeError::validation("text size must be finite and > 0"));
        }
        for (name, v) in [("x", self.x), ("y", self.y)] {
            if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                return Err(OccludeError::validation(format!(
                    "text {name} must be within [0, 100], got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Copy with the anchor moved to (`x`, `y`), clamped into [0, 100].
    ///
    /// Pointer positions outside the canvas pin the text to the nearest edge.
    pub fn with_anchor(&self, x: f32, y: f32) -> Self {
        let clamp = |v: f32| if v.is_nan() { 50.0 } else { v.clamp(0.0, 100.0) };
        Self {
            x: clamp(x),
            y: clamp(y),
            ..self.clone()
        }
    }

    /// Content split on line breaks (a trailing `\r` on a line is dropped).
    pub fn lines(&self) -> Vec<&str> {
        self.content
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect()
    }

    /// Anchor in canvas pixels.
    pub fn anchor(&self, width: u32, height: u32) -> Point {
        Point::new(
            f64::from(self.x) / 100.0 * f64::from(width),
            f64::from(self.y) / 100.0 * f64::from(height),
        )
    }
}

/// Vertical offset of line `i` of `n` from the anchor: `(i - n/2 + 0.5) * line_height`.
pub fn line_offset(i: usize, n: usize, line_height: f32) -> f32 {
    (i as f32 - n as f32 / 2.0 + 0.5) * line_height
}

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrushRgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<TextColor> for TextBrushRgba8 {
    fn from(c: TextColor) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Parley contexts plus the families already registered with them.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: HashMap<String, String>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    fn family_name(&mut self, face: &FontFace) -> OccludeResult<String> {
        if let Some(name) = self.registered.get(&face.family) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(face.bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            OccludeError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OccludeError::validation("registered font family has no name"))?
            .to_string();
        self.registered.insert(face.family.clone(), name.clone());
        Ok(name)
    }

    /// Shape one unwrapped line.
    fn layout_line(
        &mut self,
        text: &str,
        face: &FontFace,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> OccludeResult<parley::Layout<TextBrushRgba8>> {
        let family = self.family_name(face)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Renders a [`TextSpec`] into its own transparent RGBA layer.
///
/// Families registered in the [`FontBook`] are shaped with parley and filled by vello_cpu;
/// anything else is drawn with the built-in 5x7 bitmap face. The rasterizer caches shaped font
/// state across calls, so hosts keep one per session.
pub struct TextRasterizer {
    fonts: FontBook,
    engine: TextLayoutEngine,
    font_data: HashMap<String, vello_cpu::peniko::FontData>,
    line_height_factor: f32,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("fonts", &self.fonts)
            .field("line_height_factor", &self.line_height_factor)
            .finish_non_exhaustive()
    }
}

impl TextRasterizer {
    pub fn new(fonts: FontBook, line_height_factor: f32) -> Self {
        Self {
            fonts,
            engine: TextLayoutEngine::new(),
            font_data: HashMap::new(),
            line_height_factor,
        }
    }

    /// Bitmap-only rasterizer with the default 1.2 line height.
    pub fn bitmap_only() -> Self {
        Self::new(FontBook::new(), 1.2)
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn line_height(&self, size: f32) -> f32 {
        size * self.line_height_factor
    }

    /// Draw `spec` onto a `width` x `height` transparent layer.
    ///
    /// Glyphs falling outside the canvas are clipped; no wrapping happens.
    #[tracing::instrument(skip(self, spec), fields(family = %spec.font_family, size = spec.size))]
    pub fn rasterize(
        &mut self,
        spec: &TextSpec,
        width: u32,
        height: u32,
    ) -> OccludeResult<ImageBuffer> {
        rgba_len(width, height)?;
        spec.validate()?;

        let lines = spec.lines();
        if lines.iter().all(|l| l.is_empty()) {
            return ImageBuffer::transparent(width, height);
        }

        let pixels = match self.fonts.resolve(&spec.font_family).cloned() {
            Some(face) => self.draw_outline(&face, spec, &lines, width, height)?,
            None => {
                tracing::trace!("family not registered, using bitmap face");
                let mut out = vec![0u8; rgba_len(width, height)?];
                draw_bitmap(
                    spec,
                    &lines,
                    self.line_height(spec.size),
                    width,
                    height,
                    &mut out,
                );
                out
            }
        };
        ImageBuffer::new(width, height, pixels)
    }

    fn font_data(&mut self, face: &FontFace) -> vello_cpu::peniko::FontData {
        self.font_data
            .entry(face.family.clone())
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(face.bytes.to_vec()),
                    0,
                )
            })
            .clone()
    }

    fn draw_outline(
        &mut self,
        face: &FontFace,
        spec: &TextSpec,
        lines: &[&str],
        width: u32,
        height: u32,
    ) -> OccludeResult<Vec<u8>> {
        let w16 = u16::try_from(width).map_err(|_| {
            OccludeError::rendering_context(format!("canvas width {width} exceeds u16"))
        })?;
        let h16 = u16::try_from(height).map_err(|_| {
            OccludeError::rendering_context(format!("canvas height {height} exceeds u16"))
        })?;

        let font = self.font_data(face);
        let brush = TextBrushRgba8::from(spec.color);
        let anchor = spec.anchor(width, height);
        let line_height = self.line_height(spec.size);
        let n = lines.len();

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let layout = self.engine.layout_line(line, face, spec.size, brush)?;
            let Some(first) = layout.lines().next() else {
                continue;
            };
            let m = first.metrics();
            let middle = f64::from(m.baseline) - f64::from(m.ascent - m.descent) / 2.0;
            let dx = anchor.x - f64::from(layout.width()) / 2.0;
            let dy = anchor.y + f64::from(line_offset(i, n, line_height)) - middle;
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((dx, dy)));

            for layout_line in layout.lines() {
                for item in layout_line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let b = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);
        let mut out = pixmap.data_as_u8_slice().to_vec();
        for px in out.chunks_exact_mut(4) {
            let straight = unpremultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&straight);
        }
        Ok(out)
    }
}

/// Draw `lines` with the 5x7 face, one dot per `size / 10` pixels.
///
/// A pixel is painted when its center falls inside a lit dot.
fn draw_bitmap(
    spec: &TextSpec,
    lines: &[&str],
    line_height: f32,
    width: u32,
    height: u32,
    out: &mut [u8],
) {
    let dot = f64::from(spec.size) / f64::from(DOTS_PER_EM);
    let rgba = spec.color.to_array();
    let anchor = spec.anchor(width, height);
    let n = lines.len();

    for (i, line) in lines.iter().enumerate() {
        let middle = anchor.y + f64::from(line_offset(i, n, line_height));
        let top = middle - f64::from(GLYPH_ROWS) * dot / 2.0;
        let left = anchor.x - f64::from(line_width_dots(line)) * dot / 2.0;

        for (ci, ch) in line.chars().enumerate() {
            let gx = left + (ci as f64) * f64::from(ADVANCE_DOTS) * dot;
            for (ry, bits) in glyph(ch).iter().enumerate() {
                for rx in 0..GLYPH_COLS {
                    if (bits >> (GLYPH_COLS - 1 - rx)) & 1 == 0 {
                        continue;
                    }
                    let x0 = gx + f64::from(rx) * dot;
                    let y0 = top + (ry as f64) * dot;
                    fill_rect(out, width, height, (x0, y0, x0 + dot, y0 + dot), rgba);
                }
            }
        }
    }
}

fn fill_rect(out: &mut [u8], width: u32, height: u32, rect: (f64, f64, f64, f64), rgba: Rgba8) {
    let (x0, y0, x1, y1) = rect;
    let span = |lo: f64, hi: f64, max: u32| -> (usize, usize) {
        let a = (lo - 0.5).ceil().clamp(0.0, f64::from(max)) as usize;
        let b = (hi - 0.5).ceil().clamp(0.0, f64::from(max)) as usize;
        (a, b)
    };
    let (xa, xb) = span(x0, x1, width);
    let (ya, yb) = span(y0, y1, height);
    let stride = width as usize * 4;
    for y in ya..yb {
        for x in xa..xb {
            let idx = y * stride + x * 4;
            out[idx..idx + 4].copy_from_slice(&rgba);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
