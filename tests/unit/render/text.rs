use super::*;

/// Inclusive pixel bounds `(x0, y0, x1, y1)` of painted pixels within rows `rows`.
fn painted_bounds(img: &ImageBuffer, rows: std::ops::Range<u32>) -> Option<(u32, u32, u32, u32)> {
    let mut b: Option<(u32, u32, u32, u32)> = None;
    for y in rows {
        for x in 0..img.width() {
            if img.pixel(x, y).unwrap()[3] == 0 {
                continue;
            }
            b = Some(match b {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    b
}

fn center((x0, y0, x1, y1): (u32, u32, u32, u32)) -> (f64, f64) {
    (
        f64::from(x0 + x1 + 1) / 2.0,
        f64::from(y0 + y1 + 1) / 2.0,
    )
}

#[test]
fn single_line_has_zero_offset() {
    assert_eq!(line_offset(0, 1, 12.0), 0.0);
}

#[test]
fn line_offsets_are_symmetric_around_anchor() {
    assert_eq!(line_offset(0, 2, 12.0), -6.0);
    assert_eq!(line_offset(1, 2, 12.0), 6.0);
    assert_eq!(line_offset(0, 3, 10.0), -10.0);
    assert_eq!(line_offset(1, 3, 10.0), 0.0);
    assert_eq!(line_offset(2, 3, 10.0), 10.0);
}

#[test]
fn two_lines_straddle_the_anchor() {
    let spec = TextSpec {
        content: "A\nB".to_owned(),
        size: 10.0,
        ..TextSpec::default()
    };
    let mut r = TextRasterizer::bitmap_only();
    let img = r.rasterize(&spec, 100, 100).unwrap();
    assert_eq!((img.width(), img.height()), (100, 100));

    let all = painted_bounds(&img, 0..100).unwrap();
    let top = painted_bounds(&img, 0..50).unwrap();
    let bottom = painted_bounds(&img, 50..100).unwrap();

    // Nothing is painted on the anchor row itself: lines sit 6px above and below.
    assert!(painted_bounds(&img, 48..52).is_none());
    assert_eq!((all.1, all.3), (top.1, bottom.3));

    let (tx, ty) = center(top);
    let (bx, by) = center(bottom);
    assert!((ty - 44.0).abs() <= 1.0, "top line centered at {ty}");
    assert!((by - 56.0).abs() <= 1.0, "bottom line centered at {by}");
    assert!((tx - 50.0).abs() <= 1.0);
    assert!((bx - 50.0).abs() <= 1.0);

    // "A" and "B" differ in shape.
    let a_row: Vec<_> = (0..100).map(|x| img.pixel(x, top.1).unwrap()[3]).collect();
    let b_row: Vec<_> = (0..100).map(|x| img.pixel(x, bottom.1).unwrap()[3]).collect();
    assert_ne!(a_row, b_row);
}

#[test]
fn single_line_is_centered_on_anchor() {
    let spec = TextSpec {
        content: "HELLO".to_owned(),
        size: 20.0,
        x: 25.0,
        y: 75.0,
        ..TextSpec::default()
    };
    let img = TextRasterizer::bitmap_only()
        .rasterize(&spec, 200, 100)
        .unwrap();
    let (cx, cy) = center(painted_bounds(&img, 0..100).unwrap());
    assert!((cx - 50.0).abs() <= 1.0, "cx = {cx}");
    assert!((cy - 75.0).abs() <= 1.0, "cy = {cy}");
}

#[test]
fn painted_pixels_carry_the_spec_color() {
    let spec = TextSpec {
        content: "X".to_owned(),
        size: 30.0,
        color: TextColor::rgba(10, 200, 30, 128),
        ..TextSpec::default()
    };
    let img = TextRasterizer::bitmap_only().rasterize(&spec, 64, 64).unwrap();
    let mut painted = 0;
    for px in img.pixels().chunks_exact(4) {
        match px[3] {
            0 => assert_eq!(px, [0, 0, 0, 0]),
            _ => {
                assert_eq!(px, [10, 200, 30, 128]);
                painted += 1;
            }
        }
    }
    assert!(painted > 0);
}

#[test]
fn empty_content_gives_transparent_layer() {
    let img = TextRasterizer::bitmap_only()
        .rasterize(&TextSpec::new(""), 8, 6)
        .unwrap();
    assert_eq!(img, ImageBuffer::transparent(8, 6).unwrap());

    let blank_lines = TextSpec::new("\n\n");
    let img = TextRasterizer::bitmap_only()
        .rasterize(&blank_lines, 8, 6)
        .unwrap();
    assert!(img.pixels().iter().all(|&b| b == 0));
}

#[test]
fn long_lines_overflow_silently() {
    let spec = TextSpec {
        content: "THIS LINE IS FAR TOO LONG FOR THE CANVAS".to_owned(),
        size: 40.0,
        x: 100.0,
        y: 0.0,
        ..TextSpec::default()
    };
    let img = TextRasterizer::bitmap_only().rasterize(&spec, 50, 20).unwrap();
    assert_eq!(img.pixels().len(), 50 * 20 * 4);
    assert!(img.pixels().chunks_exact(4).any(|p| p[3] > 0));
}

#[test]
fn zero_canvas_is_invalid_dimensions() {
    let mut r = TextRasterizer::bitmap_only();
    assert!(matches!(
        r.rasterize(&TextSpec::new("A"), 0, 10),
        Err(OccludeError::InvalidDimensions(_))
    ));
}

#[test]
fn unregistered_family_falls_back_to_bitmap() {
    let spec = TextSpec {
        content: "A".to_owned(),
        font_family: "No Such Family".to_owned(),
        size: 10.0,
        ..TextSpec::default()
    };
    let mut r = TextRasterizer::new(FontBook::new(), 1.2);
    let img = r.rasterize(&spec, 20, 20).unwrap();
    assert!(img.pixels().chunks_exact(4).any(|p| p[3] > 0));
}

const DEJAVU_SANS: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// A book holding DejaVu Sans, or `None` when the system font is not installed.
fn dejavu_book() -> Option<FontBook> {
    let path = std::path::Path::new(DEJAVU_SANS);
    if !path.exists() {
        eprintln!("skipping: {DEJAVU_SANS} not found");
        return None;
    }
    let mut fonts = FontBook::new();
    let family = fonts.load_file(path).unwrap();
    assert_eq!(family, "DejaVu Sans");
    Some(fonts)
}

#[test]
fn outline_lines_straddle_the_anchor() {
    let Some(fonts) = dejavu_book() else {
        return;
    };
    let spec = TextSpec {
        content: "A\nB".to_owned(),
        font_family: "DejaVu Sans".to_owned(),
        size: 10.0,
        color: TextColor::rgb(255, 0, 0),
        ..TextSpec::default()
    };
    let mut r = TextRasterizer::new(fonts, 1.2);
    let img = r.rasterize(&spec, 100, 100).unwrap();

    let top = painted_bounds(&img, 0..50).unwrap();
    let bottom = painted_bounds(&img, 50..100).unwrap();
    let (tx, ty) = center(top);
    let (bx, by) = center(bottom);
    assert!((ty - 44.0).abs() <= 2.0, "top line centered at {ty}");
    assert!((by - 56.0).abs() <= 2.0, "bottom line centered at {by}");
    assert!((tx - 50.0).abs() <= 2.0, "top line centered at x {tx}");
    assert!((bx - 50.0).abs() <= 2.0, "bottom line centered at x {bx}");

    // Coverage lands in alpha; the color itself stays straight red.
    let mut solid = 0;
    for p in img.pixels().chunks_exact(4).filter(|p| p[3] >= 128) {
        assert!(p[0] >= 250 && p[1] <= 5 && p[2] <= 5, "{p:?}");
        solid += 1;
    }
    assert!(solid > 0);
}

#[test]
fn outline_surface_wider_than_u16_is_unavailable() {
    let Some(fonts) = dejavu_book() else {
        return;
    };
    let spec = TextSpec {
        content: "A".to_owned(),
        font_family: "DejaVu Sans".to_owned(),
        ..TextSpec::default()
    };
    let mut r = TextRasterizer::new(fonts, 1.2);
    let err = r.rasterize(&spec, u32::from(u16::MAX) + 1, 1).unwrap_err();
    assert!(matches!(err, OccludeError::RenderingContextUnavailable(_)));
    assert!(err.is_recoverable());
}

#[test]
fn validate_rejects_bad_size_and_anchor() {
    let mut spec = TextSpec::new("A");
    spec.size = 0.0;
    assert!(spec.validate().is_err());
    spec.size = f32::NAN;
    assert!(spec.validate().is_err());

    let mut spec = TextSpec::new("A");
    spec.x = 100.5;
    assert!(spec.validate().is_err());
    spec.x = 0.0;
    spec.y = -1.0;
    assert!(spec.validate().is_err());
    spec.y = 100.0;
    assert!(spec.validate().is_ok());
}

#[test]
fn with_anchor_clamps_into_range() {
    let spec = TextSpec::new("A").with_anchor(-20.0, 140.0);
    assert_eq!((spec.x, spec.y), (0.0, 100.0));
    let spec = spec.with_anchor(33.0, f32::NAN);
    assert_eq!((spec.x, spec.y), (33.0, 50.0));
    assert_eq!(spec.content, "A");
}

#[test]
fn lines_split_on_both_line_endings() {
    assert_eq!(TextSpec::new("a\r\nb\nc").lines(), vec!["a", "b", "c"]);
    assert_eq!(TextSpec::new("solo").lines(), vec!["solo"]);
}

#[test]
fn json_spec_fills_defaults() {
    let spec = TextSpec::from_json_str(r##"{"content":"HI","color":"#ff000080","y":10}"##).unwrap();
    assert_eq!(spec.content, "HI");
    assert_eq!(spec.color, TextColor::rgba(255, 0, 0, 128));
    assert_eq!((spec.x, spec.y), (50.0, 10.0));
    assert_eq!(spec.size, 48.0);

    assert!(TextSpec::from_json_str(r#"{"content":"HI","bogus":1}"#).is_err());
    assert!(TextSpec::from_json_str(r#"{"content":"HI","x":500}"#).is_err());
}
