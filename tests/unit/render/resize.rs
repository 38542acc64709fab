use super::*;

#[test]
fn small_images_keep_their_size() {
    assert_eq!(fit_within(800, 600, 1200).unwrap(), (800, 600));
    assert_eq!(fit_within(1200, 1200, 1200).unwrap(), (1200, 1200));
}

#[test]
fn long_edge_is_clamped_and_ratio_kept() {
    assert_eq!(fit_within(2400, 1200, 1200).unwrap(), (1200, 600));
    assert_eq!(fit_within(1000, 4000, 1200).unwrap(), (300, 1200));
}

#[test]
fn extreme_ratios_never_drop_below_one() {
    assert_eq!(fit_within(10_000, 3, 1200).unwrap(), (1200, 1));
    assert_eq!(fit_within(1, 5000, 100).unwrap(), (1, 100));
}

#[test]
fn bounds_and_ratio_hold_across_a_grid() {
    for &max in &[1u32, 7, 64, 1200] {
        for w in (1..3000u32).step_by(211) {
            for h in (1..3000u32).step_by(197) {
                let (ow, oh) = fit_within(w, h, max).unwrap();
                assert!(ow >= 1 && oh >= 1);
                if w <= max && h <= max {
                    assert_eq!((ow, oh), (w, h));
                    continue;
                }
                assert!(ow <= max && oh <= max, "{w}x{h} -> {ow}x{oh} (max {max})");
                let scale = f64::from(max) / f64::from(w.max(h));
                assert!((f64::from(ow) - f64::from(w) * scale).abs() <= 1.0);
                assert!((f64::from(oh) - f64::from(h) * scale).abs() <= 1.0);
            }
        }
    }
}

#[test]
fn zero_dimensions_are_invalid() {
    assert!(matches!(
        fit_within(0, 100, 1200),
        Err(OccludeError::InvalidDimensions(_))
    ));
    assert!(matches!(
        fit_within(100, 0, 1200),
        Err(OccludeError::InvalidDimensions(_))
    ));
    assert!(matches!(
        fit_within(100, 100, 0),
        Err(OccludeError::InvalidDimensions(_))
    ));
}

#[test]
fn resize_to_fit_produces_bounded_buffer() {
    let img = ImageBuffer::filled(40, 10, [10, 20, 30, 255]).unwrap();
    let out = resize_to_fit(&img, 20).unwrap();
    assert_eq!((out.width(), out.height()), (20, 5));
    assert_eq!(out.pixels().len(), 20 * 5 * 4);
    assert_eq!(out.pixel(3, 2), Some([10, 20, 30, 255]));
}

#[test]
fn resize_exact_same_size_is_a_copy() {
    let img = ImageBuffer::filled(3, 3, [1, 2, 3, 4]).unwrap();
    assert_eq!(resize_exact(&img, 3, 3).unwrap(), img);
}
