use super::*;

#[test]
fn new_rejects_zero_dimensions() {
    assert!(matches!(
        ImageBuffer::new(0, 4, Vec::new()),
        Err(OccludeError::InvalidDimensions(_))
    ));
    assert!(matches!(
        ImageBuffer::new(4, 0, Vec::new()),
        Err(OccludeError::InvalidDimensions(_))
    ));
}

#[test]
fn new_rejects_length_mismatch() {
    assert!(matches!(
        ImageBuffer::new(2, 2, vec![0; 15]),
        Err(OccludeError::InvalidDimensions(_))
    ));
}

#[test]
fn filled_and_pixel_lookup() {
    let img = ImageBuffer::filled(3, 2, [1, 2, 3, 4]).unwrap();
    assert_eq!(img.pixels().len(), 3 * 2 * 4);
    assert_eq!(img.pixel_count(), 6);
    assert_eq!(img.pixel(2, 1), Some([1, 2, 3, 4]));
    assert_eq!(img.pixel(3, 0), None);
}

#[test]
fn rgba_image_conversion_keeps_pixels() {
    let mut src = image::RgbaImage::new(2, 1);
    src.put_pixel(1, 0, image::Rgba([9, 8, 7, 6]));
    let img = ImageBuffer::from_rgba_image(src.clone()).unwrap();
    assert_eq!(img.pixel(1, 0), Some([9, 8, 7, 6]));
    assert_eq!(img.to_rgba_image(), src);
}

#[test]
fn view_validation_flags_zero_width() {
    let view = RgbaView::new(0, 10, &[]);
    assert!(matches!(
        view.validate(),
        Err(OccludeError::InvalidDimensions(_))
    ));
}
