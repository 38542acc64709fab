use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_keeps_straight_alpha() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba.clone()).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width(), 1);
    assert_eq!(decoded.height(), 1);
    assert_eq!(decoded.pixels(), src_rgba.as_slice());
}

#[test]
fn garbage_bytes_are_decode_failed() {
    assert!(matches!(
        decode_image(b"definitely not an image"),
        Err(OccludeError::DecodeFailed(_))
    ));
}

#[test]
fn encode_png_decodes_back_to_same_pixels() {
    let img = ImageBuffer::filled(3, 2, [12, 34, 56, 255]).unwrap();
    let bytes = encode_png(&img).unwrap();
    assert_eq!(decode_image(&bytes).unwrap(), img);
}

#[test]
fn empty_mask_cannot_be_saved() {
    let path = std::env::temp_dir().join("occlude_empty_mask.png");
    assert!(matches!(
        save_mask_png(&Mask::empty(), &path),
        Err(OccludeError::InvalidDimensions(_))
    ));
}
