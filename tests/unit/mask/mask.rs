use super::*;

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ImageBuffer {
    ImageBuffer::filled(width, height, rgba).unwrap()
}

#[test]
fn from_binary_rejects_intermediate_values() {
    assert!(matches!(
        Mask::from_binary(2, 1, vec![0, 128], MaskOrigin::GradientEdge),
        Err(OccludeError::Validation(_))
    ));
}

#[test]
fn from_binary_rejects_length_mismatch_and_zero_size() {
    assert!(Mask::from_binary(2, 2, vec![0; 3], MaskOrigin::GradientEdge).is_err());
    assert!(Mask::from_binary(0, 2, Vec::new(), MaskOrigin::GradientEdge).is_err());
}

#[test]
fn from_binary_rejects_cutout_of_other_size() {
    let cutout = Arc::new(solid(3, 3, [0, 0, 0, 255]));
    assert!(Mask::from_binary(2, 2, vec![0; 4], MaskOrigin::AlphaThreshold { cutout }).is_err());
}

#[test]
fn superset_relation() {
    let small = Mask::from_binary(3, 1, vec![0, 255, 0], MaskOrigin::GradientEdge).unwrap();
    let big = Mask::from_binary(3, 1, vec![255, 255, 0], MaskOrigin::GradientEdge).unwrap();
    assert!(big.is_superset_of(&small));
    assert!(!small.is_superset_of(&big));
    assert!(small.is_superset_of(&small));
}

#[test]
fn generator_output_is_binary_and_sized_for_every_mode() {
    let mut pixels = Vec::new();
    for y in 0..9u32 {
        for x in 0..11u32 {
            let v = if x < 5 { 10 } else { 240 };
            pixels.extend_from_slice(&[v, (y * 20) as u8, v, 255]);
        }
    }
    let img = ImageBuffer::new(11, 9, pixels).unwrap();

    for mode in [DetectionMode::Standard, DetectionMode::Fast] {
        let generator = MaskGenerator::for_mode(&PipelineConfig::default(), mode);
        let mask = generator.detect_edges(img.view());
        assert_eq!(mask.len(), 11 * 9);
        assert!(mask.data().iter().all(|&v| v == 0 || v == 255));
        assert!(mask.foreground_count() > 0, "mode {mode:?} found no edge");
    }
}

#[test]
fn generator_recovers_from_zero_width_with_empty_mask() {
    let generator = MaskGenerator::from_config(&PipelineConfig::default());
    let mask = generator.detect_edges(RgbaView::new(0, 5, &[]));
    assert!(mask.is_empty());
    assert!(!mask.matches(0, 5));
}

#[test]
fn generator_cutout_path_tags_origin() {
    let generator = MaskGenerator::from_config(&PipelineConfig::default());
    let mask = generator.detect_from_cutout(Arc::new(solid(2, 2, [9, 9, 9, 200])));
    assert_eq!(mask.data(), &[255; 4]);
    assert_eq!(mask.origin().name(), "alpha_threshold");
}
