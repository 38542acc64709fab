use super::*;
use crate::mask::MaskOrigin;

fn mask_with(width: u32, height: u32, fg: &[(u32, u32)]) -> Mask {
    let mut data = vec![0u8; (width * height) as usize];
    for &(x, y) in fg {
        data[(y * width + x) as usize] = FOREGROUND;
    }
    Mask::from_binary(width, height, data, MaskOrigin::GradientEdge).unwrap()
}

fn scatter(width: u32, height: u32) -> Mask {
    let mut fg = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if (x * 7 + y * 13) % 29 == 0 {
                fg.push((x, y));
            }
        }
    }
    mask_with(width, height, &fg)
}

#[test]
fn zero_iterations_is_identity() {
    let m = scatter(12, 9);
    assert_eq!(dilate(&m, 0, false).data(), m.data());
}

#[test]
fn single_pixel_grows_to_3x3_then_5x5() {
    let m = mask_with(9, 9, &[(4, 4)]);
    let one = dilate(&m, 1, false);
    assert_eq!(one.foreground_count(), 9);
    let two = dilate(&m, 2, false);
    assert_eq!(two.foreground_count(), 25);
    for y in 2..=6usize {
        for x in 2..=6usize {
            assert_eq!(two.data()[y * 9 + x], FOREGROUND);
        }
    }
}

#[test]
fn growth_within_one_iteration_is_order_independent() {
    // With an in-place update, a left-to-right scan would smear (1,1) across the whole row.
    let m = mask_with(8, 3, &[(1, 1)]);
    let one = dilate(&m, 1, false);
    assert_eq!(one.data()[8 + 3], 0);
    assert_eq!(one.data()[8 + 2], FOREGROUND);
}

#[test]
fn border_pixels_are_never_evaluated() {
    let m = mask_with(5, 5, &[(1, 1)]);
    let out = dilate(&m, 3, false);
    for x in 0..5usize {
        assert_eq!(out.data()[x], 0, "top row x={x}");
        assert_eq!(out.data()[20 + x], 0, "bottom row x={x}");
    }
    for y in 0..5usize {
        assert_eq!(out.data()[y * 5], 0, "left col y={y}");
        assert_eq!(out.data()[y * 5 + 4], 0, "right col y={y}");
    }
}

#[test]
fn border_foreground_is_kept() {
    let m = mask_with(4, 4, &[(0, 0)]);
    let out = dilate(&m, 1, false);
    assert_eq!(out.data()[0], FOREGROUND);
    assert_eq!(out.data()[5], FOREGROUND);
}

#[test]
fn more_iterations_yield_a_superset() {
    let m = scatter(31, 17);
    let mut prev = dilate(&m, 0, false);
    assert!(prev.is_superset_of(&m));
    for n in 1..6 {
        let next = dilate(&m, n, false);
        assert!(next.is_superset_of(&prev), "iteration {n}");
        prev = next;
    }
}

#[test]
fn all_zero_mask_stays_all_zero() {
    let m = mask_with(4, 4, &[]);
    for n in 0..5 {
        assert_eq!(dilate(&m, n, false).foreground_count(), 0);
    }
}

#[test]
fn empty_mask_stays_empty() {
    assert!(dilate(&Mask::empty(), 3, false).is_empty());
}

#[test]
fn parallel_matches_serial() {
    let m = scatter(40, 33);
    for n in [1, 2, 4] {
        assert_eq!(dilate(&m, n, true).data(), dilate(&m, n, false).data());
    }
}
