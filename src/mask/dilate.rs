use rayon::prelude::*;

use crate::mask::{FOREGROUND, Mask};

/// Grow foreground regions by `iterations` rounds of 8-neighbor dilation.
///
/// Each round reads the previous round's full snapshot, so growth within a round does not
/// depend on scan order. Border pixels are never evaluated and keep their value. Foreground
/// never shrinks, and `dilate(m, n + 1)` is always a superset of `dilate(m, n)`; zero
/// iterations return the mask unchanged. An empty mask stays empty.
#[tracing::instrument(skip(mask), fields(w = mask.width(), h = mask.height()))]
pub fn dilate(mask: &Mask, iterations: u32, parallel: bool) -> Mask {
    if mask.is_empty() || iterations == 0 {
        return mask.clone();
    }
    let w = mask.width() as usize;
    let h = mask.height() as usize;
    if w < 3 || h < 3 {
        return mask.clone();
    }

    let mut prev = mask.data().to_vec();
    let mut next = prev.clone();
    for _ in 0..iterations {
        next.copy_from_slice(&prev);
        if parallel {
            next.par_chunks_mut(w)
                .enumerate()
                .for_each(|(y, row)| dilate_row(&prev, w, h, y, row));
        } else {
            next.chunks_mut(w)
                .enumerate()
                .for_each(|(y, row)| dilate_row(&prev, w, h, y, row));
        }
        std::mem::swap(&mut prev, &mut next);
    }

    Mask::from_parts(mask.width(), mask.height(), prev, mask.origin().clone())
}

fn dilate_row(prev: &[u8], w: usize, h: usize, y: usize, row: &mut [u8]) {
    if y == 0 || y + 1 >= h {
        return;
    }
    for x in 1..w - 1 {
        if row[x] == FOREGROUND {
            continue;
        }
        let hit = (y - 1..=y + 1).any(|ny| {
            let base = ny * w;
            prev[base + x - 1..=base + x + 1]
                .iter()
                .any(|&v| v == FOREGROUND)
        });
        if hit {
            row[x] = FOREGROUND;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/dilate.rs"]
mod tests;
