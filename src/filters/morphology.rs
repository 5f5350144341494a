//! Binary morphology on selection masks: Erode, Dilate, Open.
//!
//! All operations use a 3×3 square structuring element. Neighbours outside
//! the image are ignored rather than treated as background, so a mask that
//! fills the whole slice survives erosion unchanged.

use crate::raster::Mask;

// ============================================================================
// Erode
// ============================================================================

/// Binary erosion: a pixel stays set only if every in-bounds 3×3 neighbour is set.
pub fn erode_mask(input: &Mask) -> Mask {
    let (width, height) = (input.width(), input.height());
    let mut output = Mask::new(width, height);

    for y in 0..height {
        for x in 0..width {
            if input.is_set(x, y) && neighbourhood(x, y, width, height).all(|(nx, ny)| input.is_set(nx, ny)) {
                output.set(x, y);
            }
        }
    }

    output
}

// ============================================================================
// Dilate
// ============================================================================

/// Binary dilation: a pixel becomes set if any in-bounds 3×3 neighbour is set.
pub fn dilate_mask(input: &Mask) -> Mask {
    let (width, height) = (input.width(), input.height());
    let mut output = Mask::new(width, height);

    for y in 0..height {
        for x in 0..width {
            if neighbourhood(x, y, width, height).any(|(nx, ny)| input.is_set(nx, ny)) {
                output.set(x, y);
            }
        }
    }

    output
}

// ============================================================================
// Open
// ============================================================================

/// One erosion pass followed by one dilation pass.
///
/// Removes isolated pixels and one-pixel spurs from the boundary while
/// leaving solid regions at their original extent.
pub fn open_mask(input: &Mask) -> Mask {
    dilate_mask(&erode_mask(input))
}

/// In-bounds pixels of the 3×3 window centred on `(x, y)`, including the centre.
#[inline]
fn neighbourhood(
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let x_end = (x + 2).min(width);
    let y_end = (y + 2).min(height);
    (y.saturating_sub(1)..y_end)
        .flat_map(move |ny| (x.saturating_sub(1)..x_end).map(move |nx| (nx, ny)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(size: usize, from: usize, to: usize) -> Mask {
        let mut mask = Mask::new(size, size);
        for y in from..to {
            for x in from..to {
                mask.set(x, y);
            }
        }
        mask
    }

    #[test]
    fn test_erode_shrinks_square() {
        let mask = square_mask(10, 2, 7);
        let eroded = erode_mask(&mask);
        assert_eq!(eroded.count(), 9);
        assert!(eroded.is_set(4, 4));
        assert!(!eroded.is_set(2, 2));
    }

    #[test]
    fn test_dilate_grows_pixel() {
        let mut mask = Mask::new(5, 5);
        mask.set(2, 2);
        assert_eq!(dilate_mask(&mask).count(), 9);

        let mut corner = Mask::new(5, 5);
        corner.set(0, 0);
        assert_eq!(dilate_mask(&corner).count(), 4);
    }

    #[test]
    fn test_open_removes_noise_keeps_body() {
        let mut mask = square_mask(12, 2, 8);
        // Isolated speck and a one-pixel spur.
        mask.set(10, 10);
        mask.set(8, 4);
        let opened = open_mask(&mask);
        assert!(!opened.is_set(10, 10));
        assert!(!opened.is_set(8, 4));
        assert_eq!(opened.count(), 36);
    }

    #[test]
    fn test_full_mask_survives_open() {
        let mask = square_mask(6, 0, 6);
        assert_eq!(open_mask(&mask), mask);
    }
}
