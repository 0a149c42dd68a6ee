use anyhow::{anyhow, Result};

use crate::detect::backend::FaceDetectorBackend;
use crate::detect::result::BoundingBox;

/// Luma intensity above which a pixel counts as part of a blob.
const BRIGHTNESS_THRESHOLD: u8 = 200;

/// CPU backend that finds one bright blob per frame.
///
/// Intended for bring-up and loop tests against the synthetic `stub://`
/// source, which renders a bright square on a dark background. A pixel is
/// part of the blob if it is above `BRIGHTNESS_THRESHOLD` and at least
/// `min_neighbors` of its 8 neighbors are too (single-pixel noise rejection).
/// The emitted box is the bounding box of all such pixels, dropped when
/// either dimension is below `min_size`.
pub struct LumaBlobBackend {
    min_neighbors: u32,
    min_size: u32,
}

impl LumaBlobBackend {
    pub fn new(min_neighbors: u32, min_size: u32) -> Self {
        Self {
            min_neighbors,
            min_size,
        }
    }
}

impl FaceDetectorBackend for LumaBlobBackend {
    fn name(&self) -> &'static str {
        "luma"
    }

    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Result<Vec<BoundingBox>> {
        let expected = width as usize * height as usize;
        if luma.len() != expected {
            return Err(anyhow!(
                "expected {} luma bytes for {}x{}, received {}",
                expected,
                width,
                height,
                luma.len()
            ));
        }
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let bright = |x: i64, y: i64| -> bool {
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                return false;
            }
            luma[y as usize * width as usize + x as usize] >= BRIGHTNESS_THRESHOLD
        };

        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut hits = 0u64;

        for y in 0..height {
            for x in 0..width {
                if !bright(x as i64, y as i64) {
                    continue;
                }
                let mut neighbors = 0u32;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if (dx != 0 || dy != 0) && bright(x as i64 + dx, y as i64 + dy) {
                            neighbors += 1;
                        }
                    }
                }
                if neighbors < self.min_neighbors.min(8) {
                    continue;
                }
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                hits += 1;
            }
        }

        if hits == 0 {
            return Ok(Vec::new());
        }

        let blob = BoundingBox::new(
            min_x as i32,
            min_y as i32,
            max_x - min_x + 1,
            max_y - min_y + 1,
        );
        if blob.width < self.min_size || blob.height < self.min_size {
            return Ok(Vec::new());
        }
        Ok(vec![blob])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_square(
        width: u32,
        height: u32,
        x0: u32,
        y0: u32,
        size: u32,
    ) -> Vec<u8> {
        let mut luma = vec![20u8; (width * height) as usize];
        for y in y0..(y0 + size).min(height) {
            for x in x0..(x0 + size).min(width) {
                luma[(y * width + x) as usize] = 255;
            }
        }
        luma
    }

    #[test]
    fn finds_bright_square() {
        let luma = frame_with_square(64, 48, 10, 12, 16);
        let mut backend = LumaBlobBackend::new(5, 8);
        let boxes = backend.detect(&luma, 64, 48).unwrap();
        assert_eq!(boxes, vec![BoundingBox::new(10, 12, 16, 16)]);
    }

    #[test]
    fn dark_frame_yields_nothing() {
        let luma = vec![30u8; 64 * 48];
        let mut backend = LumaBlobBackend::new(5, 8);
        assert!(backend.detect(&luma, 64, 48).unwrap().is_empty());
    }

    #[test]
    fn isolated_bright_pixels_are_rejected() {
        let mut luma = vec![20u8; 64 * 48];
        luma[5 * 64 + 5] = 255;
        luma[40 * 64 + 60] = 255;
        let mut backend = LumaBlobBackend::new(5, 1);
        assert!(backend.detect(&luma, 64, 48).unwrap().is_empty());
    }

    #[test]
    fn undersized_blob_is_dropped() {
        let luma = frame_with_square(64, 48, 10, 12, 4);
        let mut backend = LumaBlobBackend::new(3, 8);
        assert!(backend.detect(&luma, 64, 48).unwrap().is_empty());
    }

    #[test]
    fn wrong_buffer_length_is_an_error() {
        let mut backend = LumaBlobBackend::new(5, 8);
        assert!(backend.detect(&[0u8; 10], 64, 48).is_err());
    }
}
