//! Decoded camera frames.
//!
//! A `Frame` is the unit of work for one loop iteration: RGB pixels plus the
//! geometry the controller measures positional error against. Frames are
//! recreated every iteration and have no identity beyond it.

/// Width/height of the current frame, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    /// Frame center using floor division, matching the error computation
    /// in the tracking controller.
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

/// A decoded RGB frame.
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Create a frame from tightly packed RGB bytes. Called by the ingest layer.
    pub(crate) fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 3) as usize);
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry {
            width: self.width,
            height: self.height,
        }
    }

    /// Raw RGB bytes, row-major, 3 bytes per pixel.
    pub fn rgb(&self) -> &[u8] {
        &self.pixels
    }

    /// Grayscale conversion for the detector (Rec. 601 integer weights).
    pub fn to_luma(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(3)
            .map(|px| {
                let r = px[0] as u32;
                let g = px[1] as u32;
                let b = px[2] as u32;
                ((77 * r + 150 * g + 29 * b) >> 8) as u8
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_uses_floor_division() {
        let geom = FrameGeometry {
            width: 321,
            height: 241,
        };
        assert_eq!(geom.center(), (160, 120));
    }

    #[test]
    fn luma_preserves_extremes() {
        let frame = Frame::new(vec![0, 0, 0, 255, 255, 255], 2, 1);
        let luma = frame.to_luma();
        assert_eq!(luma[0], 0);
        assert!(luma[1] >= 250);
    }

    #[test]
    fn luma_has_one_byte_per_pixel() {
        let frame = Frame::new(vec![10u8; 4 * 3 * 3], 4, 3);
        assert_eq!(frame.to_luma().len(), 12);
    }
}
