/// An axis-aligned detection in pixel coordinates.
///
/// Produced fresh per frame by the detector; owned by the current loop
/// iteration only. `width` and `height` are always nonzero for detections
/// emitted by the backends in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Box center using floor division, matching `FrameGeometry::center`.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_does_not_overflow_u32() {
        let huge = BoundingBox::new(0, 0, u32::MAX, u32::MAX);
        assert_eq!(huge.area(), u32::MAX as u64 * u32::MAX as u64);
    }

    #[test]
    fn center_is_floored() {
        let b = BoundingBox::new(10, 20, 5, 5);
        assert_eq!(b.center(), (12, 22));
    }
}
