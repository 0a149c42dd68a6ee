//! Target selection.

use crate::detect::result::BoundingBox;

/// Pick the region of interest from the detector's output: the box with the
/// largest area. Ties keep the detector's enumeration order (the first
/// maximal box wins), so selection is stable across frames with identical
/// detections. Returns `None` when nothing was detected.
pub fn select_target(boxes: &[BoundingBox]) -> Option<&BoundingBox> {
    let mut best: Option<&BoundingBox> = None;
    for candidate in boxes {
        match best {
            Some(current) if candidate.area() <= current.area() => {}
            _ => best = Some(candidate),
        }
    }
    best
}
