use anyhow::Result;

use crate::detect::result::BoundingBox;

/// Face detector backend trait.
///
/// Implementations receive one grayscale frame per call and return zero or
/// more face boxes in pixel coordinates. The pixel slice is read-only and
/// ephemeral; backends must not retain it beyond the call.
///
/// Detection order matters: the target selector breaks area ties by taking
/// the first maximal box, so backends should enumerate detections in a
/// stable order.
pub trait FaceDetectorBackend: Send {
    /// Backend identifier, as named in the `detector.backend` config field.
    fn name(&self) -> &'static str;

    /// Run detection on a grayscale frame (one byte per pixel, row-major).
    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Result<Vec<BoundingBox>>;

    /// Optional warm-up hook, called once before the loop starts.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
