use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::FaceDetectorBackend;
use crate::detect::result::BoundingBox;

/// Stub backend for testing. Replays a scripted sequence of detections.
///
/// Each call to `detect` pops the next scripted frame; once the script is
/// exhausted, the backend keeps returning the last scripted frame so a test
/// can run the loop for more iterations than it scripted.
pub struct StubFaceBackend {
    script: VecDeque<Vec<BoundingBox>>,
    held: Vec<BoundingBox>,
}

impl StubFaceBackend {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            held: Vec::new(),
        }
    }

    /// Script one set of detections per upcoming frame.
    pub fn with_script(frames: Vec<Vec<BoundingBox>>) -> Self {
        Self {
            script: frames.into(),
            held: Vec::new(),
        }
    }

    /// Return the same detections on every frame.
    pub fn fixed(boxes: Vec<BoundingBox>) -> Self {
        Self {
            script: VecDeque::new(),
            held: boxes,
        }
    }
}

impl Default for StubFaceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetectorBackend for StubFaceBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _luma: &[u8], _width: u32, _height: u32) -> Result<Vec<BoundingBox>> {
        if let Some(frame) = self.script.pop_front() {
            self.held = frame;
        }
        Ok(self.held.clone())
    }
}
