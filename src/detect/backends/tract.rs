#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::FaceDetectorBackend;
use crate::detect::result::BoundingBox;

/// Overlap above which two candidate boxes are considered duplicates.
const NMS_IOU_THRESHOLD: f32 = 0.5;

/// Tract-based face detector for UltraFace-family ONNX models.
///
/// Expects a model with a fixed `1x3xHxW` input and two outputs: scores
/// `1xNx2` (background, face) and boxes `1xNx4` (normalized x1,y1,x2,y2).
/// Frames are resized to the model input with nearest-neighbor sampling and
/// the grayscale plane is replicated across the three input channels.
///
/// Loads the model file once at startup; performs no other disk or network
/// I/O.
pub struct TractFaceBackend {
    model: TypedRunnableModel<TypedModel>,
    input_width: u32,
    input_height: u32,
    score_threshold: f32,
    min_size: u32,
}

impl TractFaceBackend {
    /// Load an ONNX face detection model and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_width: u32,
        input_height: u32,
        min_size: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
            score_threshold: 0.7,
            min_size,
        })
    }

    /// Override the default face-score threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn build_input(&self, luma: &[u8], width: u32, height: u32) -> Result<Tensor> {
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

        let in_w = self.input_width as usize;
        let in_h = self.input_height as usize;
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, in_h, in_w), |(_, _channel, y, x)| {
                // Nearest-neighbor sample; grayscale replicated per channel.
                let src_x = (x * width as usize) / in_w;
                let src_y = (y * height as usize) / in_h;
                let v = luma[src_y * width as usize + src_x] as f32;
                (v - 127.0) / 128.0
            });

        Ok(input.into_tensor())
    }

    fn extract_boxes(
        &self,
        outputs: TVec<TValue>,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Vec<BoundingBox>> {
        let scores = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no score output"))?
            .to_array_view::<f32>()
            .context("score tensor was not f32")?;
        let boxes = outputs
            .get(1)
            .ok_or_else(|| anyhow!("model produced no box output"))?
            .to_array_view::<f32>()
            .context("box tensor was not f32")?;

        let scores = scores
            .to_shape((scores.len() / 2, 2))
            .context("score tensor shape")?;
        let boxes = boxes
            .to_shape((boxes.len() / 4, 4))
            .context("box tensor shape")?;
        if scores.shape()[0] != boxes.shape()[0] {
            return Err(anyhow!(
                "score/box count mismatch: {} vs {}",
                scores.shape()[0],
                boxes.shape()[0]
            ));
        }

        let mut candidates: Vec<(f32, BoundingBox)> = Vec::new();
        for (row, bx) in boxes.outer_iter().enumerate() {
            let face_score = scores[(row, 1)];
            if face_score < self.score_threshold {
                continue;
            }
            let x1 = (bx[0].clamp(0.0, 1.0) * frame_width as f32) as i32;
            let y1 = (bx[1].clamp(0.0, 1.0) * frame_height as f32) as i32;
            let x2 = (bx[2].clamp(0.0, 1.0) * frame_width as f32) as i32;
            let y2 = (bx[3].clamp(0.0, 1.0) * frame_height as f32) as i32;
            if x2 <= x1 || y2 <= y1 {
                continue;
            }
            let cand = BoundingBox::new(x1, y1, (x2 - x1) as u32, (y2 - y1) as u32);
            if cand.width < self.min_size || cand.height < self.min_size {
                continue;
            }
            candidates.push((face_score, cand));
        }

        Ok(non_max_suppression(candidates))
    }
}

impl FaceDetectorBackend for TractFaceBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Result<Vec<BoundingBox>> {
        let input = self.build_input(luma, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_boxes(outputs, width, height)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = vec![0u8; (self.input_width * self.input_height) as usize];
        self.detect(&blank, self.input_width, self.input_height)
            .map(|_| ())
            .context("warm-up inference failed")
    }
}

/// Greedy NMS: keep the highest-scoring box, drop everything overlapping it.
fn non_max_suppression(mut candidates: Vec<(f32, BoundingBox)>) -> Vec<BoundingBox> {
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut kept: Vec<BoundingBox> = Vec::new();
    for (_, cand) in candidates {
        if kept.iter().all(|k| iou(k, &cand) < NMS_IOU_THRESHOLD) {
            kept.push(cand);
        }
    }
    kept
}

fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ax2 = a.x + a.width as i32;
    let ay2 = a.y + a.height as i32;
    let bx2 = b.x + b.width as i32;
    let by2 = b.y + b.height as i32;

    let ix = (ax2.min(bx2) - a.x.max(b.x)).max(0) as f32;
    let iy = (ay2.min(by2) - a.y.max(b.y)).max(0) as f32;
    let intersection = ix * iy;
    let union = a.area() as f32 + b.area() as f32 - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(20, 20, 10, 10);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BoundingBox::new(5, 5, 10, 10);
        assert!((iou(&a, &a) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn nms_drops_overlapping_lower_score() {
        let strong = BoundingBox::new(0, 0, 20, 20);
        let duplicate = BoundingBox::new(2, 2, 20, 20);
        let separate = BoundingBox::new(100, 100, 20, 20);
        let kept = non_max_suppression(vec![
            (0.9, strong),
            (0.8, duplicate),
            (0.75, separate),
        ]);
        assert_eq!(kept, vec![strong, separate]);
    }
}
