use image::RgbImage;

/// One detection from the external object-detection backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// [x1, y1, x2, y2] in frame pixels.
    pub bounds: [i32; 4],
    pub confidence: f32,
    pub label: String,
}

impl Detection {
    pub fn center(&self) -> (f32, f32) {
        let [x1, y1, x2, y2] = self.bounds;
        ((x1 + x2) as f32 / 2.0, (y1 + y2) as f32 / 2.0)
    }
}

/// External object-detection model. The core filters the returned list by
/// its own label allow-lists and treats a backend error as zero
/// detections for that tick; it never interprets the model's internals.
pub trait Detector: Send {
    fn detect(&mut self, frame: &RgbImage, min_confidence: f32) -> anyhow::Result<Vec<Detection>>;
}

/// Placeholder backend: always empty. Used until a real model is wired.
pub struct NullDetector;

impl Detector for NullDetector {
    fn detect(&mut self, _frame: &RgbImage, _min_confidence: f32) -> anyhow::Result<Vec<Detection>> {
        Ok(Vec::new())
    }
}
