//! Decides whether both eyes sit close enough to the frame center.

use crate::types::{FrameSize, Point2D};

/// Default allowed deviation from frame center, in pixels.
pub const DEFAULT_THRESHOLD: f32 = 50.0;

/// Absolute per-axis distances of each eye center from the frame center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeOffsets {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
}

impl GazeOffsets {
    /// Largest of the four distances.
    pub fn max(&self) -> f32 {
        self.left_x.max(self.left_y).max(self.right_x).max(self.right_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeClassifier {
    threshold: f32,
}

impl Default for GazeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl GazeClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn offsets(&self, left: Point2D, right: Point2D, frame: FrameSize) -> GazeOffsets {
        let c = frame.center();
        GazeOffsets {
            left_x: (left.x - c.x).abs(),
            left_y: (left.y - c.y).abs(),
            right_x: (right.x - c.x).abs(),
            right_y: (right.y - c.y).abs(),
        }
    }

    /// True when all four axis distances are strictly under the threshold.
    ///
    /// The accepted region is a square around the frame center, not a circle.
    pub fn is_looking_at_camera(&self, left: Point2D, right: Point2D, frame: FrameSize) -> bool {
        let o = self.offsets(left, right, frame);
        o.left_x < self.threshold
            && o.left_y < self.threshold
            && o.right_x < self.threshold
            && o.right_y < self.threshold
    }
}
