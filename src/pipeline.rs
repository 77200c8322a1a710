use anyhow::Result;
use image::RgbImage;

use crate::types::{FacePrediction, FrameSize, Landmarks, Point3D, LEFT_EYE, MESH_POINTS, RIGHT_EYE};

/// Produces face mesh predictions for a frame.
pub trait LandmarkEstimator {
    fn name(&self) -> String;

    /// Zero or more faces, best first. An empty vec means no face this frame.
    fn estimate_faces(&mut self, frame: &RgbImage) -> Result<Vec<FacePrediction>>;
}

/// Somewhere frames come from (a camera, a file, a test script).
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage>;
}

pub fn frame_size(frame: &RgbImage) -> FrameSize {
    let (w, h) = frame.dimensions();
    FrameSize::new(w, h)
}

impl<T: LandmarkEstimator + ?Sized> LandmarkEstimator for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn estimate_faces(&mut self, frame: &RgbImage) -> Result<Vec<FacePrediction>> {
        (**self).estimate_faces(frame)
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Result<RgbImage> {
        (**self).next_frame()
    }
}

// Stand-in when the ONNX model is not available
pub struct SimulatedEstimator {
    frame_count: u32,
}

impl SimulatedEstimator {
    /// Frames per full cycle. The face is missing for the tail of each cycle.
    const CYCLE: u32 = 240;
    const ABSENT_FROM: u32 = 210;

    pub fn new() -> Self {
        Self { frame_count: 0 }
    }
}

impl Default for SimulatedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkEstimator for SimulatedEstimator {
    fn name(&self) -> String {
        "Simulated Face Mesh".to_string()
    }

    fn estimate_faces(&mut self, frame: &RgbImage) -> Result<Vec<FacePrediction>> {
        let phase = self.frame_count % Self::CYCLE;
        self.frame_count = self.frame_count.wrapping_add(1);

        if phase >= Self::ABSENT_FROM {
            return Ok(Vec::new());
        }

        let center = frame_size(frame).center();

        // Head sways left and right, passing through the center twice per cycle
        let t = phase as f32 / Self::ABSENT_FROM as f32 * std::f32::consts::TAU;
        let sway = t.sin() * 150.0;
        let cx = center.x + sway;
        let cy = center.y;

        let radius = 110.0;
        let mut points: Vec<Point3D> = (0..MESH_POINTS)
            .map(|i| {
                let angle = (i as f32 / MESH_POINTS as f32) * std::f32::consts::TAU;
                Point3D::new(cx + angle.cos() * radius, cy + angle.sin() * radius, 0.0)
            })
            .collect();

        // Place each eye contour on a small ring around its center
        for (indices, dx) in [(LEFT_EYE, -30.0), (RIGHT_EYE, 30.0)] {
            let n = indices.len() as f32;
            for (k, &i) in indices.as_slice().iter().enumerate() {
                let angle = k as f32 / n * std::f32::consts::TAU;
                points[i] = Point3D::new(cx + dx + angle.cos() * 12.0, cy - 20.0 + angle.sin() * 5.0, 0.0);
            }
        }

        Ok(vec![FacePrediction::new(Landmarks::new(points))])
    }
}
