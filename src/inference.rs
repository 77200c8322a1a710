use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{info, warn};

use crate::detector::FaceDetector;
use crate::error::GazeError;
use crate::pipeline::LandmarkEstimator;
use crate::types::{FacePrediction, Landmarks, Point3D, Rect, MESH_POINTS};

/// Side of the square mesh model input.
const MESH_INPUT: u32 = 192;

/// MediaPipe face mesh run through ONNX Runtime.
pub struct FaceMeshEstimator {
    session: Session,
    detector: Option<FaceDetector>,
}

impl FaceMeshEstimator {
    pub fn new(model_path: &str, detector_path: &str) -> Result<Self> {
        let detector = if Path::new(detector_path).exists() {
            info!(path = detector_path, "loading face detector");
            Some(FaceDetector::new(detector_path)?)
        } else {
            warn!(path = detector_path, "face detector not found, meshing the full frame");
            None
        };

        info!(path = model_path, "loading face mesh");
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([ort::execution_providers::CPUExecutionProvider::default().build()])?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load face mesh from {}", model_path))?;

        Ok(Self { session, detector })
    }

    fn run_mesh(&mut self, crop: &RgbImage) -> Result<Vec<f32>> {
        let resized = image::imageops::resize(crop, MESH_INPUT, MESH_INPUT, FilterType::Triangle);

        // NHWC, scaled to [-1, 1]
        let input: Vec<f32> = resized
            .pixels()
            .flat_map(|p| p.0)
            .map(|v| v as f32 / 127.5 - 1.0)
            .collect();

        let side = MESH_INPUT as usize;
        let tensor = ort::value::Tensor::from_array((vec![1, side, side, 3], input))
            .map_err(|e| GazeError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| GazeError::Inference(e.to_string()))?;
        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| GazeError::Inference(e.to_string()))?;
        Ok(data.to_vec())
    }
}

/// Face box grown by a quarter and clipped to the frame.
fn padded_roi(rect: Rect, frame_w: f32, frame_h: f32) -> Rect {
    let pad_w = rect.width * 0.25;
    let pad_h = rect.height * 0.25;
    let x = (rect.x - pad_w / 2.0).max(0.0);
    let y = (rect.y - pad_h / 2.0).max(0.0);
    let w = (rect.width + pad_w).min(frame_w - x);
    let h = (rect.height + pad_h).min(frame_h - y);
    Rect::new(x, y, w, h)
}

/// Maps raw mesh output (model input pixels) back into frame pixels.
fn decode_mesh(raw: &[f32], roi: Rect) -> Result<Landmarks, GazeError> {
    if raw.len() < MESH_POINTS * 3 {
        return Err(GazeError::IndexOutOfRange {
            index: MESH_POINTS * 3 - 1,
            len: raw.len(),
        });
    }
    let sx = roi.width / MESH_INPUT as f32;
    let sy = roi.height / MESH_INPUT as f32;
    let points = raw
        .chunks_exact(3)
        .take(MESH_POINTS)
        .map(|p| Point3D::new(roi.x + p[0] * sx, roi.y + p[1] * sy, p[2]))
        .collect();
    Ok(Landmarks::new(points))
}

impl LandmarkEstimator for FaceMeshEstimator {
    fn name(&self) -> String {
        "Face Mesh (468 pts)".to_string()
    }

    fn estimate_faces(&mut self, frame: &RgbImage) -> Result<Vec<FacePrediction>> {
        let (fw, fh) = (frame.width() as f32, frame.height() as f32);

        let face_box = match &mut self.detector {
            Some(det) => match det
                .detect(frame)
                .map_err(|e| GazeError::Inference(e.to_string()))?
            {
                Some(rect) => Some(rect),
                // Detector ran and saw nobody
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let roi = face_box
            .map(|r| padded_roi(r, fw, fh))
            .unwrap_or(Rect::new(0.0, 0.0, fw, fh));
        if roi.width < 1.0 || roi.height < 1.0 {
            return Ok(Vec::new());
        }

        let crop = if face_box.is_some() {
            let (x, y) = (roi.x as u32, roi.y as u32);
            image::imageops::crop_imm(frame, x, y, roi.width as u32, roi.height as u32).to_image()
        } else {
            frame.clone()
        };

        let raw = self.run_mesh(&crop)?;
        let landmarks = decode_mesh(&raw, roi)?;
        Ok(vec![FacePrediction { landmarks, face_box }])
    }
}
