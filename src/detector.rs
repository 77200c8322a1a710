//! UltraFace (RFB-320) face detector used to crop the face before meshing.

use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::debug;

use crate::types::Rect;

const INPUT_W: u32 = 320;
const INPUT_H: u32 = 240;
const SCORE_THRESHOLD: f32 = 0.7;
const CENTER_VARIANCE: f32 = 0.1;
const SIZE_VARIANCE: f32 = 0.2;

/// Anchor box in normalized coordinates.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
}

pub struct FaceDetector {
    session: Session,
    anchors: Vec<Anchor>,
}

impl FaceDetector {
    pub fn new(model_path: &str) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([ort::execution_providers::CPUExecutionProvider::default().build()])?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load face detector from {}", model_path))?;

        Ok(Self {
            session,
            anchors: generate_anchors(INPUT_W as usize, INPUT_H as usize),
        })
    }

    /// Highest scoring face, in frame pixels.
    pub fn detect(&mut self, frame: &RgbImage) -> Result<Option<Rect>> {
        let resized = image::imageops::resize(frame, INPUT_W, INPUT_H, FilterType::Triangle);

        // NCHW, (p - 127) / 128
        let plane = (INPUT_W * INPUT_H) as usize;
        let mut input = vec![0.0f32; 3 * plane];
        for (i, px) in resized.pixels().enumerate() {
            for c in 0..3 {
                input[c * plane + i] = (px[c] as f32 - 127.0) / 128.0;
            }
        }

        let tensor = Tensor::from_array((vec![1, 3, INPUT_H as usize, INPUT_W as usize], input))?;
        let outputs = self.session.run(ort::inputs![tensor])?;

        let (_, scores) = outputs["scores"].try_extract_tensor::<f32>()?;
        let (_, boxes) = outputs["boxes"].try_extract_tensor::<f32>()?;

        let best = best_box(&self.anchors, scores, boxes, SCORE_THRESHOLD);
        debug!(found = best.is_some(), "face detector ran");

        let sx = frame.width() as f32 / INPUT_W as f32;
        let sy = frame.height() as f32 / INPUT_H as f32;
        Ok(best.map(|r| Rect::new(r.x * sx, r.y * sy, r.width * sx, r.height * sy)))
    }
}

/// Decodes the best box above `threshold`, in detector input pixels.
fn best_box(anchors: &[Anchor], scores: &[f32], boxes: &[f32], threshold: f32) -> Option<Rect> {
    let mut best_score = threshold;
    let mut best = None;

    for (i, a) in anchors.iter().enumerate() {
        let Some(&score) = scores.get(i * 2 + 1) else { break };
        if score <= best_score {
            continue;
        }
        let Some(enc) = boxes.get(i * 4..i * 4 + 4) else { break };

        let cx = enc[0] * CENTER_VARIANCE * a.w + a.cx;
        let cy = enc[1] * CENTER_VARIANCE * a.h + a.cy;
        let w = (enc[2] * SIZE_VARIANCE).exp() * a.w;
        let h = (enc[3] * SIZE_VARIANCE).exp() * a.h;

        best_score = score;
        best = Some(Rect::new(
            (cx - w / 2.0) * INPUT_W as f32,
            (cy - h / 2.0) * INPUT_H as f32,
            w * INPUT_W as f32,
            h * INPUT_H as f32,
        ));
    }

    best
}

fn generate_anchors(width: usize, height: usize) -> Vec<Anchor> {
    const STRIDES: [usize; 4] = [8, 16, 32, 64];
    const MIN_BOXES: [&[f32]; 4] = [&[10.0, 16.0, 24.0], &[32.0, 48.0], &[64.0, 96.0], &[128.0, 192.0, 256.0]];

    let (w, h) = (width as f32, height as f32);
    let mut anchors = Vec::new();

    for (stride, sizes) in STRIDES.iter().zip(MIN_BOXES) {
        let s = *stride as f32;
        let rows = (h / s).ceil() as usize;
        let cols = (w / s).ceil() as usize;
        for v in 0..rows {
            for u in 0..cols {
                let cx = (u as f32 + 0.5) * s / w;
                let cy = (v as f32 + 0.5) * s / h;
                for &size in sizes {
                    anchors.push(Anchor { cx, cy, w: size / w, h: size / h });
                }
            }
        }
    }
    anchors
}
