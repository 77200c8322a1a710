use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::info;

use crate::error::GazeError;
use crate::pipeline::FrameSource;

pub struct CameraSource {
    camera: Camera,
    mirror: bool,
}

impl CameraSource {
    pub fn new(index: u32, mirror: bool) -> Result<Self> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| anyhow!(e))
            .context("Failed to create camera instance")?;

        camera
            .open_stream()
            .map_err(|e| anyhow!(e))
            .context("Failed to open camera stream")?;

        info!(
            camera = %camera.info().human_name(),
            format = %camera.camera_format(),
            mirror,
            "camera opened"
        );

        Ok(Self { camera, mirror })
    }

    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().map_err(|e| GazeError::Frame(e.to_string()))?;
        let mut decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| GazeError::Frame(e.to_string()))?;
        if self.mirror {
            image::imageops::flip_horizontal_in_place(&mut decoded);
        }
        Ok(decoded)
    }
}

/// (index, name) of every camera the native backend can see.
pub fn list_cameras() -> Result<Vec<(String, String)>> {
    let cameras = nokhwa::query(ApiBackend::Auto)
        .map_err(|e| anyhow!(e))
        .context("Failed to query cameras")?;
    Ok(cameras
        .into_iter()
        .map(|c| (c.index().to_string(), c.human_name()))
        .collect())
}
