use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::notify::{NotifyMode, NotifyPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera index (overrides config)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// Max per-axis pixel distance of each eye from frame center
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Configuration file
    #[arg(long, default_value = AppConfig::PATH)]
    pub config: PathBuf,

    /// Use the simulated face mesh instead of the ONNX model
    #[arg(long)]
    pub simulate: bool,

    /// Notify once per gaze instead of on every matching frame
    #[arg(long)]
    pub once_per_gaze: bool,

    /// Block on each notification until Enter is pressed
    #[arg(long)]
    pub prompt: bool,

    /// Mirror the camera image
    #[arg(long)]
    pub mirror: bool,

    /// Stop after this many detection passes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_frames: Option<u64>,

    /// List available cameras
    #[arg(long)]
    pub list: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Layers command line flags over the loaded config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(i) = self.cam_index {
            config.camera.index = i;
        }
        if let Some(t) = self.threshold {
            config.detection.threshold = t;
        }
        if self.once_per_gaze {
            config.detection.notify_policy = NotifyPolicy::OncePerEpisode;
        }
        if self.prompt {
            config.notify.mode = NotifyMode::Prompt;
        }
        if self.mirror {
            config.camera.mirror = true;
        }
    }
}
