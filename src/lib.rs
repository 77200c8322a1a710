//! Eye contact detection on top of a 468-point face mesh.
//!
//! Each frame, both eye centers are estimated from the mesh and compared with
//! the center of the camera frame. When both sit close enough, a notifier fires.

pub mod args;
pub mod camera;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod eyes;
pub mod inference;
pub mod monitor;
pub mod notify;
pub mod pipeline;
pub mod types;

pub use classifier::{GazeClassifier, GazeOffsets};
pub use error::GazeError;
pub use eyes::{eye_center, eyes_midpoint};
pub use monitor::{GazeMonitor, MonitorSettings, PassOutcome, RunStats};
pub use notify::{GazeMatch, Notifier, NotifyPolicy};
pub use pipeline::{FrameSource, LandmarkEstimator};
pub use types::{EyeIndices, FacePrediction, FrameSize, Landmarks, Point2D, Point3D, LEFT_EYE, RIGHT_EYE};
