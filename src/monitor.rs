//! The per-frame detection loop.
//!
//! One pass is: grab a frame, ask the estimator for faces, take the first face,
//! compute both eye centers, classify, and notify on a match. Passes never
//! overlap. Any error ends the loop without scheduling another pass.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::classifier::{GazeClassifier, GazeOffsets};
use crate::eyes::{eye_center, eyes_midpoint};
use crate::notify::{GazeMatch, Notifier, NotifyPolicy};
use crate::pipeline::{frame_size, FrameSource, LandmarkEstimator};
use crate::types::{EyeIndices, Point2D, LEFT_EYE, RIGHT_EYE};

/// Default pacing between passes, roughly one display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassOutcome {
    /// The estimator returned no faces.
    NoFace,
    Face {
        left: Point2D,
        right: Point2D,
        offsets: GazeOffsets,
        looking: bool,
        notified: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub classifier: GazeClassifier,
    pub policy: NotifyPolicy,
    pub frame_interval: Duration,
    pub left_eye: EyeIndices,
    pub right_eye: EyeIndices,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            classifier: GazeClassifier::default(),
            policy: NotifyPolicy::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            left_eye: LEFT_EYE,
            right_eye: RIGHT_EYE,
        }
    }
}

/// Counters for a finished `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub passes: u64,
    pub faces: u64,
    pub matches: u64,
    pub notifications: u64,
}

pub struct GazeMonitor<S, E, N> {
    source: S,
    estimator: E,
    notifier: N,
    settings: MonitorSettings,
    frame: u64,
    // Only read under OncePerEpisode
    in_episode: bool,
    stats: RunStats,
}

impl<S: FrameSource, E: LandmarkEstimator, N: Notifier> GazeMonitor<S, E, N> {
    pub fn new(source: S, estimator: E, notifier: N, settings: MonitorSettings) -> Self {
        Self {
            source,
            estimator,
            notifier,
            settings,
            frame: 0,
            in_episode: false,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn into_parts(self) -> (S, E, N) {
        (self.source, self.estimator, self.notifier)
    }

    /// Runs exactly one detection pass.
    pub fn step(&mut self) -> Result<PassOutcome> {
        self.frame += 1;
        self.stats.passes += 1;

        let frame = self.source.next_frame()?;
        let size = frame_size(&frame);
        let faces = self.estimator.estimate_faces(&frame)?;

        // Extra faces are ignored; only the first one counts
        let Some(face) = faces.into_iter().next() else {
            trace!(frame = self.frame, "no face");
            self.in_episode = false;
            return Ok(PassOutcome::NoFace);
        };
        self.stats.faces += 1;

        let left = eye_center(&face.landmarks, self.settings.left_eye)?;
        let right = eye_center(&face.landmarks, self.settings.right_eye)?;
        let mid = eyes_midpoint(left, right);

        let classifier = self.settings.classifier;
        let offsets = classifier.offsets(left, right, size);
        let looking = classifier.is_looking_at_camera(left, right, size);

        debug!(
            frame = self.frame,
            left.x = left.x,
            left.y = left.y,
            right.x = right.x,
            right.y = right.y,
            mid.x = mid.x,
            mid.y = mid.y,
            max_offset = offsets.max(),
            looking,
            "eye centers"
        );

        let notify = match self.settings.policy {
            NotifyPolicy::EveryFrame => looking,
            NotifyPolicy::OncePerEpisode => looking && !self.in_episode,
        };
        self.in_episode = looking;

        if looking {
            self.stats.matches += 1;
        }
        if notify {
            self.notifier.notify(&GazeMatch { frame: self.frame, left, right })?;
            self.stats.notifications += 1;
        }

        Ok(PassOutcome::Face { left, right, offsets, looking, notified: notify })
    }

    /// Repeats `step` until `stop` is set or a pass fails.
    ///
    /// `stop` is checked before every pass, including the first. Passes are
    /// paced to start at most once per `frame_interval`.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<RunStats> {
        info!(
            estimator = %self.estimator.name(),
            threshold = self.settings.classifier.threshold(),
            policy = ?self.settings.policy,
            "detection loop started"
        );

        while !stop.load(Ordering::SeqCst) {
            let started = Instant::now();
            self.step()?;

            if let Some(rest) = self.settings.frame_interval.checked_sub(started.elapsed()) {
                if !rest.is_zero() && !stop.load(Ordering::SeqCst) {
                    thread::sleep(rest);
                }
            }
        }

        info!(
            passes = self.stats.passes,
            matches = self.stats.matches,
            notifications = self.stats.notifications,
            "detection loop stopped"
        );
        Ok(self.stats)
    }
}
