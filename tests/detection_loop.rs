use anyhow::{bail, Result};
use image::RgbImage;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eye_contact::config::AppConfig;
use eye_contact::{
    FacePrediction, FrameSource, GazeError, GazeMatch, GazeMonitor, LandmarkEstimator, Landmarks,
    MonitorSettings, Notifier, PassOutcome, Point2D, Point3D, LEFT_EYE, RIGHT_EYE,
};

struct Frames {
    width: u32,
    height: u32,
}

impl FrameSource for Frames {
    fn next_frame(&mut self) -> Result<RgbImage> {
        Ok(RgbImage::new(self.width, self.height))
    }
}

fn vga() -> Frames {
    Frames { width: 640, height: 480 }
}

/// A camera that has been unplugged.
struct Unplugged;

impl FrameSource for Unplugged {
    fn next_frame(&mut self) -> Result<RgbImage> {
        bail!(GazeError::Frame("device disconnected".to_string()))
    }
}

/// Fails on every call, counting how often it was asked.
#[derive(Clone, Default)]
struct BrokenNotifier {
    calls: Rc<Cell<usize>>,
}

impl Notifier for BrokenNotifier {
    fn notify(&mut self, _event: &GazeMatch) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        bail!("display unavailable")
    }
}

enum Step {
    Faces(Vec<FacePrediction>),
    Fail,
}

/// Replays a fixed list of estimator results, then repeats no-face forever.
struct Scripted {
    steps: Vec<Step>,
    calls: Rc<Cell<usize>>,
}

impl Scripted {
    fn new(steps: Vec<Step>) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (Self { steps, calls: calls.clone() }, calls)
    }
}

impl LandmarkEstimator for Scripted {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn estimate_faces(&mut self, _frame: &RgbImage) -> Result<Vec<FacePrediction>> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        match self.steps.get(n) {
            Some(Step::Faces(f)) => Ok(f.clone()),
            Some(Step::Fail) => bail!(GazeError::Inference("backend went away".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Clone, Default)]
struct Recorder {
    events: Rc<std::cell::RefCell<Vec<GazeMatch>>>,
    stop_after: Option<(usize, Arc<AtomicBool>)>,
}

impl Notifier for Recorder {
    fn notify(&mut self, event: &GazeMatch) -> Result<()> {
        self.events.borrow_mut().push(*event);
        if let Some((n, stop)) = &self.stop_after {
            if self.events.borrow().len() >= *n {
                stop.store(true, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

fn face(left: (f32, f32), right: (f32, f32)) -> FacePrediction {
    let mut points = vec![Point3D::new(1.0, 1.0, 0.0); 468];
    for &i in LEFT_EYE.as_slice() {
        points[i] = Point3D::new(left.0, left.1, -5.0);
    }
    for &i in RIGHT_EYE.as_slice() {
        points[i] = Point3D::new(right.0, right.1, -5.0);
    }
    FacePrediction::new(Landmarks::new(points))
}

fn fast_settings() -> MonitorSettings {
    MonitorSettings { frame_interval: Duration::ZERO, ..MonitorSettings::default() }
}

#[test]
fn eyes_near_center_notify() {
    let (est, _) = Scripted::new(vec![Step::Faces(vec![face((300.0, 230.0), (340.0, 250.0))])]);
    let rec = Recorder::default();
    let mut m = GazeMonitor::new(vga(), est, rec.clone(), fast_settings());

    match m.step().unwrap() {
        PassOutcome::Face { left, right, offsets, looking, notified } => {
            assert_eq!(left, Point2D::new(300.0, 230.0));
            assert_eq!(right, Point2D::new(340.0, 250.0));
            assert_eq!((offsets.left_x, offsets.left_y), (20.0, 10.0));
            assert_eq!((offsets.right_x, offsets.right_y), (20.0, 10.0));
            assert!(looking);
            assert!(notified);
        }
        other => panic!("expected a face, got {:?}", other),
    }
    let events = rec.events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].frame, 1);
}

#[test]
fn one_eye_off_center_does_not_notify() {
    let (est, _) = Scripted::new(vec![Step::Faces(vec![face((200.0, 240.0), (320.0, 240.0))])]);
    let rec = Recorder::default();
    let mut m = GazeMonitor::new(vga(), est, rec.clone(), fast_settings());

    match m.step().unwrap() {
        PassOutcome::Face { looking, notified, offsets, .. } => {
            assert_eq!(offsets.left_x, 120.0);
            assert!(!looking);
            assert!(!notified);
        }
        other => panic!("expected a face, got {:?}", other),
    }
    assert!(rec.events.borrow().is_empty());
}

#[test]
fn empty_frames_are_skipped_and_loop_continues() {
    let (est, calls) = Scripted::new(vec![
        Step::Faces(vec![]),
        Step::Faces(vec![]),
        Step::Faces(vec![face((320.0, 240.0), (320.0, 240.0))]),
    ]);
    let stop = Arc::new(AtomicBool::new(false));
    let rec = Recorder { stop_after: Some((1, stop.clone())), ..Recorder::default() };
    let mut m = GazeMonitor::new(vga(), est, rec.clone(), fast_settings());

    let stats = m.run(&stop).unwrap();
    assert_eq!(calls.get(), 3);
    assert_eq!(stats.passes, 3);
    assert_eq!(stats.faces, 1);
    assert_eq!(rec.events.borrow()[0].frame, 3);
}

#[test]
fn inference_failure_ends_the_loop() {
    let (est, calls) = Scripted::new(vec![
        Step::Faces(vec![face((320.0, 240.0), (320.0, 240.0))]),
        Step::Faces(vec![]),
        Step::Fail,
        Step::Faces(vec![face((320.0, 240.0), (320.0, 240.0))]),
    ]);
    let rec = Recorder::default();
    let mut m = GazeMonitor::new(vga(), est, rec.clone(), fast_settings());

    let err = m.run(&AtomicBool::new(false)).unwrap_err();
    assert!(matches!(err.downcast_ref::<GazeError>(), Some(GazeError::Inference(_))));
    assert_eq!(calls.get(), 3, "no pass may run after the failure");
    assert_eq!(rec.events.borrow().len(), 1);
}

#[test]
fn frame_failure_ends_the_loop_before_inference() {
    let (est, calls) = Scripted::new(vec![Step::Faces(vec![face((320.0, 240.0), (320.0, 240.0))])]);
    let rec = Recorder::default();
    let mut m = GazeMonitor::new(Unplugged, est, rec.clone(), fast_settings());

    let err = m.run(&AtomicBool::new(false)).unwrap_err();
    assert!(matches!(err.downcast_ref::<GazeError>(), Some(GazeError::Frame(_))));
    assert_eq!(calls.get(), 0, "estimator must not run without a frame");
    assert_eq!(m.stats().passes, 1);
    assert!(rec.events.borrow().is_empty());
}

#[test]
fn notifier_failure_ends_the_loop() {
    let centered = || Step::Faces(vec![face((320.0, 240.0), (320.0, 240.0))]);
    let (est, calls) = Scripted::new(vec![centered(), centered(), centered()]);
    let notifier = BrokenNotifier::default();
    let mut m = GazeMonitor::new(vga(), est, notifier.clone(), fast_settings());

    let err = m.run(&AtomicBool::new(false)).unwrap_err();
    assert_eq!(err.to_string(), "display unavailable");
    assert_eq!(calls.get(), 1, "no pass may run after the failure");
    assert_eq!(notifier.calls.get(), 1);

    let stats = m.stats();
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.notifications, 0);
}

#[test]
fn only_first_face_counts() {
    let (est, _) = Scripted::new(vec![Step::Faces(vec![
        face((100.0, 100.0), (120.0, 100.0)),
        face((320.0, 240.0), (320.0, 240.0)),
    ])]);
    let rec = Recorder::default();
    let mut m = GazeMonitor::new(vga(), est, rec.clone(), fast_settings());

    match m.step().unwrap() {
        PassOutcome::Face { left, looking, .. } => {
            assert_eq!(left, Point2D::new(100.0, 100.0));
            assert!(!looking);
        }
        other => panic!("expected a face, got {:?}", other),
    }
}

#[test]
fn truncated_mesh_is_a_contract_error() {
    let short = FacePrediction::new(Landmarks::new(vec![Point3D::default(); 200]));
    let (est, _) = Scripted::new(vec![Step::Faces(vec![short])]);
    let mut m = GazeMonitor::new(vga(), est, Recorder::default(), fast_settings());

    let err = m.step().unwrap_err();
    match err.downcast_ref::<GazeError>() {
        Some(GazeError::IndexOutOfRange { len, .. }) => assert_eq!(*len, 200),
        other => panic!("expected IndexOutOfRange, got {:?}", other),
    }
}

#[test]
fn threshold_comes_from_config() {
    let mut config = AppConfig::default();
    config.detection.threshold = 15.0;
    let mut settings = config.monitor_settings();
    settings.frame_interval = Duration::ZERO;

    let (est, _) = Scripted::new(vec![Step::Faces(vec![face((300.0, 230.0), (340.0, 250.0))])]);
    let mut m = GazeMonitor::new(vga(), est, Recorder::default(), settings);
    match m.step().unwrap() {
        PassOutcome::Face { looking, .. } => assert!(!looking),
        other => panic!("expected a face, got {:?}", other),
    }
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut config = AppConfig::default();
    config.detection.threshold = 42.0;
    config.camera.index = 3;
    config.save_to(&path).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_or_broken_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    assert_eq!(AppConfig::load_from(&missing).unwrap(), AppConfig::default());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert_eq!(AppConfig::load_from(&broken).unwrap(), AppConfig::default());
}

#[test]
fn refresh_fills_in_missing_and_partial_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("fresh.json");
    assert_eq!(AppConfig::load_and_refresh(&missing).unwrap(), AppConfig::default());
    assert_eq!(AppConfig::load_from(&missing).unwrap(), AppConfig::default());

    let partial = dir.path().join("partial.json");
    std::fs::write(&partial, r#"{"detection": {"threshold": 25.0}}"#).unwrap();
    let loaded = AppConfig::load_and_refresh(&partial).unwrap();
    assert_eq!(loaded.detection.threshold, 25.0);
    let written = std::fs::read_to_string(&partial).unwrap();
    assert!(written.contains("notify_policy"), "refreshed file lacks defaults: {}", written);
}

#[test]
fn refresh_leaves_broken_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("config.json");
    let original = "{ \"detection\": { \"threshold\": 12.0 ";
    std::fs::write(&broken, original).unwrap();

    assert_eq!(AppConfig::load_and_refresh(&broken).unwrap(), AppConfig::default());
    assert_eq!(std::fs::read_to_string(&broken).unwrap(), original);
}
