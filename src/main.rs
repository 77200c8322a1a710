use anyhow::Result;
use clap::Parser;
use colored::*;
use image::RgbImage;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eye_contact::args::Args;
use eye_contact::camera::{self, CameraSource};
use eye_contact::config::AppConfig;
use eye_contact::inference::FaceMeshEstimator;
use eye_contact::notify::{ConsoleNotifier, NotifyMode, PromptNotifier};
use eye_contact::pipeline::SimulatedEstimator;
use eye_contact::{FrameSource, GazeMonitor, LandmarkEstimator, Notifier};

/// Raises `stop` once `remaining` frames have been handed out.
struct FrameBudget<S> {
    inner: S,
    remaining: u64,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource> FrameSource for FrameBudget<S> {
    fn next_frame(&mut self) -> Result<RgbImage> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop.store(true, Ordering::SeqCst);
        }
        self.inner.next_frame()
    }
}

fn create_estimator(config: &AppConfig, simulate: bool) -> Result<Box<dyn LandmarkEstimator>> {
    if simulate {
        return Ok(Box::new(SimulatedEstimator::new()));
    }
    if !Path::new(&config.models.face_mesh).exists() {
        warn!(path = %config.models.face_mesh, "face mesh model not found, falling back to simulation");
        return Ok(Box::new(SimulatedEstimator::new()));
    }
    Ok(Box::new(FaceMeshEstimator::new(&config.models.face_mesh, &config.models.face_detector)?))
}

fn create_notifier(config: &AppConfig) -> Box<dyn Notifier> {
    match config.notify.mode {
        NotifyMode::Console => Box::new(ConsoleNotifier::new(config.notify.message.clone(), config.notify.bell)),
        NotifyMode::Prompt => Box::new(PromptNotifier::stdin(config.notify.message.clone())),
    }
}

fn run(args: Args) -> Result<()> {
    if args.list {
        println!("Available Cameras:");
        println!("{:<5} | {:<30}", "Index", "Name");
        println!("{}", "-".repeat(40));
        for (index, name) in camera::list_cameras()? {
            println!("{:<5} | {:<30}", index, name);
        }
        return Ok(());
    }

    let mut config = AppConfig::load_and_refresh(&args.config)?;
    args.apply(&mut config);

    let camera = CameraSource::new(config.camera.index, config.camera.mirror)?;
    println!("{}", format!("Opened camera: {}", camera.name()).green());

    let estimator = create_estimator(&config, args.simulate)?;
    println!("Active Estimator: {}", estimator.name());

    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        info!("received ctrl-c, stopping");
        s.store(true, Ordering::SeqCst);
    })
    .expect("couldn't set ctrl-c handler");

    let source: Box<dyn FrameSource> = match args.max_frames {
        Some(n) => Box::new(FrameBudget { inner: camera, remaining: n, stop: stop.clone() }),
        None => Box::new(camera),
    };

    let mut monitor = GazeMonitor::new(source, estimator, create_notifier(&config), config.monitor_settings());
    let stats = monitor.run(&stop)?;

    println!(
        "{} passes, {} with a face, {} matches, {} notifications",
        stats.passes, stats.faces, stats.matches, stats.notifications
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match args.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "detection stopped");
            ExitCode::FAILURE
        }
    }
}
