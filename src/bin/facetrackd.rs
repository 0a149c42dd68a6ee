//! facetrackd - pan/tilt face tracking daemon
//!
//! This daemon:
//! 1. Connects to the configured camera stream (HTTP MJPEG or stub://)
//! 2. Runs the configured face detector backend on each grayscale frame
//! 3. Selects the largest face and steps the pan/tilt rig toward it,
//!    rate-gated and clamped to the mechanical limits
//! 4. Opportunistically saves snapshots of tracked faces
//!
//! Startup failures (unreachable stream, unavailable detector) abort with a
//! nonzero exit. Mid-loop frame loss ends the loop cleanly; actuator and
//! snapshot failures are logged and swallowed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use facetrack::detect::backends::{LumaBlobBackend, StubFaceBackend};
use facetrack::{
    select_target, ActuatorClient, CameraSource, FaceDetectorBackend, SnapshotThrottler,
    TrackerConfig, TrackingController,
};

#[derive(Parser, Debug)]
#[command(name = "facetrackd", about = "Pan/tilt face tracking daemon")]
struct Args {
    /// Path to the JSON config file (falls back to FACETRACK_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = TrackerConfig::load(args.config.as_deref())?;
    if args.print_config {
        println!("{:#?}", cfg);
        return Ok(());
    }

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        ctrlc::set_handler(move || quit.store(true, Ordering::SeqCst))
            .context("install quit handler")?;
    }

    let mut source = CameraSource::new(cfg.camera.clone())?;
    source.connect().context("camera stream unreachable")?;

    let mut backend = build_backend(&cfg)?;
    backend.warm_up().context("detector backend unavailable")?;
    log::info!("detector backend: {}", backend.name());

    let actuator = ActuatorClient::new(&cfg.actuator.endpoint, cfg.actuator.timeout)?;
    let mut controller = TrackingController::new(
        cfg.pan,
        cfg.tilt,
        cfg.deadzone_fraction,
        cfg.actuator.update_interval,
    );
    let mut snapshots = if cfg.snapshot.enabled {
        Some(SnapshotThrottler::new(
            &cfg.snapshot.dir,
            cfg.snapshot.interval,
        )?)
    } else {
        None
    };

    log::info!(
        "facetrackd running: camera={} actuator={} pan=[{},{}] tilt=[{},{}]",
        cfg.camera.url,
        cfg.actuator.endpoint,
        cfg.pan.min,
        cfg.pan.max,
        cfg.tilt.min,
        cfg.tilt.max,
    );

    let mut last_health_log = Instant::now();
    let mut commands_sent = 0u64;

    while !quit.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("frame acquisition failed, stopping: {:#}", e);
                break;
            }
        };

        let luma = frame.to_luma();
        let detections = match backend.detect(&luma, frame.width, frame.height) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("detection failed on this frame: {:#}", e);
                Vec::new()
            }
        };
        let target = select_target(&detections);

        let now = Instant::now();
        if let Some(command) = controller.update(target, frame.geometry(), now) {
            match actuator.send(&command) {
                Ok(()) => {
                    commands_sent += 1;
                    log::debug!(
                        "command pan={:?} tilt={:?}",
                        command.pan,
                        command.tilt
                    );
                }
                // Best-effort: superseded by the next interval anyway.
                Err(e) => log::debug!("actuator command dropped: {:#}", e),
            }
        }

        if let Some(throttler) = snapshots.as_mut() {
            match throttler.maybe_save(target.is_some(), &frame, now) {
                Ok(Some(path)) => log::info!("snapshot saved: {}", path.display()),
                Ok(None) => {}
                Err(e) => log::warn!("snapshot failed: {:#}", e),
            }
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = source.stats();
            let state = controller.state();
            log::info!(
                "camera health={} frames={} commands={} pan={} tilt={}",
                source.is_healthy(),
                stats.frames_captured,
                commands_sent,
                state.pan_angle,
                state.tilt_angle,
            );
            last_health_log = Instant::now();
        }
    }

    log::info!("facetrackd stopped");
    Ok(())
}

fn build_backend(cfg: &TrackerConfig) -> Result<Box<dyn FaceDetectorBackend>> {
    match cfg.detector.backend.as_str() {
        "luma" => Ok(Box::new(LumaBlobBackend::new(
            cfg.detector.min_neighbors,
            cfg.detector.min_size,
        ))),
        "stub" => Ok(Box::new(StubFaceBackend::new())),
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let model_path = cfg
                .detector
                .model_path
                .as_ref()
                .ok_or_else(|| anyhow!("detector.model_path is required for the tract backend"))?;
            let backend = facetrack::detect::backends::TractFaceBackend::new(
                model_path,
                320,
                240,
                cfg.detector.min_size,
            )?;
            Ok(Box::new(backend))
        }
        #[cfg(not(feature = "backend-tract"))]
        "tract" => Err(anyhow!(
            "detector backend 'tract' requires the backend-tract feature"
        )),
        other => Err(anyhow!("unknown detector backend '{}'", other)),
    }
}
