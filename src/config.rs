//! Daemon configuration.
//!
//! Loaded once at startup from an optional JSON file (pointed to by
//! `FACETRACK_CONFIG` or `--config`), then overridden by `FACETRACK_*`
//! environment variables, then validated. The resulting `TrackerConfig` is
//! immutable for the life of the process.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::ingest::CameraConfig;
use crate::track::control::AxisConfig;

const DEFAULT_CAMERA_URL: &str = "http://192.168.1.38:81/stream";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_CAMERA_WIDTH: u32 = 320;
const DEFAULT_CAMERA_HEIGHT: u32 = 240;
const DEFAULT_ACTUATOR_ENDPOINT: &str = "http://192.168.1.38/control";
const DEFAULT_ACTUATOR_TIMEOUT_MS: u64 = 200;
const DEFAULT_UPDATE_INTERVAL_MS: u64 = 300;
const DEFAULT_DEADZONE_FRACTION: f32 = 0.07;
const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";
const DEFAULT_SNAPSHOT_INTERVAL_MS: u64 = 2_000;
const DEFAULT_DETECTOR_BACKEND: &str = "luma";
const DEFAULT_SCALE_FACTOR: f32 = 1.2;
const DEFAULT_MIN_NEIGHBORS: u32 = 5;
const DEFAULT_MIN_SIZE: u32 = 40;

const DEFAULT_PAN: AxisConfig = AxisConfig {
    center: 90,
    min: 30,
    max: 150,
    step: 2,
    invert: false,
};
const DEFAULT_TILT: AxisConfig = AxisConfig {
    center: 90,
    min: 45,
    max: 135,
    step: 2,
    invert: false,
};

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    camera: Option<CameraConfigFile>,
    actuator: Option<ActuatorConfigFile>,
    pan: Option<AxisConfigFile>,
    tilt: Option<AxisConfigFile>,
    deadzone_fraction: Option<f32>,
    snapshot: Option<SnapshotConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ActuatorConfigFile {
    endpoint: Option<String>,
    timeout_ms: Option<u64>,
    update_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct AxisConfigFile {
    center: Option<i32>,
    min: Option<i32>,
    max: Option<i32>,
    step: Option<i32>,
    invert: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct SnapshotConfigFile {
    enabled: Option<bool>,
    dir: Option<PathBuf>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    scale_factor: Option<f32>,
    min_neighbors: Option<u32>,
    min_size: Option<u32>,
}

/// Actuator endpoint and timing.
#[derive(Debug, Clone)]
pub struct ActuatorSettings {
    pub endpoint: String,
    /// Total request timeout. Kept short; a late command is a stale command.
    pub timeout: Duration,
    /// Minimum wall-clock interval between servo commands (the rate gate).
    pub update_interval: Duration,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    pub interval: Duration,
}

/// Detector backend selection and tuning.
///
/// `scale_factor` and `min_neighbors` are cascade-style tuning knobs; they are
/// carried in the config surface and handed to whichever backend consumes
/// them. `min_size` is honored by all backends as a lower bound on detection
/// dimensions.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub scale_factor: f32,
    pub min_neighbors: u32,
    pub min_size: u32,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub camera: CameraConfig,
    pub actuator: ActuatorSettings,
    pub pan: AxisConfig,
    pub tilt: AxisConfig,
    /// Fraction of each frame dimension within which positional error is
    /// ignored (jitter suppression).
    pub deadzone_fraction: f32,
    pub snapshot: SnapshotSettings,
    pub detector: DetectorSettings,
}

impl TrackerConfig {
    /// Load configuration: file (explicit path or `FACETRACK_CONFIG`), then
    /// env overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("FACETRACK_CONFIG").ok().map(PathBuf::from);
        let file_cfg = match path.or(env_path.as_deref()) {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TrackerConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let actuator = file.actuator.unwrap_or_default();
        let snapshot = file.snapshot.unwrap_or_default();
        let detector = file.detector.unwrap_or_default();
        Self {
            camera: CameraConfig {
                url: camera.url.unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
                target_fps: camera.target_fps.unwrap_or(DEFAULT_CAMERA_FPS),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
            },
            actuator: ActuatorSettings {
                endpoint: actuator
                    .endpoint
                    .unwrap_or_else(|| DEFAULT_ACTUATOR_ENDPOINT.to_string()),
                timeout: Duration::from_millis(
                    actuator.timeout_ms.unwrap_or(DEFAULT_ACTUATOR_TIMEOUT_MS),
                ),
                update_interval: Duration::from_millis(
                    actuator
                        .update_interval_ms
                        .unwrap_or(DEFAULT_UPDATE_INTERVAL_MS),
                ),
            },
            pan: merge_axis(file.pan, DEFAULT_PAN),
            tilt: merge_axis(file.tilt, DEFAULT_TILT),
            deadzone_fraction: file.deadzone_fraction.unwrap_or(DEFAULT_DEADZONE_FRACTION),
            snapshot: SnapshotSettings {
                enabled: snapshot.enabled.unwrap_or(true),
                dir: snapshot
                    .dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR)),
                interval: Duration::from_millis(
                    snapshot.interval_ms.unwrap_or(DEFAULT_SNAPSHOT_INTERVAL_MS),
                ),
            },
            detector: DetectorSettings {
                backend: detector
                    .backend
                    .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string()),
                model_path: detector.model_path,
                scale_factor: detector.scale_factor.unwrap_or(DEFAULT_SCALE_FACTOR),
                min_neighbors: detector.min_neighbors.unwrap_or(DEFAULT_MIN_NEIGHBORS),
                min_size: detector.min_size.unwrap_or(DEFAULT_MIN_SIZE),
            },
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("FACETRACK_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(endpoint) = std::env::var("FACETRACK_ACTUATOR_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.actuator.endpoint = endpoint;
            }
        }
        if let Ok(dir) = std::env::var("FACETRACK_SNAPSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.snapshot.dir = PathBuf::from(dir);
            }
        }
        if let Ok(backend) = std::env::var("FACETRACK_DETECTOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        validate_axis("pan", &self.pan)?;
        validate_axis("tilt", &self.tilt)?;

        if !(0.0..0.5).contains(&self.deadzone_fraction) {
            return Err(anyhow!(
                "deadzone_fraction must be in [0.0, 0.5), got {}",
                self.deadzone_fraction
            ));
        }
        if self.actuator.update_interval.is_zero() {
            return Err(anyhow!("actuator update_interval_ms must be greater than zero"));
        }
        if self.actuator.timeout.is_zero() {
            return Err(anyhow!("actuator timeout_ms must be greater than zero"));
        }
        let endpoint = Url::parse(&self.actuator.endpoint)
            .map_err(|e| anyhow!("invalid actuator endpoint '{}': {}", self.actuator.endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!(
                "actuator endpoint must be http(s), got '{}'",
                endpoint.scheme()
            ));
        }
        if self.camera.url.trim().is_empty() {
            return Err(anyhow!("camera url must not be empty"));
        }
        if self.snapshot.enabled && self.snapshot.interval.is_zero() {
            return Err(anyhow!("snapshot interval_ms must be greater than zero"));
        }
        if self.detector.min_size == 0 {
            return Err(anyhow!("detector min_size must be greater than zero"));
        }
        if self.detector.scale_factor <= 1.0 {
            return Err(anyhow!(
                "detector scale_factor must be greater than 1.0, got {}",
                self.detector.scale_factor
            ));
        }
        Ok(())
    }
}

fn merge_axis(file: Option<AxisConfigFile>, default: AxisConfig) -> AxisConfig {
    let file = file.unwrap_or_default();
    AxisConfig {
        center: file.center.unwrap_or(default.center),
        min: file.min.unwrap_or(default.min),
        max: file.max.unwrap_or(default.max),
        step: file.step.unwrap_or(default.step),
        invert: file.invert.unwrap_or(default.invert),
    }
}

fn validate_axis(name: &str, axis: &AxisConfig) -> Result<()> {
    if axis.min > axis.max {
        return Err(anyhow!(
            "{} axis: min {} exceeds max {}",
            name,
            axis.min,
            axis.max
        ));
    }
    if axis.center < axis.min || axis.center > axis.max {
        return Err(anyhow!(
            "{} axis: center {} outside [{}, {}]",
            name,
            axis.center,
            axis.min,
            axis.max
        ));
    }
    if axis.step <= 0 {
        return Err(anyhow!("{} axis: step must be positive, got {}", name, axis.step));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<TrackerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> TrackerConfig {
        TrackerConfig::from_file(TrackerConfigFile::default())
    }

    #[test]
    fn defaults_validate() {
        let cfg = default_config();
        cfg.validate().expect("defaults must be valid");
        assert_eq!(cfg.pan.center, 90);
        assert_eq!(cfg.tilt.max, 135);
        assert_eq!(cfg.actuator.update_interval, Duration::from_millis(300));
        assert!(cfg.snapshot.enabled);
    }

    #[test]
    fn center_outside_limits_is_rejected() {
        let mut cfg = default_config();
        cfg.pan.center = 200;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let mut cfg = default_config();
        cfg.tilt.min = 140;
        cfg.tilt.max = 100;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_step_is_rejected() {
        let mut cfg = default_config();
        cfg.pan.step = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_deadzone_is_rejected() {
        let mut cfg = default_config();
        cfg.deadzone_fraction = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_http_actuator_endpoint_is_rejected() {
        let mut cfg = default_config();
        cfg.actuator.endpoint = "ftp://rig/control".to_string();
        assert!(cfg.validate().is_err());
    }
}
