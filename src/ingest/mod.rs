//! Frame ingestion sources.
//!
//! Two sources produce decoded `Frame`s for the loop:
//! - `http(s)://` — ESP32-CAM style HTTP endpoints serving an MJPEG
//!   multipart stream, with a single-JPEG snapshot fallback
//! - `stub://` — synthetic frames with a scripted bright "face", for tests
//!   and hardware-free bring-up
//!
//! The ingest layer owns rate decimation to `target_fps` and stream health
//! reporting. `connect` failures are startup-fatal; `next_frame` failures
//! end the loop (a dropped camera stream is assumed unrecoverable without
//! operator intervention).

mod http;
mod stub;

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::frame::Frame;
use http::HttpMjpegSource;
use stub::StubSource;

/// Camera source configuration.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Stream URL. Supported schemes: http(s):// for MJPEG/JPEG, stub:// for
    /// synthetic frames.
    pub url: String,
    /// Frames per second the loop should see; the source decimates to this
    /// rate. Zero disables decimation.
    pub target_fps: u32,
    /// Frame width for synthetic sources (real streams carry their own).
    pub width: u32,
    /// Frame height for synthetic sources.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:81/stream".to_string(),
            target_fps: 10,
            width: 320,
            height: 240,
        }
    }
}

/// A connected camera stream, dispatching on URL scheme.
pub struct CameraSource {
    backend: SourceBackend,
}

enum SourceBackend {
    Http(HttpMjpegSource),
    Stub(StubSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        let url = Url::parse(&config.url).context("parse camera url")?;
        let backend = match url.scheme() {
            "http" | "https" => SourceBackend::Http(HttpMjpegSource::new(config)),
            "stub" => SourceBackend::Stub(StubSource::new(config, &url)?),
            other => {
                return Err(anyhow!(
                    "unsupported camera scheme '{}'; expected http(s) or stub",
                    other
                ))
            }
        };
        Ok(Self { backend })
    }

    /// Open the stream. Must be called before `next_frame`.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            SourceBackend::Http(source) => source.connect(),
            SourceBackend::Stub(source) => source.connect(),
        }
    }

    /// Block until the next frame is available and decode it.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            SourceBackend::Http(source) => source.next_frame(),
            SourceBackend::Stub(source) => source.next_frame(),
        }
    }

    /// True while frames keep arriving at a plausible rate.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            SourceBackend::Http(source) => source.is_healthy(),
            SourceBackend::Stub(_) => true,
        }
    }

    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            SourceBackend::Http(source) => source.stats(),
            SourceBackend::Stub(source) => source.stats(),
        }
    }
}

/// Frame counters for the periodic health log.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scheme_is_rejected() {
        let config = CameraConfig {
            url: "rtsp://cam/stream".to_string(),
            ..CameraConfig::default()
        };
        assert!(CameraSource::new(config).is_err());
    }

    #[test]
    fn stub_scheme_is_accepted() {
        let config = CameraConfig {
            url: "stub://face".to_string(),
            ..CameraConfig::default()
        };
        assert!(CameraSource::new(config).is_ok());
    }
}
