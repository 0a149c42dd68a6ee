//! HTTP MJPEG camera source.
//!
//! ESP32-CAM class devices expose their stream as either a multipart MJPEG
//! endpoint or a plain single-JPEG snapshot URL. `connect` sniffs the
//! Content-Type and picks the mode; `next_frame` then yields decoded RGB
//! frames, decimated to the configured rate.

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;

use super::{CameraConfig, SourceStats};
use crate::frame::Frame;

/// Upper bound on a single JPEG; anything bigger means a corrupt stream.
const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

pub(super) struct HttpMjpegSource {
    config: CameraConfig,
    mode: Option<StreamMode>,
    last_frame_at: Option<Instant>,
    connected_at: Option<Instant>,
    frame_count: u64,
}

enum StreamMode {
    Mjpeg(MjpegStream),
    SingleJpeg,
}

impl HttpMjpegSource {
    pub(super) fn new(config: CameraConfig) -> Self {
        Self {
            config,
            mode: None,
            last_frame_at: None,
            connected_at: None,
            frame_count: 0,
        }
    }

    pub(super) fn connect(&mut self) -> Result<()> {
        let response = ureq::get(&self.config.url)
            .call()
            .with_context(|| format!("connect to camera stream {}", self.config.url))?;
        let content_type = response.header("Content-Type").unwrap_or("");
        if content_type.to_lowercase().contains("multipart") {
            self.mode = Some(StreamMode::Mjpeg(MjpegStream::new(response.into_reader())));
        } else {
            // Snapshot endpoint: re-fetch one JPEG per frame.
            self.mode = Some(StreamMode::SingleJpeg);
        }
        self.connected_at = Some(Instant::now());
        log::info!("camera connected: {}", self.config.url);
        Ok(())
    }

    pub(super) fn next_frame(&mut self) -> Result<Frame> {
        let mode = self
            .mode
            .as_mut()
            .ok_or_else(|| anyhow!("camera source not connected; call connect() first"))?;
        let min_interval = frame_interval(self.config.target_fps);
        loop {
            let jpeg = match mode {
                StreamMode::Mjpeg(stream) => stream.read_next_jpeg(),
                StreamMode::SingleJpeg => fetch_single_jpeg(&self.config.url),
            }?;

            let now = Instant::now();
            if let Some(last) = self.last_frame_at {
                if now.duration_since(last) < min_interval {
                    continue;
                }
            }

            let frame = decode_jpeg(&jpeg)?;
            self.frame_count += 1;
            self.last_frame_at = Some(now);
            return Ok(frame);
        }
    }

    pub(super) fn is_healthy(&self) -> bool {
        let Some(connected_at) = self.connected_at else {
            return false;
        };
        let Some(last_frame_at) = self.last_frame_at else {
            return connected_at.elapsed() <= Duration::from_secs(5);
        };
        last_frame_at.elapsed() <= health_grace(self.config.target_fps)
    }

    pub(super) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}

/// Incremental scanner over a multipart MJPEG byte stream.
///
/// Part headers are not parsed; frames are located by their JPEG SOI/EOI
/// markers, which is what the ESP32 camera firmware emits between boundaries.
struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    fn read_next_jpeg(&mut self) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = jpeg_frame_bounds(&self.buffer) {
                let jpeg = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(jpeg);
            }

            let read = self.reader.read(&mut chunk).context("read mjpeg chunk")?;
            if read == 0 {
                return Err(anyhow!("mjpeg stream ended"));
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            // Runaway buffer without a complete frame: drop the stale prefix,
            // keeping the tail in case a marker straddles the cut.
            if self.buffer.len() > MAX_JPEG_BYTES {
                let drain_len = self.buffer.len() - 2;
                self.buffer.drain(..drain_len);
            }
        }
    }
}

fn fetch_single_jpeg(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch jpeg snapshot from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .context("read jpeg snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty jpeg snapshot"));
    }
    Ok(bytes)
}

fn decode_jpeg(bytes: &[u8]) -> Result<Frame> {
    let decoded = image::load_from_memory(bytes).context("decode jpeg frame")?;
    let (width, height) = decoded.dimensions();
    let rgb = decoded.into_rgb8();
    Ok(Frame::new(rgb.into_raw(), width, height))
}

/// Locate one complete JPEG (SOI 0xFFD8 .. EOI 0xFFD9) in the buffer.
fn jpeg_frame_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer
        .windows(2)
        .position(|pair| pair == [0xFF, 0xD8])?;
    let end = buffer[start + 2..]
        .windows(2)
        .position(|pair| pair == [0xFF, 0xD9])?;
    Some((start, start + 2 + end + 2))
}

fn frame_interval(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

fn health_grace(target_fps: u32) -> Duration {
    let base_ms = if target_fps == 0 {
        2_000
    } else {
        (1000 / target_fps).saturating_mul(6)
    };
    Duration::from_millis(base_ms.max(2_000) as u64)
}
