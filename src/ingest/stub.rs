//! Synthetic frame source for tests and hardware-free bring-up.
//!
//! `stub://face` renders a bright square "face" on a dark background so the
//! whole loop (detector, selector, controller) can run without a camera. The
//! square's center and size come from query parameters:
//!
//! ```text
//! stub://face?x=240&y=120&size=48
//! stub://blank
//! ```
//!
//! Coordinates default to three quarters across and halfway down the frame,
//! which leaves the controller something to chase.

use std::time::Duration;

use anyhow::{anyhow, Result};
use url::Url;

use super::{CameraConfig, SourceStats};
use crate::frame::Frame;

const BACKGROUND_LUMA: u8 = 20;
const FACE_LUMA: u8 = 235;
const DEFAULT_FACE_SIZE: u32 = 48;

pub(super) struct StubSource {
    config: CameraConfig,
    face: Option<(u32, u32, u32)>,
    frame_count: u64,
}

impl StubSource {
    pub(super) fn new(config: CameraConfig, url: &Url) -> Result<Self> {
        let face = match url.host_str() {
            Some("face") | None => {
                let mut x = config.width * 3 / 4;
                let mut y = config.height / 2;
                let mut size = DEFAULT_FACE_SIZE;
                for (key, value) in url.query_pairs() {
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| anyhow!("stub url parameter {}={} is not a number", key, value))?;
                    match key.as_ref() {
                        "x" => x = parsed,
                        "y" => y = parsed,
                        "size" => size = parsed,
                        other => return Err(anyhow!("unknown stub url parameter '{}'", other)),
                    }
                }
                Some((x, y, size))
            }
            Some("blank") => None,
            Some(other) => {
                return Err(anyhow!(
                    "unknown stub source '{}'; expected 'face' or 'blank'",
                    other
                ))
            }
        };
        Ok(Self {
            config,
            face,
            frame_count: 0,
        })
    }

    pub(super) fn connect(&mut self) -> Result<()> {
        log::info!("camera connected: {} (synthetic)", self.config.url);
        Ok(())
    }

    pub(super) fn next_frame(&mut self) -> Result<Frame> {
        // Pace the loop like a real stream would.
        if self.config.target_fps > 0 {
            std::thread::sleep(Duration::from_millis(
                (1000 / self.config.target_fps).max(1) as u64,
            ));
        }
        self.frame_count += 1;

        let width = self.config.width;
        let height = self.config.height;
        let mut pixels = vec![BACKGROUND_LUMA; (width * height * 3) as usize];

        if let Some((cx, cy, size)) = self.face {
            let half = size / 2;
            let x0 = cx.saturating_sub(half);
            let y0 = cy.saturating_sub(half);
            for y in y0..(y0 + size).min(height) {
                for x in x0..(x0 + size).min(width) {
                    let idx = ((y * width + x) * 3) as usize;
                    pixels[idx..idx + 3].fill(FACE_LUMA);
                }
            }
        }

        Ok(Frame::new(pixels, width, height))
    }

    pub(super) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> StubSource {
        let parsed = Url::parse(url).unwrap();
        let config = CameraConfig {
            url: url.to_string(),
            target_fps: 0,
            width: 320,
            height: 240,
        };
        StubSource::new(config, &parsed).unwrap()
    }

    #[test]
    fn face_square_lands_where_requested() {
        let mut src = source("stub://face?x=100&y=80&size=20");
        let frame = src.next_frame().unwrap();
        let luma = frame.to_luma();
        assert!(luma[80 * 320 + 100] > 200);
        assert!(luma[80 * 320 + 60] < 50);
        assert_eq!(frame.geometry().width, 320);
    }

    #[test]
    fn blank_source_has_no_bright_pixels() {
        let mut src = source("stub://blank");
        let frame = src.next_frame().unwrap();
        assert!(frame.to_luma().iter().all(|&v| v < 50));
    }

    #[test]
    fn frame_counter_increments() {
        let mut src = source("stub://face");
        src.next_frame().unwrap();
        src.next_frame().unwrap();
        assert_eq!(src.stats().frames_captured, 2);
    }

    #[test]
    fn junk_parameters_are_rejected() {
        let parsed = Url::parse("stub://face?size=big").unwrap();
        assert!(StubSource::new(CameraConfig::default(), &parsed).is_err());
    }
}
