//! Opportunistic face snapshots.
//!
//! Independently time-gated from the controller: whenever a target is in
//! frame and the snapshot interval has elapsed, the current frame is written
//! to disk as `face_<unix-seconds>.jpg`. Collisions within the same second
//! overwrite, which is acceptable because the default interval exceeds one
//! second. Write failures are surfaced to the caller for logging and are
//! never fatal.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use image::ExtendedColorType;

use crate::frame::Frame;

pub struct SnapshotThrottler {
    dir: PathBuf,
    interval: Duration,
    last_snapshot: Option<Instant>,
}

impl SnapshotThrottler {
    /// Create the throttler and its output directory.
    pub fn new(dir: &Path, interval: Duration) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create snapshot directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            interval,
            last_snapshot: None,
        })
    }

    /// Save the frame if a target is present and the interval has elapsed.
    ///
    /// Returns the written path, or `None` when throttled or targetless.
    /// The gate timer advances as soon as a write is attempted, so a failed
    /// write is not retried until the next interval.
    pub fn maybe_save(
        &mut self,
        target_present: bool,
        frame: &Frame,
        now: Instant,
    ) -> Result<Option<PathBuf>> {
        if !target_present {
            return Ok(None);
        }
        if let Some(last) = self.last_snapshot {
            if now.duration_since(last) <= self.interval {
                return Ok(None);
            }
        }
        self.last_snapshot = Some(now);

        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock before unix epoch")?
            .as_secs();
        let path = self.dir.join(format!("face_{}.jpg", unix_secs));
        image::save_buffer(
            &path,
            frame.rgb(),
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .with_context(|| format!("write snapshot {}", path.display()))?;
        Ok(Some(path))
    }
}
