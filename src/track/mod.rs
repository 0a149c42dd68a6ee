//! Tracking core: target selection, step control, snapshot throttling.
//!
//! This is the only part of the system with control and timing logic. All
//! three components are pure state machines driven by the daemon loop; none
//! of them perform I/O except `SnapshotThrottler`, which writes image files.

pub mod control;
pub mod select;
pub mod snapshot;
