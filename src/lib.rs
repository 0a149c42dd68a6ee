//! facetrack - pan/tilt face tracking
//!
//! This crate keeps a detected face centered in a camera frame by issuing
//! discrete pan/tilt servo commands to a rig over HTTP, while opportunistically
//! saving snapshots of tracked faces.
//!
//! # Architecture
//!
//! One synchronous loop, one iteration per frame:
//!
//! ```text
//! CameraSource -> FaceDetectorBackend -> select_target -> TrackingController
//!                                                      \-> SnapshotThrottler
//! TrackingController -> ActuatorClient (rate-gated, fire-and-forget)
//! ```
//!
//! The core is the tracking controller: stable max-area target selection,
//! fixed-step proportional control with a deadzone and per-axis inversion,
//! saturating angle clamps, and a wall-clock rate gate that decouples servo
//! command rate from frame rate. Everything else is I/O plumbing.
//!
//! # Module Structure
//!
//! - `config`: immutable startup configuration (JSON file + env overrides)
//! - `frame`: decoded RGB frames and their geometry
//! - `ingest`: frame sources (HTTP MJPEG cameras, synthetic `stub://`)
//! - `detect`: face detector boundary (trait + pluggable backends)
//! - `track`: target selection, step control, snapshot throttling
//! - `actuator`: best-effort HTTP command dispatch to the servo rig

pub mod actuator;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod track;

pub use actuator::ActuatorClient;
pub use config::TrackerConfig;
pub use detect::{BoundingBox, FaceDetectorBackend};
pub use frame::{Frame, FrameGeometry};
pub use ingest::{CameraConfig, CameraSource};
pub use track::control::{ActuatorCommand, AxisConfig, ControllerState, TrackingController};
pub use track::select::select_target;
pub use track::snapshot::SnapshotThrottler;
