//! Face detector boundary.
//!
//! The detector is a black box to the rest of the system: it receives one
//! grayscale frame and returns a set of axis-aligned boxes. Backends plug in
//! behind `FaceDetectorBackend` so alternative detection approaches can be
//! swapped without touching the controller.

pub mod backend;
pub mod backends;
pub mod result;

pub use backend::FaceDetectorBackend;
pub use result::BoundingBox;
