//! Detector backend implementations.

pub mod luma;
pub mod stub;
#[cfg(feature = "backend-tract")]
pub mod tract;

pub use luma::LumaBlobBackend;
pub use stub::StubFaceBackend;
#[cfg(feature = "backend-tract")]
pub use tract::TractFaceBackend;
