//! chaser-eye: frame capture and target detection for the chaser rover
//!
//! Both collaborators sit behind traits so the pursuit loop can be driven by
//! the rover's HTTP snapshot endpoint and a remote detector, or by scripted
//! stand-ins in tests.

pub mod camera;
pub mod classes;
pub mod detector;
pub mod error;

pub use camera::{Frame, FrameSource, HttpSnapshotSource};
pub use detector::{Detector, HttpDetector};
pub use error::{FrameError, VisionError};
