//! Errors raised inside one control cycle

use chaser_eye::VisionError;
use thiserror::Error;

/// Anything that aborts a cycle; the driver logs it and stops the rover
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Detection failed: {0}")]
    Detection(#[from] VisionError),
}
