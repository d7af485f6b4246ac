//! chaser-pursuit: the pursuit and search control loop
//!
//! `PursuitController::step` turns one frame's detections into a `Plan` of
//! commands and waits while updating `PursuitState`; it never sleeps or does
//! I/O. `PursuitDriver` owns the collaborators and executes plans in real
//! time, one cycle after another.

pub mod controller;
pub mod driver;
pub mod error;
pub mod plan;
pub mod search;
pub mod selection;
pub mod state;
pub mod steering;

pub use controller::PursuitController;
pub use driver::{CycleOutcome, LoopStats, PursuitDriver};
pub use error::CycleError;
pub use plan::{Action, Plan};
pub use selection::{select_target, TargetCandidate, TargetPolicy};
pub use state::{PursuitState, SweepPhase};
pub use steering::Steering;
