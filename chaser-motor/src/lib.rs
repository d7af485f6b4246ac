//! chaser-motor: command delivery to the rover
//!
//! Delivery is best-effort. Every send is a single bounded attempt whose
//! outcome is reported as a typed result for the caller to log.

pub mod channel;
pub mod dry_run;
pub mod error;

pub use channel::{CommandChannel, HttpCommandChannel};
pub use dry_run::DryRunChannel;
pub use error::DeliveryError;
