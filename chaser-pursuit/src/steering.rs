//! Proportional steering toward a visible target

use crate::plan::Plan;
use chaser_core::{BoundingBox, Command, FrameSize, PursuitConfig};
use std::time::Duration;

/// Steering decision for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    /// Target centered: drive forward
    Forward { duration: Duration },
    /// Target off-center: turn toward it, then creep forward
    Turn { command: Command, duration: Duration },
}

/// Signed horizontal distance from frame center to box center; positive is right
pub fn offset(bbox: &BoundingBox, frame: FrameSize) -> f32 {
    bbox.center_x() - frame.center_x()
}

/// Upper bound on any single steering pulse
pub const MAX_PULSE: Duration = Duration::from_secs(60);

fn scaled(base: Duration, factor: f32) -> Duration {
    let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
    Duration::try_from_secs_f64(base.as_secs_f64() * factor as f64)
        .unwrap_or(MAX_PULSE)
        .min(MAX_PULSE)
}

impl Steering {
    pub fn compute(bbox: &BoundingBox, frame: FrameSize, config: &PursuitConfig) -> Self {
        let offset = offset(bbox, frame);

        if offset.abs() < config.center_deadband_px {
            // Wider box means a closer target and a longer push. Size heuristic,
            // not a range estimate.
            return Steering::Forward {
                duration: scaled(config.forward_step(), bbox.width() / config.width_scale),
            };
        }

        let half_width = frame.center_x();
        let ratio = if half_width > 0.0 {
            (offset.abs() / half_width).min(1.0)
        } else {
            0.0
        };
        let command = if offset > 0.0 { Command::Right } else { Command::Left };

        Steering::Turn {
            command,
            duration: scaled(config.step_time(), ratio),
        }
    }

    pub fn is_turn(&self) -> bool {
        matches!(self, Steering::Turn { .. })
    }

    /// Append the pulses for this decision
    pub fn apply(&self, plan: &mut Plan, config: &PursuitConfig) {
        match *self {
            Steering::Forward { duration } => {
                plan.pulse(Command::Forward, duration);
            }
            Steering::Turn { command, duration } => {
                plan.pulse(command, duration)
                    .pulse(Command::Forward, config.forward_step())
                    .send(Command::Stop);
            }
        }
    }
}
