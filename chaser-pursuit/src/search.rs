//! Search sweep executed while the target is lost
//!
//! Each call performs one step: left scan, a wider right scan, a rewind to
//! center, then forward creeping. Every `uturn_after` forward steps the rover
//! spins around instead.

use crate::plan::Plan;
use crate::state::{PursuitState, SweepPhase};
use chaser_core::{Command, SearchConfig};
use std::time::Duration;

/// Run one sweep step, appending its pulses to `plan`
pub fn sweep_step(
    state: &mut PursuitState,
    search: &SearchConfig,
    step_time: Duration,
    plan: &mut Plan,
) -> SweepPhase {
    let phase = state.sweep_phase(search);

    match phase {
        SweepPhase::UTurn => {
            for _ in 0..search.uturn_pulses {
                plan.pulse(Command::Left, step_time);
            }
            state.total_forward_steps = 0;
        }
        SweepPhase::ScanLeft => {
            plan.pulse(Command::Left, step_time);
            state.search_steps_left += 1;
        }
        SweepPhase::ScanRight => {
            plan.pulse(Command::Right, step_time);
            state.search_steps_right += 1;
        }
        SweepPhase::Rewind | SweepPhase::ScanForward => {
            if phase == SweepPhase::Rewind {
                for _ in 0..search.steps_lr {
                    plan.pulse(Command::Left, step_time).wait(step_time);
                }
            }
            plan.pulse(Command::Forward, step_time);
            state.search_steps_forward += 1;
            state.total_forward_steps = state.total_forward_steps.saturating_add(1);

            if state.search_steps_forward >= search.steps_fw {
                state.reset_sweep();
            }
        }
    }

    plan.wait(step_time).send(Command::Stop).wait(search.pause());
    phase
}
