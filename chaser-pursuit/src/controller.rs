//! Pursuit controller: one decision per cycle

use crate::plan::Plan;
use crate::search::sweep_step;
use crate::selection::{select_target, TargetCandidate, TargetPolicy};
use crate::state::PursuitState;
use crate::steering::{self, Steering};
use chaser_core::{ChaserConfig, Command, Detection, FrameSize, PursuitConfig, SearchConfig, StartupConfig};
use tokio::time::Instant;
use tracing::{debug, info};

/// Stateless decision logic; the caller owns the `PursuitState`
#[derive(Debug, Clone)]
pub struct PursuitController {
    target: TargetPolicy,
    pursuit: PursuitConfig,
    search: SearchConfig,
    startup: StartupConfig,
}

impl PursuitController {
    pub fn new(config: &ChaserConfig) -> Self {
        Self {
            target: TargetPolicy::from_config(&config.detector),
            pursuit: config.pursuit.clone(),
            search: config.search.clone(),
            startup: config.startup.clone(),
        }
    }

    /// LED on, then the calibration sequence
    pub fn startup_plan(&self) -> Plan {
        let mut plan = Plan::new();
        if self.startup.led_on {
            plan.send(Command::LedOn).wait(self.startup.led_delay());
        }
        for command in &self.startup.calibration {
            plan.send(*command);
        }
        plan
    }

    /// Final stop, then LED off when configured
    pub fn shutdown_plan(&self) -> Plan {
        let mut plan = Plan::new();
        plan.send(Command::Stop);
        if self.startup.led_off_on_exit {
            plan.send(Command::LedOff);
        }
        plan
    }

    /// Decide this cycle's commands and advance `state`
    pub fn step(
        &self,
        state: &mut PursuitState,
        frame: FrameSize,
        detections: &[Detection],
        now: Instant,
    ) -> Plan {
        match select_target(detections, frame, &self.target) {
            Some(target) => self.pursue(state, frame, &target),
            None => self.search(state, now),
        }
    }

    /// Leave search once it has outlived the timeout. Returns true when it
    /// did; the caller owes the rover a `stop`.
    pub fn expire_search(&self, state: &mut PursuitState, now: Instant) -> bool {
        if !state.searching || state.search_elapsed(now) <= self.search.timeout() {
            return false;
        }
        info!("Search timed out after {:?}", self.search.timeout());
        state.exit_search();
        true
    }

    fn pursue(&self, state: &mut PursuitState, frame: FrameSize, target: &TargetCandidate) -> Plan {
        state.lost_frames = 0;
        state.found_frames = state.found_frames.saturating_add(1);
        if state.searching {
            info!("Target found, leaving search mode");
            state.exit_search();
        }

        let bbox = &target.detection.bbox;
        let steering = Steering::compute(bbox, frame, &self.pursuit);
        debug!(
            "Target {} ({:.2}) offset {:.0}px width {:.0}px -> {:?}",
            target.detection.label,
            target.detection.confidence,
            steering::offset(bbox, frame),
            bbox.width(),
            steering
        );

        let mut plan = Plan::new();
        plan.send(Command::Stop).wait(self.pursuit.settle());
        steering.apply(&mut plan, &self.pursuit);
        plan
    }

    fn search(&self, state: &mut PursuitState, now: Instant) -> Plan {
        state.found_frames = 0;
        state.lost_frames = state.lost_frames.saturating_add(1);

        let mut plan = Plan::new();
        plan.send(Command::Stop);

        if !state.searching && state.lost_frames >= self.search.lost_limit {
            info!("Target lost for {} frames, entering search mode", state.lost_frames);
            state.enter_search(now);
        }

        if !state.searching {
            return plan;
        }

        if self.expire_search(state, now) {
            plan.send(Command::Stop);
            return plan;
        }

        let phase = sweep_step(state, &self.search, self.pursuit.step_time(), &mut plan);
        debug!("Search step: {}", phase);
        plan
    }
}
