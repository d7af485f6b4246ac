//! Real-time driver: capture, detect, decide, act

use crate::controller::PursuitController;
use crate::error::CycleError;
use crate::plan::{Action, Plan};
use crate::state::PursuitState;
use chaser_core::{ChaserConfig, Command};
use chaser_eye::{Detector, FrameSource};
use chaser_motor::{CommandChannel, DeliveryError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// What a completed cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No frame this cycle; the rover was stopped
    FrameSkipped,
    /// A target was visible and steered toward
    Pursuing,
    /// No target, waiting for the lost limit
    Lost,
    /// No target, sweeping
    Searching,
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub frames_skipped: u64,
    pub cycle_errors: u64,
    pub search_entries: u64,
    pub delivery_failures: u64,
}

/// Owns the collaborators and the pursuit state
pub struct PursuitDriver<F, D, C> {
    source: F,
    detector: D,
    channel: C,
    controller: PursuitController,
    state: PursuitState,
    min_confidence: f32,
    cycle_interval: Duration,
    max_cycles: Option<u64>,
    stats: LoopStats,
}

impl<F, D, C> PursuitDriver<F, D, C>
where
    F: FrameSource,
    D: Detector,
    C: CommandChannel,
{
    pub fn new(config: &ChaserConfig, source: F, detector: D, channel: C) -> Self {
        Self {
            source,
            detector,
            channel,
            controller: PursuitController::new(config),
            state: PursuitState::new(),
            min_confidence: config.detector.min_confidence,
            cycle_interval: config.driver.cycle_interval(),
            max_cycles: config.driver.max_cycles,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> &PursuitState {
        &self.state
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Send and wait through a plan; delivery failures are logged and counted
    pub async fn execute(&mut self, plan: &Plan) {
        for action in plan.actions() {
            match *action {
                Action::Send(command) => {
                    if let Err(e) = self.channel.send(command).await {
                        self.stats.delivery_failures += 1;
                        match e {
                            DeliveryError::Timeout(_) if e.command() != Command::Stop => {
                                debug!("{}", e)
                            }
                            _ => warn!("{}", e),
                        }
                    }
                }
                Action::Wait(duration) => sleep(duration).await,
            }
        }
    }

    /// LED and motor calibration, once before the loop
    pub async fn startup(&mut self) {
        info!("Starting up: LED and calibration");
        let plan = self.controller.startup_plan();
        self.execute(&plan).await;
    }

    pub async fn shutdown(&mut self) {
        let plan = self.controller.shutdown_plan();
        self.execute(&plan).await;
    }

    async fn safety_stop(&mut self) {
        let mut plan = Plan::new();
        plan.send(Command::Stop);
        self.execute(&plan).await;
    }

    /// One capture-detect-decide-act cycle
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let frame = match self.source.get_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping cycle: {}", e);
                self.stats.frames_skipped += 1;
                self.safety_stop().await;
                return Ok(CycleOutcome::FrameSkipped);
            }
        };

        let detections = self.detector.detect(&frame, self.min_confidence).await?;
        for detection in &detections {
            debug!(
                "Detected {} ({:.2}) at [{:.0}, {:.0}, {:.0}, {:.0}]",
                detection.label,
                detection.confidence,
                detection.bbox.x1,
                detection.bbox.y1,
                detection.bbox.x2,
                detection.bbox.y2
            );
        }

        let was_searching = self.state.searching;
        let plan = self
            .controller
            .step(&mut self.state, frame.size(), &detections, Instant::now());
        if !was_searching && self.state.searching {
            self.stats.search_entries += 1;
        }

        self.execute(&plan).await;

        // a long sweep can carry the search past its deadline
        if self.controller.expire_search(&mut self.state, Instant::now()) {
            self.safety_stop().await;
        }

        Ok(if self.state.found_frames > 0 {
            CycleOutcome::Pursuing
        } else if self.state.searching {
            CycleOutcome::Searching
        } else {
            CycleOutcome::Lost
        })
    }

    fn cycles_remaining(&self) -> bool {
        self.max_cycles.map_or(true, |max| self.stats.cycles < max)
    }

    /// Run startup, then cycles until `shutdown` resolves or the cycle limit
    /// is reached. The rover is always stopped before this returns.
    pub async fn run_until<S>(&mut self, shutdown: S) -> LoopStats
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started = tokio::select! {
            _ = &mut shutdown => false,
            _ = self.startup() => true,
        };
        if !started {
            info!("Shutdown requested during startup");
        }

        while started && self.cycles_remaining() {
            let result = tokio::select! {
                _ = &mut shutdown => None,
                result = self.run_cycle() => Some(result),
            };

            let Some(result) = result else {
                info!("Shutdown requested");
                break;
            };

            self.stats.cycles += 1;
            if let Err(e) = result {
                error!("Cycle {} failed: {}", self.stats.cycles, e);
                self.stats.cycle_errors += 1;
                self.safety_stop().await;
            }

            if !self.cycles_remaining() {
                break;
            }

            let interrupted = tokio::select! {
                _ = &mut shutdown => true,
                _ = sleep(self.cycle_interval) => false,
            };
            if interrupted {
                info!("Shutdown requested");
                break;
            }
        }

        self.shutdown().await;

        let stats = self.stats.clone();
        info!(
            "Stopped after {} cycles ({} frames skipped, {} cycle errors, {} search entries, {} delivery failures)",
            stats.cycles,
            stats.frames_skipped,
            stats.cycle_errors,
            stats.search_entries,
            stats.delivery_failures
        );
        stats
    }
}
