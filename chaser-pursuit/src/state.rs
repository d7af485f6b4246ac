//! Pursuit state carried from one cycle to the next

use chaser_core::SearchConfig;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Where the search sweep will go on its next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    UTurn,
    ScanLeft,
    ScanRight,
    /// First forward step, preceded by swinging back to center
    Rewind,
    ScanForward,
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SweepPhase::UTurn => "u-turn",
            SweepPhase::ScanLeft => "scan left",
            SweepPhase::ScanRight => "scan right",
            SweepPhase::Rewind => "rewind",
            SweepPhase::ScanForward => "scan forward",
        };
        f.write_str(name)
    }
}

/// Controller memory; one instance for the life of the process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PursuitState {
    /// Consecutive cycles without a qualifying target
    pub lost_frames: u64,
    /// Consecutive cycles with a qualifying target
    pub found_frames: u64,
    pub searching: bool,
    /// Set while searching
    pub search_start: Option<Instant>,
    pub search_steps_left: u32,
    pub search_steps_right: u32,
    pub search_steps_forward: u32,
    /// Forward search steps since the last U-turn; kept across search episodes
    pub total_forward_steps: u32,
}

impl PursuitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_search(&mut self, now: Instant) {
        self.searching = true;
        self.search_start = Some(now);
        self.reset_sweep();
    }

    pub fn exit_search(&mut self) {
        self.searching = false;
        self.search_start = None;
        self.reset_sweep();
    }

    pub fn reset_sweep(&mut self) {
        self.search_steps_left = 0;
        self.search_steps_right = 0;
        self.search_steps_forward = 0;
    }

    /// Time spent in the current search, zero when not searching
    pub fn search_elapsed(&self, now: Instant) -> Duration {
        match (self.searching, self.search_start) {
            (true, Some(start)) => now.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    /// Phase the next sweep step will execute
    pub fn sweep_phase(&self, search: &SearchConfig) -> SweepPhase {
        if self.total_forward_steps >= search.uturn_after {
            SweepPhase::UTurn
        } else if self.search_steps_left < search.steps_lr {
            SweepPhase::ScanLeft
        } else if self.search_steps_right < search.steps_lr.saturating_mul(2) {
            SweepPhase::ScanRight
        } else if self.search_steps_forward == 0 {
            SweepPhase::Rewind
        } else {
            SweepPhase::ScanForward
        }
    }
}
