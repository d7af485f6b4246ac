//! Command plans produced by the controller

use chaser_core::Command;
use std::time::Duration;

/// One step of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Send(Command),
    Wait(Duration),
}

/// Ordered commands and waits for the driver to execute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, command: Command) -> &mut Self {
        self.actions.push(Action::Send(command));
        self
    }

    /// Zero-length waits are dropped
    pub fn wait(&mut self, duration: Duration) -> &mut Self {
        if !duration.is_zero() {
            self.actions.push(Action::Wait(duration));
        }
        self
    }

    /// Motion command, hold for `duration`, then stop
    pub fn pulse(&mut self, command: Command, duration: Duration) -> &mut Self {
        self.send(command).wait(duration).send(Command::Stop)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Commands in send order
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.actions.iter().filter_map(|action| match action {
            Action::Send(command) => Some(*command),
            Action::Wait(_) => None,
        })
    }

    /// Motion commands only, in send order
    pub fn motions(&self) -> Vec<Command> {
        self.commands().filter(|c| c.is_motion()).collect()
    }

    /// Sum of all waits
    pub fn total_wait(&self) -> Duration {
        self.actions
            .iter()
            .map(|action| match action {
                Action::Wait(d) => *d,
                Action::Send(_) => Duration::ZERO,
            })
            .sum()
    }

    /// Hold time of every pulse of `command`, in order
    pub fn pulse_durations(&self, command: Command) -> Vec<Duration> {
        self.actions
            .windows(3)
            .filter_map(|w| match w {
                [Action::Send(c), Action::Wait(d), Action::Send(Command::Stop)] if *c == command => {
                    Some(*d)
                }
                _ => None,
            })
            .collect()
    }
}
