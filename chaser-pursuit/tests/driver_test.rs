// Driver loop against scripted collaborators and a paused clock

use async_trait::async_trait;
use bytes::Bytes;
use chaser_core::{BoundingBox, ChaserConfig, Command, Detection, FrameSize};
use chaser_eye::{Detector, Frame, FrameError, FrameSource, VisionError};
use chaser_motor::{CommandChannel, DeliveryError, DryRunChannel};
use chaser_pursuit::{CycleOutcome, PursuitDriver};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

struct ScriptedSource {
    frames: Mutex<VecDeque<Result<(), FrameError>>>,
}

impl ScriptedSource {
    fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    fn new(script: Vec<Result<(), FrameError>>) -> Self {
        Self {
            frames: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn get_frame(&self) -> Result<Frame, FrameError> {
        let next = self.frames.lock().unwrap().pop_front().unwrap_or(Ok(()));
        next.map(|_| Frame::from_parts(Bytes::from_static(b"jpeg"), FrameSize::new(640, 480)))
    }
}

struct ScriptedDetector {
    results: Mutex<VecDeque<Result<Vec<Detection>, VisionError>>>,
}

impl ScriptedDetector {
    fn new(script: Vec<Result<Vec<Detection>, VisionError>>) -> Self {
        Self {
            results: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(&self, _frame: &Frame, _min_confidence: f32) -> Result<Vec<Detection>, VisionError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Rejects every command
struct BrokenChannel;

#[async_trait]
impl CommandChannel for BrokenChannel {
    async fn send(&self, command: Command) -> Result<(), DeliveryError> {
        Err(DeliveryError::Status {
            command,
            status: 500,
        })
    }
}

fn centered_cup() -> Vec<Detection> {
    vec![Detection::new("cup", 0.9, BoundingBox::new(290.0, 100.0, 350.0, 200.0))]
}

fn config(max_cycles: u64) -> ChaserConfig {
    let mut config = ChaserConfig::default();
    config.driver.max_cycles = Some(max_cycles);
    config
}

#[tokio::test(start_paused = true)]
async fn test_startup_sends_led_then_calibration() {
    let channel = DryRunChannel::new();
    let mut driver = PursuitDriver::new(
        &config(1),
        ScriptedSource::always_ok(),
        ScriptedDetector::new(Vec::new()),
        channel.clone(),
    );
    driver.startup().await;
    assert_eq!(
        channel.history(),
        vec![Command::LedOn, Command::Minus, Command::Minus, Command::Minus]
    );
}

#[tokio::test(start_paused = true)]
async fn test_pursuing_cycle() {
    let channel = DryRunChannel::new();
    let mut driver = PursuitDriver::new(
        &config(1),
        ScriptedSource::always_ok(),
        ScriptedDetector::new(vec![Ok(centered_cup())]),
        channel.clone(),
    );

    let outcome = driver.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Pursuing);
    assert_eq!(channel.history(), vec![Command::Stop, Command::Forward, Command::Stop]);
    assert_eq!(driver.state().found_frames, 1);
}

#[tokio::test(start_paused = true)]
async fn test_frame_failure_skips_cycle_with_stop() {
    let channel = DryRunChannel::new();
    let mut driver = PursuitDriver::new(
        &config(1),
        ScriptedSource::new(vec![Err(FrameError::Timeout)]),
        ScriptedDetector::new(vec![Ok(centered_cup())]),
        channel.clone(),
    );

    let outcome = driver.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FrameSkipped);
    assert_eq!(channel.history(), vec![Command::Stop]);
    assert_eq!(driver.stats().frames_skipped, 1);
    // a skipped cycle is neither a sighting nor a loss
    assert_eq!(driver.state().lost_frames, 0);
    assert_eq!(driver.state().found_frames, 0);
}

#[tokio::test(start_paused = true)]
async fn test_detector_error_stops_and_loop_continues() {
    let channel = DryRunChannel::new();
    let mut driver = PursuitDriver::new(
        &config(2),
        ScriptedSource::always_ok(),
        ScriptedDetector::new(vec![
            Err(VisionError::Model("detector unavailable".to_string())),
            Ok(centered_cup()),
        ]),
        channel.clone(),
    );

    let stats = driver.run_until(std::future::pending::<()>()).await;
    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.cycle_errors, 1);
    assert_eq!(driver.state().found_frames, 1);

    let history = channel.history();
    // startup (4), safety stop, pursuit cycle (3), shutdown (2)
    assert_eq!(history.len(), 10);
    assert_eq!(history[4], Command::Stop);
    assert_eq!(&history[5..8], &[Command::Stop, Command::Forward, Command::Stop]);
    assert_eq!(&history[8..], &[Command::Stop, Command::LedOff]);
}

#[tokio::test(start_paused = true)]
async fn test_search_entry_counted() {
    let channel = DryRunChannel::new();
    let mut driver = PursuitDriver::new(
        &config(6),
        ScriptedSource::always_ok(),
        ScriptedDetector::new(Vec::new()),
        channel.clone(),
    );

    let stats = driver.run_until(std::future::pending::<()>()).await;
    assert_eq!(stats.cycles, 6);
    assert_eq!(stats.search_entries, 1);
    assert!(driver.state().searching);
    assert!(channel.history().contains(&Command::Left));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_ends_with_stop() {
    let channel = DryRunChannel::new();
    let mut config = ChaserConfig::default();
    config.driver.max_cycles = None;
    let mut driver = PursuitDriver::new(
        &config,
        ScriptedSource::always_ok(),
        ScriptedDetector::new(Vec::new()),
        channel.clone(),
    );

    let stats = driver
        .run_until(tokio::time::sleep(Duration::from_secs(3)))
        .await;
    assert!(stats.cycles > 0);

    let history = channel.history();
    assert_eq!(&history[history.len() - 2..], &[Command::Stop, Command::LedOff]);
}

#[tokio::test(start_paused = true)]
async fn test_delivery_failures_do_not_fail_cycles() {
    let mut driver = PursuitDriver::new(
        &config(3),
        ScriptedSource::always_ok(),
        ScriptedDetector::new(vec![Ok(centered_cup())]),
        BrokenChannel,
    );

    let stats = driver.run_until(std::future::pending::<()>()).await;
    assert_eq!(stats.cycles, 3);
    assert_eq!(stats.cycle_errors, 0);
    assert!(stats.delivery_failures > 0);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_stop_is_harmless() {
    let channel = DryRunChannel::new();
    let mut driver = PursuitDriver::new(
        &config(1),
        ScriptedSource::always_ok(),
        ScriptedDetector::new(Vec::new()),
        channel.clone(),
    );

    driver.shutdown().await;
    let state = driver.state().clone();
    driver.shutdown().await;
    assert_eq!(driver.state(), &state);
    assert_eq!(driver.stats().delivery_failures, 0);
    assert_eq!(
        channel.history(),
        vec![Command::Stop, Command::LedOff, Command::Stop, Command::LedOff]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_startup_still_stops() {
    let channel = DryRunChannel::new();
    let mut config = ChaserConfig::default();
    config.driver.max_cycles = None;
    let mut driver = PursuitDriver::new(
        &config,
        ScriptedSource::always_ok(),
        ScriptedDetector::new(Vec::new()),
        channel.clone(),
    );

    // fires inside the 500ms LED delay
    let stats = driver
        .run_until(tokio::time::sleep(Duration::from_millis(100)))
        .await;
    assert_eq!(stats.cycles, 0);
    assert_eq!(
        channel.history(),
        vec![Command::LedOn, Command::Stop, Command::LedOff]
    );
}

#[tokio::test(start_paused = true)]
async fn test_search_expires_after_long_sweep() {
    let channel = DryRunChannel::new();
    let mut config = config(5);
    // the entry sweep step alone takes 60ms + 60ms + 500ms
    config.search.timeout_ms = 600;
    let mut driver = PursuitDriver::new(
        &config,
        ScriptedSource::always_ok(),
        ScriptedDetector::new(Vec::new()),
        channel.clone(),
    );

    let stats = driver.run_until(std::future::pending::<()>()).await;
    assert_eq!(stats.search_entries, 1);
    assert!(!driver.state().searching);
    assert!(driver.state().search_start.is_none());

    let history = channel.history();
    let left = history.iter().position(|c| *c == Command::Left).unwrap();
    // pulse stop, sweep stop, then the stop for the expired search
    assert_eq!(&history[left + 1..left + 4], &[Command::Stop, Command::Stop, Command::Stop]);
}
