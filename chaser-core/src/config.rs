// Configuration for the chaser rover
// Every knob has a default so the binary runs with no config file at all.

use crate::error::Error;
use crate::types::Command;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How to pick one target when several detections qualify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First qualifying detection in detector order
    #[default]
    First,
    /// Last qualifying detection in detector order
    Last,
    /// Highest confidence, ties broken by detector order
    HighestConfidence,
}

/// Rover endpoints and network budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub base_url: String,
    pub capture_path: String,
    pub action_path: String,
    pub capture_timeout_ms: u64,
    pub command_timeout_ms: u64,
    pub led_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            capture_path: "/capture".to_string(),
            action_path: "/action".to_string(),
            capture_timeout_ms: 3000,
            command_timeout_ms: 200,
            led_timeout_ms: 300,
        }
    }
}

impl DeviceConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn led_timeout(&self) -> Duration {
        Duration::from_millis(self.led_timeout_ms)
    }
}

/// Detector endpoint and target qualification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    pub target_labels: Vec<String>,
    /// Detections must score strictly above this
    pub min_confidence: f32,
    pub selection: SelectionPolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/detect".to_string(),
            request_timeout_ms: 2000,
            target_labels: vec!["cup".to_string(), "sports ball".to_string()],
            min_confidence: 0.2,
            selection: SelectionPolicy::First,
        }
    }
}

impl DetectorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Steering toward a visible target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Offsets below this many pixels count as centered
    pub center_deadband_px: f32,
    /// Full-scale turn pulse, also the length of every search pulse
    pub step_time_ms: u64,
    /// Forward pulse after a turn, and the base of the centered forward pulse
    pub forward_step_ms: u64,
    /// Centered forward pulse lasts forward_step * bbox_width / width_scale
    pub width_scale: f32,
    /// Pause after the pre-steering stop
    pub settle_ms: u64,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            center_deadband_px: 30.0,
            step_time_ms: 60,
            forward_step_ms: 100,
            width_scale: 10.0,
            settle_ms: 200,
        }
    }
}

impl PursuitConfig {
    pub fn step_time(&self) -> Duration {
        Duration::from_millis(self.step_time_ms)
    }

    pub fn forward_step(&self) -> Duration {
        Duration::from_millis(self.forward_step_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Sweep pattern used while the target is lost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Consecutive empty frames before searching starts
    pub lost_limit: u64,
    pub timeout_ms: u64,
    /// Left pulses per sweep; the right leg is twice as long
    pub steps_lr: u32,
    pub steps_fw: u32,
    /// Forward steps between U-turns
    pub uturn_after: u32,
    pub uturn_pulses: u32,
    /// Wait after each sweep step so the next frame is fresh
    pub pause_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lost_limit: 5,
            timeout_ms: 10_000,
            steps_lr: 3,
            steps_fw: 5,
            uturn_after: 30,
            uturn_pulses: 8,
            pause_ms: 500,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// One-time sequence sent before the control loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub led_on: bool,
    pub led_delay_ms: u64,
    pub calibration: Vec<Command>,
    pub led_off_on_exit: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            led_on: true,
            led_delay_ms: 500,
            calibration: vec![Command::Minus; 3],
            led_off_on_exit: true,
        }
    }
}

impl StartupConfig {
    pub fn led_delay(&self) -> Duration {
        Duration::from_millis(self.led_delay_ms)
    }
}

/// Outer loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Delay between cycles
    pub cycle_interval_ms: u64,
    /// Stop after this many cycles; run until interrupted when unset
    pub max_cycles: Option<u64>,
    pub log_level: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 200,
            max_cycles: None,
            log_level: "info".to_string(),
        }
    }
}

impl DriverConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

/// Complete chaser configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChaserConfig {
    pub device: DeviceConfig,
    pub detector: DetectorConfig,
    pub pursuit: PursuitConfig,
    pub search: SearchConfig,
    pub startup: StartupConfig,
    pub driver: DriverConfig,
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl ChaserConfig {
    /// Load configuration from a TOML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            serde_json::from_str(&content)
                .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))
        } else {
            Self::from_str(&content)
        }
    }

    /// Load configuration from a TOML string, falling back to JSON
    pub fn from_str(content: &str) -> Result<Self, Error> {
        match toml::from_str::<ChaserConfig>(content) {
            Ok(config) => Ok(config),
            Err(toml_err) => serde_json::from_str::<ChaserConfig>(content)
                .map_err(|_| Error::Parse(toml_err.to_string())),
        }
    }

    /// Apply `CHASER_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), Error> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; keys use the `CHASER_` prefix
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CHASER_DEVICE_URL") {
            self.device.base_url = url;
        }

        if let Some(url) = lookup("CHASER_DETECTOR_URL") {
            self.detector.endpoint = url;
        }

        if let Some(level) = lookup("CHASER_LOG_LEVEL") {
            self.driver.log_level = level;
        }

        if let Some(value) = lookup("CHASER_MIN_CONFIDENCE") {
            self.detector.min_confidence = value.parse().map_err(|_| {
                Error::Configuration(format!("CHASER_MIN_CONFIDENCE is not a number: {}", value))
            })?;
        }

        if let Some(labels) = lookup("CHASER_TARGET_LABELS") {
            self.detector.target_labels = labels
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
        }

        Ok(())
    }

    /// Validate configuration; any failure here is fatal at startup
    pub fn validate(&self) -> Result<(), Error> {
        check_url("device.base_url", &self.device.base_url)?;
        check_url("detector.endpoint", &self.detector.endpoint)?;

        for (name, path) in [
            ("device.capture_path", &self.device.capture_path),
            ("device.action_path", &self.device.action_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::Configuration(format!("{} must start with '/'", name)));
            }
        }

        if self.device.command_timeout_ms == 0 || self.device.capture_timeout_ms == 0 {
            return Err(Error::Configuration("device timeouts must be > 0".to_string()));
        }

        let confidence = self.detector.min_confidence;
        if !confidence.is_finite() || !(0.0..1.0).contains(&confidence) {
            return Err(Error::Configuration(
                "detector.min_confidence must be in [0, 1)".to_string(),
            ));
        }

        if self.detector.target_labels.iter().all(|l| l.trim().is_empty()) {
            return Err(Error::Configuration(
                "detector.target_labels must name at least one label".to_string(),
            ));
        }

        let deadband = self.pursuit.center_deadband_px;
        if !deadband.is_finite() || deadband < 0.0 {
            return Err(Error::Configuration(
                "pursuit.center_deadband_px must be >= 0".to_string(),
            ));
        }

        let scale = self.pursuit.width_scale;
        if !scale.is_finite() || scale < 1.0 {
            return Err(Error::Configuration("pursuit.width_scale must be >= 1".to_string()));
        }

        if self.search.lost_limit == 0 {
            return Err(Error::Configuration("search.lost_limit must be > 0".to_string()));
        }

        if self.search.timeout_ms == 0 {
            return Err(Error::Configuration("search.timeout_ms must be > 0".to_string()));
        }

        if self.search.steps_fw == 0 {
            return Err(Error::Configuration("search.steps_fw must be > 0".to_string()));
        }

        if self.search.uturn_after == 0 {
            return Err(Error::Configuration("search.uturn_after must be > 0".to_string()));
        }

        if self.startup.calibration.iter().any(|c| c.is_motion()) {
            return Err(Error::Configuration(
                "startup.calibration must not contain motion commands".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.driver.log_level.to_ascii_lowercase().as_str()) {
            return Err(Error::Configuration(format!(
                "driver.log_level must be one of {:?}",
                LOG_LEVELS
            )));
        }

        Ok(())
    }
}

fn check_url(name: &str, url: &str) -> Result<(), Error> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| Error::Configuration(format!("{} must use http or https: {}", name, url)))?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(Error::Configuration(format!("{} has no host: {}", name, url)));
    }

    Ok(())
}
